#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::{Command, Output};

use panelcfg::frame::{
    build_command, CLOCK_CONFIG, ENCODER_CONFIG, FRAME_SIZE, GET_CLOCK_CONFIG, PUSH_CLOCK_CONFIG,
};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/panelcfg-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn panelcfg(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_panelcfg"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .env_remove("PANELCFG_DEVICE")
        .env_remove("PANELCFG_LOG")
        .output()
        .expect("panelcfg should run")
}

fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .chunks(16)
        .map(|row| {
            row.iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn clock_reply() -> Vec<u8> {
    let payload: Vec<u8> = [25_000_000i32, 25, 192, 5, 1]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    build_command(CLOCK_CONFIG, &payload)
        .expect("reply should encode")
        .to_vec()
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line should be json"))
        .collect()
}

#[test]
fn encode_get_clock_as_json() {
    let output = panelcfg(&["--format", "json", "encode", "get-clock"]);
    assert!(output.status.success());

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["command"], "GET_CLOCK_CONFIG");
    assert_eq!(lines[0]["tag"], GET_CLOCK_CONFIG);
    assert_eq!(lines[0]["length"], 0);
    assert_eq!(lines[0]["checksum"], GET_CLOCK_CONFIG);
    let hex = lines[0]["hex"].as_str().expect("hex should be a string");
    assert_eq!(hex.len(), FRAME_SIZE * 2);
    assert!(hex.starts_with("c500"));
}

#[test]
fn encode_push_clock_raw_is_one_frame() {
    let output = panelcfg(&[
        "--format", "raw", "encode", "push-clock", "--n", "192", "--r", "5", "--divr", "1",
    ]);
    assert!(output.status.success());
    assert_eq!(output.stdout.len(), FRAME_SIZE);
    assert_eq!(output.stdout[0], PUSH_CLOCK_CONFIG);
    assert_eq!(output.stdout[1], 12);
    assert_eq!(&output.stdout[2..6], &192i32.to_le_bytes());
}

#[test]
fn encode_splits_large_register_reads() {
    let addresses: Vec<String> = (0..40).map(|a| format!("{a:#04x}")).collect();
    let mut args = vec!["--format", "json", "encode", "get-encoder"];
    args.extend(addresses.iter().map(String::as_str));

    let output = panelcfg(&args);
    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["length"], 30);
    assert_eq!(lines[1]["length"], 10);
}

#[test]
fn decode_hex_capture() {
    let dir = unique_temp_dir("decode");
    let path = dir.join("capture.txt");
    let mut wire = build_command(ENCODER_CONFIG, &[0x80, 0x10, 0x8C, 0x21])
        .expect("frame should encode")
        .to_vec();
    wire.extend_from_slice(&clock_reply());
    std::fs::write(&path, hex_dump(&wire)).expect("capture should be writable");
    let path_arg = path.to_string_lossy().to_string();

    let output = panelcfg(&["--format", "json", "decode", &path_arg]);
    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["message"], "ENCODER_CONFIG");
    assert_eq!(lines[0]["data"]["registers"]["128"], 0x10);
    assert_eq!(lines[1]["data"]["type"], "clock_config");
    assert_eq!(lines[1]["data"]["pll_sai_n"], 192);

    let whole = panelcfg(&["--format", "pretty", "decode", &path_arg]);
    let single_bytes = panelcfg(&["--format", "pretty", "decode", &path_arg, "--chunk", "1"]);
    assert!(single_bytes.status.success());
    assert_eq!(whole.stdout, single_bytes.stdout);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_reports_corrupt_frames() {
    let dir = unique_temp_dir("decode-corrupt");
    let path = dir.join("capture.bin");
    let mut wire = clock_reply();
    wire[10] ^= 0x04;
    wire.extend_from_slice(&clock_reply());
    std::fs::write(&path, &wire).expect("capture should be writable");

    let output = panelcfg(&[
        "--format",
        "json",
        "decode",
        "--binary",
        &path.to_string_lossy(),
    ]);
    assert_eq!(output.status.code(), Some(60));
    assert_eq!(json_lines(&output).len(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn regs_export_lists_every_register() {
    let output = panelcfg(&["regs", "--export-c"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.first(), Some(&"/* Auto-generated configuration */"));
    assert_eq!(lines.last(), Some(&"/* Auto-generated configuration */"));
    assert!(stdout.contains("ADV7393_writeReg(0x8c, 0x21);"));
    assert!(stdout.contains("ADV7393_writeReg(0x00, 0x12);"));
}

#[test]
fn regs_applies_snapshot_capture() {
    let dir = unique_temp_dir("regs");
    let path = dir.join("snapshot.txt");
    let wire = build_command(ENCODER_CONFIG, &[0x80, 0x50, 0x00, 0x12]).expect("frame");
    std::fs::write(&path, hex_dump(&wire)).expect("capture should be writable");

    let output = panelcfg(&[
        "--format",
        "json",
        "regs",
        "--snapshot",
        &path.to_string_lossy(),
    ]);
    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("regs should emit json");
    assert_eq!(report["changed"], serde_json::json!([0x80]));
    let register = report["registers"]
        .as_array()
        .expect("registers array")
        .iter()
        .find(|row| row["address"] == 0x80)
        .expect("0x80 listed")
        .clone();
    assert_eq!(register["value"], 0x50);
    assert_eq!(register["modified"], true);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn regs_snapshot_without_encoder_frame_is_invalid() {
    let dir = unique_temp_dir("regs-empty");
    let path = dir.join("snapshot.bin");
    std::fs::write(&path, clock_reply()).expect("capture should be writable");

    let output = panelcfg(&["regs", "--snapshot", &path.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(60));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn clock_computes_lcd_frequency() {
    let output = panelcfg(&[
        "--format", "json", "clock", "--osc-hz", "25000000", "--pll-m", "25", "--n", "192",
        "--r", "5", "--divr", "1",
    ]);
    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("clock should emit json");
    let mhz = report["lcd_clock_mhz"].as_f64().expect("lcd clock");
    assert!((mhz - 9.6).abs() < 1e-9);
    assert_eq!(report["divr_divisor"], 4);
}

#[test]
fn clock_rejects_bad_divr() {
    let output = panelcfg(&[
        "clock", "--osc-hz", "25000000", "--pll-m", "25", "--n", "192", "--r", "5", "--divr",
        "9",
    ]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn timing_accumulates_and_reports_frame_rate() {
    let output = panelcfg(&[
        "--format",
        "json",
        "timing",
        "--hsync",
        "1",
        "--hbp",
        "46",
        "--width",
        "800",
        "--hfp",
        "210",
        "--vsync",
        "1",
        "--vbp",
        "23",
        "--height",
        "480",
        "--vfp",
        "22",
        "--pixel-clock-mhz",
        "33.3",
    ]);
    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("timing should emit json");
    assert_eq!(report["registers"]["total_width"], 1056);
    assert_eq!(report["registers"]["total_height"], 525);
    let rate = report["frame_rate_hz"].as_f64().expect("frame rate");
    assert!((rate - 33.3e6 / (1057.0 * 526.0)).abs() < 1e-6);
}

#[test]
fn send_writes_command_and_reads_reply() {
    let dir = unique_temp_dir("send");
    let path = dir.join("device.bin");
    // The command overwrites the first frame slot; the reply follows it.
    let mut contents = vec![0u8; FRAME_SIZE];
    contents.extend_from_slice(&clock_reply());
    std::fs::write(&path, &contents).expect("device file should be writable");

    let output = panelcfg(&[
        "--format",
        "json",
        "send",
        "get-clock",
        "--device",
        &path.to_string_lossy(),
        "--wait",
        "--timeout",
        "5s",
    ]);
    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["data"]["type"], "clock_config");

    let written = std::fs::read(&path).expect("device file should be readable");
    let expected = build_command(GET_CLOCK_CONFIG, &[]).expect("frame");
    assert_eq!(&written[..FRAME_SIZE], &expected[..]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_without_reply_fails() {
    let dir = unique_temp_dir("send-silent");
    let path = dir.join("device.bin");
    std::fs::write(&path, []).expect("device file should be writable");

    let output = panelcfg(&[
        "send",
        "next-screen",
        "--device",
        &path.to_string_lossy(),
        "--wait",
        "--timeout",
        "2s",
    ]);
    assert_eq!(output.status.code(), Some(1));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_requires_device() {
    let output = panelcfg(&["send", "next-screen"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn send_to_missing_device_is_transport_error() {
    let output = panelcfg(&["send", "next-screen", "--device", "/nonexistent/panelcfg/tty"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn monitor_stops_after_count() {
    let dir = unique_temp_dir("monitor");
    let path = dir.join("device.bin");
    let mut contents = clock_reply();
    contents.extend_from_slice(&clock_reply());
    std::fs::write(&path, &contents).expect("device file should be writable");

    let output = panelcfg(&[
        "--format",
        "json",
        "monitor",
        "--device",
        &path.to_string_lossy(),
        "--count",
        "1",
    ]);
    assert!(output.status.success());
    assert_eq!(json_lines(&output).len(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn selftest_passes() {
    let output = panelcfg(&["--format", "json", "selftest"]);
    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("selftest should emit json");
    assert_eq!(report["passed"], true);
}

#[test]
fn version_prints_package_version() {
    let output = panelcfg(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("panelcfg {}", env!("CARGO_PKG_VERSION"))
    );
}
