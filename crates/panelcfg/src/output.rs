use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use panelcfg_device::Message;
use panelcfg_frame::{CHECKSUM_OFFSET, FRAME_SIZE};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A command frame ready for the wire.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub name: &'static str,
    pub wire: [u8; FRAME_SIZE],
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    command: &'a str,
    tag: u8,
    length: u8,
    checksum: u8,
    hex: String,
}

pub fn print_frames(frames: &[EncodedFrame], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for frame in frames {
                let out = FrameOutput {
                    command: frame.name,
                    tag: frame.wire[0],
                    length: frame.wire[1],
                    checksum: frame.wire[CHECKSUM_OFFSET],
                    hex: hex_string(&frame.wire, ""),
                };
                print_json(&out);
            }
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["COMMAND", "TAG", "LEN", "CHECKSUM", "FRAME"]);
            for frame in frames {
                table.add_row(vec![
                    frame.name.to_string(),
                    format!("0x{:02X}", frame.wire[0]),
                    frame.wire[1].to_string(),
                    format!("0x{:02X}", frame.wire[CHECKSUM_OFFSET]),
                    hex_string(&frame.wire, " "),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for frame in frames {
                println!(
                    "{} tag=0x{:02X} len={} checksum=0x{:02X}",
                    frame.name,
                    frame.wire[0],
                    frame.wire[1],
                    frame.wire[CHECKSUM_OFFSET]
                );
                for row in frame.wire.chunks(16) {
                    println!("  {}", hex_string(row, " "));
                }
            }
        }
        OutputFormat::Raw => {
            let wire: Vec<u8> = frames.iter().flat_map(|frame| frame.wire).collect();
            print_raw(&wire);
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    message: &'a str,
    tag: u8,
    timestamp: String,
    data: &'a Message,
}

pub fn print_message(message: &Message, timestamp: SystemTime, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                message: message.name(),
                tag: message.tag(),
                timestamp: unix_seconds(timestamp),
                data: message,
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["MESSAGE", "TAG", "DETAIL"]);
            table.add_row(vec![
                message.name().to_string(),
                format!("0x{:02X}", message.tag()),
                describe(message),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} (0x{:02X}) {}",
                message.name(),
                message.tag(),
                describe(message)
            );
        }
        OutputFormat::Raw => println!("{}", describe(message)),
    }
}

/// Print a computed report: the serialized struct for JSON, `rows` otherwise.
pub fn print_report<T: Serialize>(report: &T, rows: &[(&str, String)], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            for (field, value) in rows {
                table.add_row(vec![field.to_string(), value.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (field, value) in rows {
                println!("{field}: {value}");
            }
        }
        OutputFormat::Raw => {
            for (_, value) in rows {
                println!("{value}");
            }
        }
    }
}

/// Print a listing with a header row; JSON output serializes `report`.
pub fn print_listing<T: Serialize>(
    report: &T,
    header: Vec<&str>,
    rows: Vec<Vec<String>>,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut table = new_table(header);
            for row in rows {
                table.add_row(row);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in rows {
                println!("{}", row.join("  "));
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// One-line human summary of a message.
pub fn describe(message: &Message) -> String {
    match message {
        Message::TimingConfig(config) => {
            let display = config.to_display_timing();
            format!(
                "{}x{} hsync={} hbp={} hfp={} vsync={} vbp={} vfp={} total={}x{}",
                config.image_width,
                config.image_height,
                display.h_sync_width,
                display.h_back_porch,
                display.h_front_porch,
                display.v_sync_height,
                display.v_back_porch,
                display.v_front_porch,
                config.total_width,
                config.total_height
            )
        }
        Message::ClockConfig(config) => {
            let mut text = format!(
                "N={} R={} DIVR={}",
                config.pll_sai_n, config.pll_sai_r, config.pll_sai_div_r
            );
            if let Some(source) = config.source {
                text.push_str(&format!(" osc={} M={}", source.osc_source_hz, source.pll_m));
            }
            if let Some(mhz) = config.lcd_clock_mhz() {
                text.push_str(&format!(" lcd={mhz:.3}MHz"));
            }
            text
        }
        Message::EncoderConfig(snapshot) => snapshot
            .registers
            .iter()
            .map(|(address, value)| format!("0x{address:02X}=0x{value:02X}"))
            .collect::<Vec<_>>()
            .join(" "),
        Message::EncoderChangeSet(changes) => changes
            .addresses
            .iter()
            .map(|address| format!("0x{address:02X}"))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

pub fn hex_string(bytes: &[u8], separator: &str) -> String {
    if separator.is_empty() {
        return hex::encode(bytes);
    }
    bytes
        .iter()
        .map(|byte| hex::encode([*byte]))
        .collect::<Vec<_>>()
        .join(separator)
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn unix_seconds(timestamp: SystemTime) -> String {
    timestamp
        .duration_since(UNIX_EPOCH)
        .map(|d| format!("{}.{:03}", d.as_secs(), d.subsec_millis()))
        .unwrap_or_else(|_| "0".to_string())
}
