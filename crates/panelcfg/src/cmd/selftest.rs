//! Exercise the whole stack without hardware.
//!
//! Commands go out through a [`Device`] into a loopback link and are read
//! back as frames; canned device replies are injected in odd-sized chunks and
//! must come out of the interpreter unchanged.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use panelcfg_device::{
    interpret, ClockConfig, ClockSettings, Command, Device, DeviceError, DisplayTiming,
    EncoderChangeSet, EncoderSnapshot, Message, PllSource,
};
use panelcfg_frame::{build_command, FrameError, FrameReader};
use panelcfg_transport::{loopback, LoopbackSink, LoopbackSource};
use serde::Serialize;
use tracing::debug;

use crate::cmd::SelftestArgs;
use crate::exit::{device_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_listing, OutputFormat};

const REPLY_CHUNK: usize = 7;

#[derive(Debug, Serialize)]
struct Check {
    name: String,
    passed: bool,
    detail: String,
}

impl Check {
    fn new(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SelftestReport {
    passed: bool,
    checks: Vec<Check>,
}

pub fn run(_args: SelftestArgs, format: OutputFormat) -> CliResult<i32> {
    let (sink, source) = loopback();
    let mut device = Device::new(sink.clone());

    let mut checks = Vec::new();
    let source = check_commands(&mut device, source, &mut checks)?;
    check_replies(&mut device, &sink, source, &mut checks)?;

    let passed = checks.iter().all(|check| check.passed);
    let rows = checks
        .iter()
        .map(|check| {
            vec![
                check.name.clone(),
                if check.passed { "ok" } else { "FAIL" }.to_string(),
                check.detail.clone(),
            ]
        })
        .collect();
    let report = SelftestReport { passed, checks };
    print_listing(&report, vec!["CHECK", "RESULT", "DETAIL"], rows, format);

    Ok(if passed { SUCCESS } else { FAILURE })
}

fn sample_timing() -> DisplayTiming {
    DisplayTiming {
        h_sync_width: 1,
        h_back_porch: 46,
        active_width: 800,
        h_front_porch: 210,
        v_sync_height: 1,
        v_back_porch: 23,
        active_height: 480,
        v_front_porch: 22,
    }
}

fn sample_commands() -> Vec<Command> {
    vec![
        Command::NextScreen,
        Command::PrevScreen,
        Command::GetTimingConfig,
        Command::PushTimingConfig(sample_timing().to_config()),
        Command::GetClockConfig,
        Command::PushClockConfig(ClockSettings {
            pll_sai_n: 192,
            pll_sai_r: 5,
            pll_sai_div_r: 1,
        }),
        Command::GetEncoderConfig(vec![0x00, 0x01, 0x02, 0x80, 0x8C, 0x8D, 0x8E, 0x8F]),
        Command::PushEncoderConfig(vec![(0x80, 0x10), (0x8C, 0x1F)]),
    ]
}

fn sample_replies() -> Vec<Message> {
    vec![
        Message::TimingConfig(sample_timing().to_config()),
        Message::ClockConfig(ClockConfig {
            source: Some(PllSource {
                osc_source_hz: 25_000_000,
                pll_m: 25,
            }),
            pll_sai_n: 192,
            pll_sai_r: 5,
            pll_sai_div_r: 1,
        }),
        Message::EncoderConfig(EncoderSnapshot {
            registers: BTreeMap::from([(0x80, 0x10), (0x8C, 0x21)]),
        }),
        Message::EncoderChangeSet(EncoderChangeSet {
            addresses: BTreeSet::from([0x8C]),
        }),
    ]
}

/// Device-side wire encoding of a reply.
fn reply_payload(message: &Message) -> Vec<u8> {
    fn words(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|value| value.to_le_bytes()).collect()
    }

    match message {
        Message::TimingConfig(config) => config.to_payload().to_vec(),
        Message::ClockConfig(config) => {
            let (osc, m) = config
                .source
                .map(|source| (source.osc_source_hz, source.pll_m))
                .unwrap_or_default();
            words(&[
                osc,
                m,
                config.pll_sai_n,
                config.pll_sai_r,
                config.pll_sai_div_r,
            ])
        }
        Message::EncoderConfig(snapshot) => snapshot
            .registers
            .iter()
            .flat_map(|(address, value)| [*address, *value])
            .collect(),
        Message::EncoderChangeSet(changes) => changes
            .addresses
            .iter()
            .flat_map(|address| [*address, 0])
            .collect(),
    }
}

/// Send every command and read it back off the link.
fn check_commands(
    device: &mut Device<LoopbackSink>,
    source: LoopbackSource,
    checks: &mut Vec<Check>,
) -> CliResult<LoopbackSource> {
    let commands = sample_commands();
    device
        .send_all(&commands)
        .map_err(|err| device_error("selftest send failed", err))?;

    let mut reader = FrameReader::new(source);
    for command in &commands {
        let check = match reader.read_frame() {
            Ok(frame) => {
                let same = frame.tag == command.tag()
                    && frame.payload.as_ref() == command.payload().as_slice();
                // Command tags must never be taken for replies.
                let rejected = matches!(
                    interpret(&frame),
                    Err(DeviceError::UnknownMessageType(_))
                );
                Check::new(
                    command.name(),
                    same && rejected,
                    format!("{} payload bytes", frame.payload.len()),
                )
            }
            Err(err) => Check::new(command.name(), false, err.to_string()),
        };
        checks.push(check);
    }

    let drained = matches!(reader.read_frame(), Err(FrameError::ConnectionClosed));
    checks.push(Check::new(
        "link drained",
        drained,
        format!("{} frames sent", device.stats().commands_sent),
    ));
    Ok(reader.into_inner())
}

/// Inject canned replies in odd-sized chunks plus one corrupt frame.
fn check_replies(
    device: &mut Device<LoopbackSink>,
    sink: &LoopbackSink,
    mut source: LoopbackSource,
    checks: &mut Vec<Check>,
) -> CliResult<()> {
    let expected = sample_replies();
    let mut wire = Vec::new();
    for message in &expected {
        let frame = build_command(message.tag(), &reply_payload(message))
            .map_err(|err| device_error("selftest encode failed", err.into()))?;
        wire.extend_from_slice(&frame);
    }
    let mut corrupt = build_command(expected[0].tag(), &[])
        .map_err(|err| device_error("selftest encode failed", err.into()))?;
    corrupt[1] ^= 0x01;
    wire.extend_from_slice(&corrupt);

    for chunk in wire.chunks(REPLY_CHUNK) {
        sink.inject(chunk.to_vec());
    }

    let received = Arc::new(Mutex::new(Vec::new()));
    let collected = Arc::clone(&received);
    let id = device.subscribe(move |message, _| {
        collected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());
    });
    let before = device.stats();
    let errors = device
        .run(&mut source)
        .map_err(|err| device_error("selftest receive failed", err))?;
    device.unsubscribe(id);
    let after = device.stats();

    let received = received
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();
    for (index, message) in expected.iter().enumerate() {
        let got = received.get(index);
        let passed = got == Some(message);
        debug!(message = message.name(), passed, "reply checked");
        checks.push(Check::new(
            format!("reply {}", message.name()),
            passed,
            format!("{} bytes in {REPLY_CHUNK}-byte chunks", reply_payload(message).len()),
        ));
    }

    let discarded = after.frames_discarded - before.frames_discarded;
    checks.push(Check::new(
        "corrupt frame dropped",
        discarded == 1 && errors.is_empty() && received.len() == expected.len(),
        format!("{discarded} discarded, {} interpreter errors", errors.len()),
    ));
    Ok(())
}
