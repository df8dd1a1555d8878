use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use panelcfg_device::{Device, Message};
use panelcfg_transport::{ByteSink, ByteSource, Chunk, DeviceFile, TransportError};
use tracing::{debug, info, warn};

use crate::cmd::SendArgs;
use crate::exit::{
    device_error, transport_error, CliError, CliResult, FAILURE, SUCCESS, TIMEOUT, USAGE,
};
use crate::output::{print_message, OutputFormat};

type ChunkResult = Result<Chunk, TransportError>;

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let path = args.device.ok_or_else(|| {
        CliError::new(USAGE, "--device is required (or set PANELCFG_DEVICE)")
    })?;

    let (sink, source) = DeviceFile::open(&path)
        .and_then(DeviceFile::split)
        .map_err(|err| transport_error("open failed", err))?;
    let mut device = Device::new(sink);

    let commands = args.command.to_commands();
    device
        .send_all(&commands)
        .map_err(|err| device_error("send failed", err))?;
    info!(commands = commands.len(), path = %path.display(), "commands sent");

    if !args.wait {
        return Ok(SUCCESS);
    }

    // Start reading only after the writes so a capture file's cursor sits
    // past what was just written.
    let chunks = spawn_reader(source);
    let (message, timestamp) = wait_for_reply(&mut device, &chunks, timeout)?;
    print_message(&message, timestamp, format);
    Ok(SUCCESS)
}

/// Move a blocking source onto its own thread and hand chunks back over a
/// channel, so the caller can wait with a deadline.
fn spawn_reader<B>(mut source: B) -> Receiver<ChunkResult>
where
    B: ByteSource + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || loop {
        match source.next_chunk() {
            Ok(Some(chunk)) => {
                if tx.send(Ok(chunk)).is_err() {
                    break;
                }
            }
            Ok(None) => {
                debug!("device stream ended");
                break;
            }
            Err(err) => {
                let _ = tx.send(Err(err));
                break;
            }
        }
    });
    rx
}

/// First valid message to arrive before `timeout`.
fn wait_for_reply<S: ByteSink>(
    device: &mut Device<S>,
    chunks: &Receiver<ChunkResult>,
    timeout: Duration,
) -> CliResult<(Message, SystemTime)> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(reply_timeout(timeout));
        }
        match chunks.recv_timeout(remaining) {
            Ok(Ok(chunk)) => {
                for result in device.receive(&chunk.bytes) {
                    match result {
                        Ok(message) => return Ok((message, chunk.timestamp)),
                        Err(err) => warn!(error = %err, "ignoring reply frame"),
                    }
                }
            }
            Ok(Err(err)) => return Err(transport_error("receive failed", err)),
            Err(RecvTimeoutError::Timeout) => return Err(reply_timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(CliError::new(FAILURE, "device closed before replying"))
            }
        }
    }
}

fn reply_timeout(timeout: Duration) -> CliError {
    CliError::new(TIMEOUT, format!("no reply within {timeout:?}"))
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use panelcfg_frame::{build_command, CLOCK_CONFIG};
    use panelcfg_transport::{loopback, IoSink};

    use super::*;

    fn device() -> Device<IoSink<Vec<u8>>> {
        Device::new(IoSink::new(Vec::new()))
    }

    #[test]
    fn wait_returns_first_valid_message() {
        let (tx, rx) = mpsc::channel();
        let mut wire = build_command(0xEE, &[]).unwrap().to_vec();
        wire.extend_from_slice(&build_command(CLOCK_CONFIG, &[0u8; 12]).unwrap());
        tx.send(Ok(Chunk::now(wire[..70].to_vec()))).unwrap();
        tx.send(Ok(Chunk::now(wire[70..].to_vec()))).unwrap();

        let (message, _) = wait_for_reply(&mut device(), &rx, Duration::from_secs(1)).unwrap();
        assert_eq!(message.tag(), CLOCK_CONFIG);
    }

    #[test]
    fn wait_times_out() {
        let (_tx, rx) = mpsc::channel::<ChunkResult>();
        let err = wait_for_reply(&mut device(), &rx, Duration::from_millis(20)).unwrap_err();
        assert_eq!(err.code, TIMEOUT);
    }

    #[test]
    fn wait_reports_closed_stream() {
        let (tx, rx) = mpsc::channel::<ChunkResult>();
        drop(tx);
        let err = wait_for_reply(&mut device(), &rx, Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn reader_thread_forwards_chunks() {
        let (sink, source) = loopback();
        sink.inject(build_command(CLOCK_CONFIG, &[0u8; 12]).unwrap().to_vec());
        let rx = spawn_reader(source);

        let (message, _) = wait_for_reply(&mut device(), &rx, Duration::from_secs(1)).unwrap();
        assert_eq!(message.tag(), CLOCK_CONFIG);
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }
}
