use std::time::SystemTime;

use panelcfg_device::interpret;
use panelcfg_frame::FrameDecoder;
use tracing::{info, warn};

use crate::cmd::capture::read_capture;
use crate::cmd::DecodeArgs;
use crate::exit::{CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    if args.chunk == Some(0) {
        return Err(CliError::new(USAGE, "--chunk must be greater than zero"));
    }
    let capture = read_capture(args.file.as_deref(), args.binary)?;
    let chunk_size = args.chunk.unwrap_or(capture.len().max(1));

    let mut decoder = FrameDecoder::new();
    let mut printed = 0usize;
    let mut rejected = 0usize;

    for chunk in capture.chunks(chunk_size) {
        for frame in decoder.feed(chunk) {
            match interpret(&frame) {
                Ok(message) => {
                    print_message(&message, SystemTime::now(), format);
                    printed = printed.saturating_add(1);
                }
                Err(err) => {
                    warn!(tag = frame.tag, error = %err, "frame not interpreted");
                    rejected = rejected.saturating_add(1);
                }
            }
        }
    }

    let stats = decoder.stats();
    let trailing = decoder.buffered();
    info!(
        messages = printed,
        rejected,
        discarded = stats.frames_discarded,
        trailing,
        "capture decoded"
    );

    if rejected > 0 || stats.frames_discarded > 0 || trailing > 0 {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}
