use tracing::debug;

use crate::cmd::{encode_all, EncodeArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_frames, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let commands = args.command.to_commands();
    let frames = encode_all(&commands)?;
    debug!(frames = frames.len(), "encoded command frames");
    print_frames(&frames, format);
    Ok(SUCCESS)
}
