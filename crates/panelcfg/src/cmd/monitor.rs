use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use panelcfg_device::Device;
use panelcfg_transport::{ByteSource, DeviceFile};
use tracing::{info, warn};

use crate::cmd::MonitorArgs;
use crate::exit::{transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let (sink, mut source) = DeviceFile::open(&args.device)
        .and_then(DeviceFile::split)
        .map_err(|err| transport_error("open failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let limit = args.count.unwrap_or(usize::MAX);
    let printed = Arc::new(AtomicUsize::new(0));
    let mut device = Device::new(sink);
    let counter = Arc::clone(&printed);
    device.subscribe(move |message, timestamp| {
        if counter.load(Ordering::SeqCst) < limit {
            print_message(message, timestamp, format);
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    while running.load(Ordering::SeqCst) && printed.load(Ordering::SeqCst) < limit {
        let chunk = match source
            .next_chunk()
            .map_err(|err| transport_error("receive failed", err))?
        {
            Some(chunk) => chunk,
            None => break,
        };
        for err in device.on_chunk(&chunk.bytes, chunk.timestamp) {
            warn!(error = %err, "message not interpreted");
        }
    }

    let stats = device.stats();
    info!(
        messages = printed.load(Ordering::SeqCst),
        decoded = stats.frames_decoded,
        discarded = stats.frames_discarded,
        "monitor stopped"
    );
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
