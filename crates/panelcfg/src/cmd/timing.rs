use panelcfg_device::{DisplayTiming, TimingConfig};
use serde::Serialize;

use crate::cmd::TimingArgs;
use crate::exit::{CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_report, OutputFormat};

#[derive(Debug, Serialize)]
struct TimingReport {
    display: DisplayTiming,
    registers: TimingConfig,
    frame_rate_hz: Option<f64>,
}

pub fn run(args: TimingArgs, format: OutputFormat) -> CliResult<i32> {
    let display = args.timing.to_display_timing();
    let registers = display.to_config();

    let frame_rate_hz = match args.pixel_clock_mhz {
        Some(mhz) => Some(registers.frame_rate(mhz).ok_or_else(|| {
            CliError::new(DATA_INVALID, "total frame area must be positive")
        })?),
        None => None,
    };

    let mut rows = vec![
        ("horizontal_sync", registers.horizontal_sync.to_string()),
        ("vertical_sync", registers.vertical_sync.to_string()),
        ("accumulated_hbp", registers.accumulated_hbp.to_string()),
        ("accumulated_vbp", registers.accumulated_vbp.to_string()),
        (
            "accumulated_active_w",
            registers.accumulated_active_w.to_string(),
        ),
        (
            "accumulated_active_h",
            registers.accumulated_active_h.to_string(),
        ),
        ("total_width", registers.total_width.to_string()),
        ("total_height", registers.total_height.to_string()),
        ("image_width", registers.image_width.to_string()),
        ("image_height", registers.image_height.to_string()),
    ];
    if let Some(rate) = frame_rate_hz {
        rows.push(("frame_rate_hz", format!("{rate:.2}")));
    }

    let report = TimingReport {
        display,
        registers,
        frame_rate_hz,
    };
    print_report(&report, &rows, format);
    Ok(SUCCESS)
}
