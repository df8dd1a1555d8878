use panelcfg_device::{divr_divisor, ClockConfig, PllSource};
use serde::Serialize;

use crate::cmd::ClockArgs;
use crate::exit::{CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_report, OutputFormat};

#[derive(Debug, Serialize)]
struct ClockReport {
    #[serde(flatten)]
    config: ClockConfig,
    divr_divisor: u32,
    lcd_clock_mhz: f64,
}

pub fn run(args: ClockArgs, format: OutputFormat) -> CliResult<i32> {
    let settings = args.settings.to_settings();
    let config = ClockConfig {
        source: Some(PllSource {
            osc_source_hz: args.osc_hz,
            pll_m: args.pll_m,
        }),
        pll_sai_n: settings.pll_sai_n,
        pll_sai_r: settings.pll_sai_r,
        pll_sai_div_r: settings.pll_sai_div_r,
    };

    let divisor = divr_divisor(config.pll_sai_div_r).ok_or_else(|| {
        CliError::new(
            DATA_INVALID,
            format!("DIVR index {} is outside 0..=3", config.pll_sai_div_r),
        )
    })?;
    let mhz = config
        .lcd_clock_mhz()
        .ok_or_else(|| CliError::new(DATA_INVALID, "PLL M and R must be non-zero"))?;

    let report = ClockReport {
        config,
        divr_divisor: divisor,
        lcd_clock_mhz: mhz,
    };
    let rows = [
        ("osc_source_hz", args.osc_hz.to_string()),
        ("pll_m", args.pll_m.to_string()),
        ("pll_sai_n", settings.pll_sai_n.to_string()),
        ("pll_sai_r", settings.pll_sai_r.to_string()),
        ("divr", format!("{} (/{divisor})", settings.pll_sai_div_r)),
        ("lcd_clock_mhz", format!("{mhz:.3}")),
    ];
    print_report(&report, &rows, format);
    Ok(SUCCESS)
}
