use clap::{Args, Subcommand};
use std::path::PathBuf;

use panelcfg_device::{ClockSettings, Command as DeviceCommand, DisplayTiming};
use panelcfg_regs::parse_number;

use crate::exit::{device_error, CliResult};
use crate::output::{EncodedFrame, OutputFormat};

pub mod capture;
pub mod clock;
pub mod decode;
pub mod encode;
pub mod monitor;
pub mod regs;
pub mod selftest;
pub mod send;
pub mod timing;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build command frames and print them.
    Encode(EncodeArgs),
    /// Decode a capture of device replies.
    Decode(DecodeArgs),
    /// Show the encoder register map.
    Regs(RegsArgs),
    /// Compute the LCD pixel clock from PLLSAI settings.
    Clock(ClockArgs),
    /// Compute controller timing values and frame rate.
    Timing(TimingArgs),
    /// Write a command to the device.
    Send(SendArgs),
    /// Print messages from the device as they arrive.
    Monitor(MonitorArgs),
    /// Round-trip every command through an in-memory link.
    Selftest(SelftestArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Regs(args) => regs::run(args, format),
        Command::Clock(args) => clock::run(args, format),
        Command::Timing(args) => timing::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Selftest(args) => selftest::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// A host-to-device command as typed on the command line.
#[derive(Subcommand, Debug, Clone)]
pub enum CommandArg {
    /// Advance the panel to the next screen.
    NextScreen,
    /// Go back to the previous screen.
    PrevScreen,
    /// Request the LCD timing snapshot.
    GetTiming,
    /// Write LCD timing.
    PushTiming(DisplayTimingArgs),
    /// Request the clock snapshot.
    GetClock,
    /// Write PLLSAI settings.
    PushClock(ClockSettingsArgs),
    /// Read encoder registers (split into several frames past 30).
    GetEncoder {
        /// Register addresses (0x8C or 140).
        #[arg(required = true, value_parser = parse_byte)]
        addresses: Vec<u8>,
    },
    /// Write encoder registers (split into several frames past 30).
    PushEncoder {
        /// ADDRESS=VALUE pairs, e.g. 0x80=0x10.
        #[arg(required = true, value_parser = parse_register_write)]
        values: Vec<(u8, u8)>,
    },
}

impl CommandArg {
    pub fn to_commands(&self) -> Vec<DeviceCommand> {
        match self {
            CommandArg::NextScreen => vec![DeviceCommand::NextScreen],
            CommandArg::PrevScreen => vec![DeviceCommand::PrevScreen],
            CommandArg::GetTiming => vec![DeviceCommand::GetTimingConfig],
            CommandArg::PushTiming(timing) => {
                vec![DeviceCommand::PushTimingConfig(
                    timing.to_display_timing().to_config(),
                )]
            }
            CommandArg::GetClock => vec![DeviceCommand::GetClockConfig],
            CommandArg::PushClock(settings) => {
                vec![DeviceCommand::PushClockConfig(settings.to_settings())]
            }
            CommandArg::GetEncoder { addresses } => {
                DeviceCommand::encoder_reads(addresses.iter().copied())
            }
            CommandArg::PushEncoder { values } => {
                DeviceCommand::encoder_writes(values.iter().copied())
            }
        }
    }
}

/// Encode each command into its wire frame.
pub fn encode_all(commands: &[DeviceCommand]) -> CliResult<Vec<EncodedFrame>> {
    commands
        .iter()
        .map(|command| {
            let wire = command
                .encode()
                .map_err(|err| device_error("encode failed", err))?;
            Ok(EncodedFrame {
                name: command.name(),
                wire,
            })
        })
        .collect()
}

#[derive(Args, Debug, Clone)]
pub struct DisplayTimingArgs {
    /// Horizontal sync width in pixels.
    #[arg(long)]
    pub hsync: i32,
    /// Horizontal back porch in pixels.
    #[arg(long)]
    pub hbp: i32,
    /// Active width in pixels.
    #[arg(long)]
    pub width: i32,
    /// Horizontal front porch in pixels.
    #[arg(long)]
    pub hfp: i32,
    /// Vertical sync height in lines.
    #[arg(long)]
    pub vsync: i32,
    /// Vertical back porch in lines.
    #[arg(long)]
    pub vbp: i32,
    /// Active height in lines.
    #[arg(long)]
    pub height: i32,
    /// Vertical front porch in lines.
    #[arg(long)]
    pub vfp: i32,
}

impl DisplayTimingArgs {
    pub fn to_display_timing(&self) -> DisplayTiming {
        DisplayTiming {
            h_sync_width: self.hsync,
            h_back_porch: self.hbp,
            active_width: self.width,
            h_front_porch: self.hfp,
            v_sync_height: self.vsync,
            v_back_porch: self.vbp,
            active_height: self.height,
            v_front_porch: self.vfp,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ClockSettingsArgs {
    /// PLLSAI multiplier N.
    #[arg(long)]
    pub n: i32,
    /// PLLSAI divider R.
    #[arg(long)]
    pub r: i32,
    /// DIVR index (0..=3 selects /2, /4, /8, /16).
    #[arg(long)]
    pub divr: i32,
}

impl ClockSettingsArgs {
    pub fn to_settings(&self) -> ClockSettings {
        ClockSettings {
            pll_sai_n: self.n,
            pll_sai_r: self.r,
            pll_sai_div_r: self.divr,
        }
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(subcommand)]
    pub command: CommandArg,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file (hex text or raw bytes). Reads stdin when omitted.
    pub file: Option<PathBuf>,
    /// Replay the capture in chunks of this many bytes.
    #[arg(long, value_name = "N")]
    pub chunk: Option<usize>,
    /// Treat the capture as raw bytes even if it looks like hex.
    #[arg(long)]
    pub binary: bool,
}

#[derive(Args, Debug)]
pub struct RegsArgs {
    /// Register descriptor JSON. Default: built-in ADV7393 table.
    #[arg(long, value_name = "FILE")]
    pub descriptors: Option<PathBuf>,
    /// Capture holding an ENCODER_CONFIG reply to apply.
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,
    /// Print the register write listing instead of the table.
    #[arg(long)]
    pub export_c: bool,
    /// Reject snapshot addresses missing from the descriptors.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct ClockArgs {
    /// Oscillator frequency in Hz.
    #[arg(long)]
    pub osc_hz: i32,
    /// PLL input divider M.
    #[arg(long)]
    pub pll_m: i32,
    #[command(flatten)]
    pub settings: ClockSettingsArgs,
}

#[derive(Args, Debug)]
pub struct TimingArgs {
    #[command(flatten)]
    pub timing: DisplayTimingArgs,
    /// Pixel clock in MHz, to compute the frame rate.
    #[arg(long)]
    pub pixel_clock_mhz: Option<f64>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(subcommand)]
    pub command: CommandArg,
    /// Serial device node, already configured.
    #[arg(long, env = "PANELCFG_DEVICE", global = true)]
    pub device: Option<PathBuf>,
    /// Wait for one reply and print it.
    #[arg(long, global = true)]
    pub wait: bool,
    /// Maximum time to wait for a reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", global = true)]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial device node, already configured.
    #[arg(long, env = "PANELCFG_DEVICE")]
    pub device: PathBuf,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct SelftestArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Register address or value: `0x8C` or `140`.
pub fn parse_byte(input: &str) -> Result<u8, String> {
    let value = parse_number(input.trim()).ok_or_else(|| format!("not a number: {input}"))?;
    u8::try_from(value).map_err(|_| format!("{input} does not fit in a byte"))
}

/// `ADDRESS=VALUE`.
pub fn parse_register_write(input: &str) -> Result<(u8, u8), String> {
    let (address, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected ADDRESS=VALUE, got {input}"))?;
    Ok((parse_byte(address)?, parse_byte(value)?))
}
