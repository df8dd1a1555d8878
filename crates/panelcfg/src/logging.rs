//! Stderr logging for the CLI.
//!
//! Stdout carries command output only. The level comes from, in order:
//! `PANELCFG_LOG` (an `EnvFilter` directive such as `panelcfg_frame=debug`),
//! `--log-level`, then the subcommand's default.

use clap::ValueEnum;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use crate::cmd::Command;

/// Environment variable holding a filter directive.
pub const LOG_ENV: &str = "PANELCFG_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    /// Offline tools stay quiet unless something is wrong; commands that
    /// talk to a device report their progress.
    pub fn default_for(command: &Command) -> Self {
        match command {
            Command::Send(_) | Command::Monitor(_) => LogLevel::Info,
            Command::Encode(_)
            | Command::Decode(_)
            | Command::Regs(_)
            | Command::Clock(_)
            | Command::Timing(_)
            | Command::Selftest(_)
            | Command::Version(_) => LogLevel::Warn,
        }
    }
}

pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.as_filter().into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::{MonitorArgs, SelftestArgs};

    #[test]
    fn device_commands_default_to_info() {
        let monitor = Command::Monitor(MonitorArgs {
            device: "/dev/ttyACM0".into(),
            count: None,
        });
        assert_eq!(LogLevel::default_for(&monitor), LogLevel::Info);

        let selftest = Command::Selftest(SelftestArgs::default());
        assert_eq!(LogLevel::default_for(&selftest), LogLevel::Warn);
    }
}
