use panelcfg_frame::{
    build_command, tag_name, Frame, FRAME_SIZE, GET_CLOCK_CONFIG, GET_ENCODER_CONFIG,
    GET_TIMING_CONFIG, NEXT_SCREEN, PREV_SCREEN, PUSH_CLOCK_CONFIG, PUSH_ENCODER_CONFIG,
    PUSH_TIMING_CONFIG,
};

use crate::clock::ClockSettings;
use crate::error::{DeviceError, Result};
use crate::timing::TimingConfig;

/// Registers one encoder command may name.
///
/// The device answers a read with `(address, value)` pairs, so 30 addresses
/// is the most whose reply still fits in one frame.
pub const MAX_ENCODER_REGISTERS: usize = 30;

/// Host-to-device command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NextScreen,
    PrevScreen,
    GetTimingConfig,
    PushTimingConfig(TimingConfig),
    GetClockConfig,
    PushClockConfig(ClockSettings),
    GetEncoderConfig(Vec<u8>),
    PushEncoderConfig(Vec<(u8, u8)>),
}

impl Command {
    /// Read the given encoder registers (at most 30).
    pub fn get_encoder_config(addresses: impl IntoIterator<Item = u8>) -> Result<Self> {
        let addresses: Vec<u8> = addresses.into_iter().collect();
        check_register_count(addresses.len())?;
        Ok(Command::GetEncoderConfig(addresses))
    }

    /// Write the given `(address, value)` pairs (at most 30).
    pub fn push_encoder_config(values: impl IntoIterator<Item = (u8, u8)>) -> Result<Self> {
        let values: Vec<(u8, u8)> = values.into_iter().collect();
        check_register_count(values.len())?;
        Ok(Command::PushEncoderConfig(values))
    }

    /// Read any number of registers, split across as many commands as needed.
    pub fn encoder_reads(addresses: impl IntoIterator<Item = u8>) -> Vec<Self> {
        let addresses: Vec<u8> = addresses.into_iter().collect();
        addresses
            .chunks(MAX_ENCODER_REGISTERS)
            .map(|chunk| Command::GetEncoderConfig(chunk.to_vec()))
            .collect()
    }

    /// Write any number of registers, split across as many commands as needed.
    pub fn encoder_writes(values: impl IntoIterator<Item = (u8, u8)>) -> Vec<Self> {
        let values: Vec<(u8, u8)> = values.into_iter().collect();
        values
            .chunks(MAX_ENCODER_REGISTERS)
            .map(|chunk| Command::PushEncoderConfig(chunk.to_vec()))
            .collect()
    }

    pub fn tag(&self) -> u8 {
        match self {
            Command::NextScreen => NEXT_SCREEN,
            Command::PrevScreen => PREV_SCREEN,
            Command::GetTimingConfig => GET_TIMING_CONFIG,
            Command::PushTimingConfig(_) => PUSH_TIMING_CONFIG,
            Command::GetClockConfig => GET_CLOCK_CONFIG,
            Command::PushClockConfig(_) => PUSH_CLOCK_CONFIG,
            Command::GetEncoderConfig(_) => GET_ENCODER_CONFIG,
            Command::PushEncoderConfig(_) => PUSH_ENCODER_CONFIG,
        }
    }

    pub fn name(&self) -> &'static str {
        tag_name(self.tag())
    }

    /// Payload bytes, before framing.
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Command::NextScreen
            | Command::PrevScreen
            | Command::GetTimingConfig
            | Command::GetClockConfig => Vec::new(),
            Command::PushTimingConfig(config) => config.to_payload().to_vec(),
            Command::PushClockConfig(settings) => settings.to_payload().to_vec(),
            Command::GetEncoderConfig(addresses) => addresses.clone(),
            Command::PushEncoderConfig(values) => values
                .iter()
                .flat_map(|(address, value)| [*address, *value])
                .collect(),
        }
    }

    pub fn to_frame(&self) -> Frame {
        Frame::new(self.tag(), self.payload())
    }

    /// Reject hand-built encoder commands naming more than 30 registers.
    pub fn validate(&self) -> Result<()> {
        match self {
            Command::GetEncoderConfig(addresses) => check_register_count(addresses.len()),
            Command::PushEncoderConfig(values) => check_register_count(values.len()),
            _ => Ok(()),
        }
    }

    /// Encode as a complete 64-byte wire frame.
    pub fn encode(&self) -> Result<[u8; FRAME_SIZE]> {
        self.validate()?;
        Ok(build_command(self.tag(), &self.payload())?)
    }
}

fn check_register_count(count: usize) -> Result<()> {
    if count > MAX_ENCODER_REGISTERS {
        return Err(DeviceError::TooManyRegisters {
            count,
            max: MAX_ENCODER_REGISTERS,
        });
    }
    Ok(())
}
