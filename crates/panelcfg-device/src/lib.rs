//! Typed conversation with the panel board.
//!
//! Commands go out through [`Device::send`]; raw bytes coming back are fed
//! to [`Device::receive`] (or [`Device::on_chunk`] for subscribers), which
//! reassembles frames and maps them to [`Message`]s.

pub mod clock;
pub mod command;
pub mod device;
pub mod error;
pub mod message;
pub mod timing;

pub use clock::{
    divr_divisor, ClockConfig, ClockSettings, PllSource, CLOCK_PAYLOAD_LEN, CLOCK_SETTINGS_LEN,
    DIVR_LOOKUP,
};
pub use command::{Command, MAX_ENCODER_REGISTERS};
pub use device::{Device, DeviceConfig, DeviceStats, SubscriptionId};
pub use error::{DeviceError, Result};
pub use message::{interpret, EncoderChangeSet, EncoderSnapshot, Message};
pub use timing::{DisplayTiming, TimingConfig, TIMING_PAYLOAD_LEN};
