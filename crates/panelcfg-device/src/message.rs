use std::collections::{BTreeMap, BTreeSet};

use panelcfg_frame::{Frame, CLOCK_CONFIG, ENCODER_CHANGESET, ENCODER_CONFIG, TIMING_CONFIG};
use panelcfg_regs::RegisterMap;
use serde::Serialize;

use crate::clock::ClockConfig;
use crate::error::{DeviceError, Result};
use crate::timing::TimingConfig;

/// Encoder register values reported by the device, ordered by address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncoderSnapshot {
    pub registers: BTreeMap<u8, u8>,
}

impl EncoderSnapshot {
    /// Decode `(address, value)` pairs. A repeated address keeps the last
    /// value.
    pub fn from_payload(tag: u8, payload: &[u8]) -> Result<Self> {
        let registers = pairs(tag, payload)?.collect();
        Ok(Self { registers })
    }

    /// Merge into a register map, returning the addresses that changed.
    pub fn apply_to(&self, map: &mut RegisterMap) -> Result<BTreeSet<u8>> {
        Ok(map.apply_snapshot(&self.registers)?)
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}

/// Addresses the device reports as changed since its last snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncoderChangeSet {
    pub addresses: BTreeSet<u8>,
}

impl EncoderChangeSet {
    /// Decode with the snapshot's pair layout, keeping only the addresses.
    pub fn from_payload(tag: u8, payload: &[u8]) -> Result<Self> {
        let addresses = pairs(tag, payload)?.map(|(address, _)| address).collect();
        Ok(Self { addresses })
    }
}

fn pairs(tag: u8, payload: &[u8]) -> Result<impl Iterator<Item = (u8, u8)> + '_> {
    if payload.len() % 2 != 0 {
        return Err(DeviceError::malformed(
            tag,
            format!("odd register pair payload ({} bytes)", payload.len()),
        ));
    }
    Ok(payload.chunks_exact(2).map(|pair| (pair[0], pair[1])))
}

/// Typed device-to-host message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    TimingConfig(TimingConfig),
    ClockConfig(ClockConfig),
    EncoderConfig(EncoderSnapshot),
    EncoderChangeSet(EncoderChangeSet),
}

impl Message {
    /// Data tag this message arrives under.
    pub fn tag(&self) -> u8 {
        match self {
            Message::TimingConfig(_) => TIMING_CONFIG,
            Message::ClockConfig(_) => CLOCK_CONFIG,
            Message::EncoderConfig(_) => ENCODER_CONFIG,
            Message::EncoderChangeSet(_) => ENCODER_CHANGESET,
        }
    }

    pub fn name(&self) -> &'static str {
        panelcfg_frame::tag_name(self.tag())
    }
}

/// Map a checksum-valid frame to a typed message.
///
/// Unknown tags and payloads that do not fit their tag's layout are errors
/// for this frame only.
pub fn interpret(frame: &Frame) -> Result<Message> {
    let payload = frame.payload.as_ref();
    match frame.tag {
        TIMING_CONFIG => TimingConfig::from_payload(frame.tag, payload).map(Message::TimingConfig),
        CLOCK_CONFIG => ClockConfig::from_payload(frame.tag, payload).map(Message::ClockConfig),
        ENCODER_CONFIG => {
            EncoderSnapshot::from_payload(frame.tag, payload).map(Message::EncoderConfig)
        }
        ENCODER_CHANGESET => {
            EncoderChangeSet::from_payload(frame.tag, payload).map(Message::EncoderChangeSet)
        }
        other => Err(DeviceError::UnknownMessageType(other)),
    }
}
