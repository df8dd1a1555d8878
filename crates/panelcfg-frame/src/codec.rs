use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Every frame on the wire is exactly this long, in both directions.
pub const FRAME_SIZE: usize = 64;

/// Frame header: tag (1) + payload length (1).
pub const HEADER_SIZE: usize = 2;

/// Offset of the trailing checksum byte.
pub const CHECKSUM_OFFSET: usize = FRAME_SIZE - 1;

/// Largest payload that fits between the header and the checksum.
pub const MAX_PAYLOAD: usize = FRAME_SIZE - HEADER_SIZE - 1;

/// A decoded frame: type tag plus payload, padding and checksum stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Type tag (command or data).
    pub tag: u8,
    /// The `length` payload bytes that followed the header.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(tag: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            tag,
            payload: payload.into(),
        }
    }

    /// A frame with no payload.
    pub fn empty(tag: u8) -> Self {
        Self {
            tag,
            payload: Bytes::new(),
        }
    }

    /// Payload length as carried in the header byte.
    ///
    /// Saturates for payloads that could never be encoded.
    pub fn length(&self) -> u8 {
        u8::try_from(self.payload.len()).unwrap_or(u8::MAX)
    }

    /// Encode into a full wire frame.
    pub fn encode(&self) -> Result<[u8; FRAME_SIZE]> {
        build_command(self.tag, &self.payload)
    }
}

/// Additive checksum: unsigned byte sum, truncated to 8 bits.
///
/// Not a CRC. Callers pass bytes `0..63` of a frame.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, byte| acc.wrapping_add(*byte))
}

/// Build a complete 64-byte frame.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────┬──────────────────┬──────────────┬──────────┐
/// │ Tag (1B) │ Len (1B) │ Payload (0-61B)  │ Zero padding │ Sum (1B) │
/// └──────────┴──────────┴──────────────────┴──────────────┴──────────┘
///  0          1          2                                  63
/// ```
/// The checksum covers bytes 0..=62, padding included.
pub fn build_command(tag: u8, payload: &[u8]) -> Result<[u8; FRAME_SIZE]> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    let mut frame = [0u8; FRAME_SIZE];
    frame[0] = tag;
    frame[1] = payload.len() as u8;
    frame[HEADER_SIZE..HEADER_SIZE + payload.len()].copy_from_slice(payload);
    frame[CHECKSUM_OFFSET] = checksum(&frame[..CHECKSUM_OFFSET]);
    Ok(frame)
}

/// Append an encoded frame to `dst`.
pub fn encode_frame(tag: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let frame = build_command(tag, payload)?;
    dst.reserve(FRAME_SIZE);
    dst.put_slice(&frame);
    Ok(())
}

/// Verify one raw 64-byte frame and strip it down to tag and payload.
///
/// Input of any other length is rejected as [`FrameError::Truncated`].
pub fn parse_frame(raw: Bytes) -> Result<Frame> {
    if raw.len() != FRAME_SIZE {
        return Err(FrameError::Truncated {
            len: raw.len(),
            expected: FRAME_SIZE,
        });
    }

    let expected = checksum(&raw[..CHECKSUM_OFFSET]);
    let actual = raw[CHECKSUM_OFFSET];
    if expected != actual {
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }

    let length = raw[1];
    if usize::from(length) > MAX_PAYLOAD {
        return Err(FrameError::InvalidLength {
            length,
            max: MAX_PAYLOAD,
        });
    }

    let end = HEADER_SIZE + usize::from(length);
    Ok(Frame {
        tag: raw[0],
        payload: raw.slice(HEADER_SIZE..end),
    })
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` while fewer than [`FRAME_SIZE`] bytes are buffered.
/// Otherwise exactly [`FRAME_SIZE`] bytes are consumed, whether or not they
/// form a valid frame, so a corrupt frame never stalls the stream.
pub fn decode_frame(src: &mut BytesMut) -> Result<Option<Frame>> {
    if src.len() < FRAME_SIZE {
        return Ok(None); // Need more data
    }

    let raw = src.split_to(FRAME_SIZE).freeze();
    parse_frame(raw).map(Some)
}

/// Configuration for frame decoding.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Emit a warning for each discarded frame. Default: true.
    pub log_discarded_frames: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            log_discarded_frames: true,
        }
    }
}
