//! Little-endian integers spread over consecutive byte registers.

use crate::error::{RegsError, Result};

/// Widest group that still fits in a `u32`.
pub const MAX_GROUP_BYTES: usize = 4;

/// Accumulate `bytes` little-endian: `sum(byte[i] << 8*i)`.
///
/// More than [`MAX_GROUP_BYTES`] bytes are rejected instead of silently
/// overflowing.
pub fn combine(bytes: &[u8]) -> Result<u32> {
    check_width(bytes.len())?;
    Ok(bytes
        .iter()
        .enumerate()
        .fold(0u32, |acc, (i, byte)| acc | (u32::from(*byte) << (8 * i))))
}

/// Split `value` into `byte_count` little-endian bytes.
///
/// Bits above `8 * byte_count` are dropped.
pub fn split(value: u32, byte_count: usize) -> Result<Vec<u8>> {
    check_width(byte_count)?;
    Ok(value.to_le_bytes()[..byte_count].to_vec())
}

fn check_width(len: usize) -> Result<()> {
    if len > MAX_GROUP_BYTES {
        return Err(RegsError::GroupTooWide {
            len,
            max: MAX_GROUP_BYTES,
        });
    }
    Ok(())
}
