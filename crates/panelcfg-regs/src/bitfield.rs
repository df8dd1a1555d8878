//! Inclusive bit ranges inside a register value.
//!
//! Ranges are valid up to bit 31 so a field spanning a grouped
//! multi-register integer goes through the same code as a single byte.

use serde::{Deserialize, Serialize};

use crate::error::{RegsError, Result};

/// Highest bit index a [`BitRange`] may reach.
pub const MAX_BIT: u8 = 31;

/// An inclusive `[start, end]` bit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitRange {
    #[serde(rename = "bit_start")]
    start: u8,
    #[serde(rename = "bit_end")]
    end: u8,
}

impl BitRange {
    /// Create a range, rejecting `end < start` and bits above 31.
    pub fn new(start: u8, end: u8) -> Result<Self> {
        if start > end || end > MAX_BIT {
            return Err(RegsError::InvalidBitRange {
                start,
                end,
                max: MAX_BIT,
            });
        }
        Ok(Self { start, end })
    }

    /// A single-bit range.
    pub fn bit(index: u8) -> Result<Self> {
        Self::new(index, index)
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn end(&self) -> u8 {
        self.end
    }

    /// Number of bits covered.
    pub fn width(&self) -> u8 {
        self.end.saturating_sub(self.start).saturating_add(1)
    }

    /// Unshifted mask, `(1 << width) - 1`.
    pub fn mask(&self) -> u32 {
        low_mask(self.width())
    }

    /// Read the field out of `value`.
    pub fn extract(&self, value: u32) -> u32 {
        value.checked_shr(u32::from(self.start)).unwrap_or(0) & self.mask()
    }

    /// Replace the field in `value`, truncating `field` to the range width.
    pub fn insert(&self, value: u32, field: u32) -> u32 {
        let shift = u32::from(self.start);
        let mask = self.mask();
        let cleared = value & !mask.checked_shl(shift).unwrap_or(0);
        cleared | (field & mask).checked_shl(shift).unwrap_or(0)
    }

    /// True when the field differs between `value` and `reset`.
    pub fn is_modified(&self, value: u32, reset: u32) -> bool {
        self.extract(value) != self.extract(reset)
    }
}

fn low_mask(width: u8) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

// Descriptor-level helpers. Bit positions come from validated descriptors and
// are trusted; out-of-range shifts yield zero rather than panicking.

/// `(value >> start) & mask` for a byte-wide register.
pub fn extract(value: u8, start: u8, end: u8) -> u32 {
    BitRange { start, end }.extract(u32::from(value))
}

/// Clear `[start, end]` in `value` and write `field` (masked) into it.
pub fn insert(value: u8, start: u8, end: u8, field: u32) -> u8 {
    let updated = BitRange { start, end }.insert(u32::from(value), field);
    (updated & 0xFF) as u8
}

/// True iff the field differs from the same field in `reset`.
pub fn is_modified(value: u8, start: u8, end: u8, reset: u8) -> bool {
    extract(value, start, end) != extract(reset, start, end)
}

/// `0x` followed by upper-case hex, zero padded to two digits per byte.
pub fn format_hex(value: u32, byte_count: usize) -> String {
    format!("0x{value:0width$X}", width = byte_count * 2)
}

/// `0b` followed by binary, zero padded to eight digits per byte.
pub fn format_bin(value: u32, byte_count: usize) -> String {
    format!("0b{value:0width$b}", width = byte_count * 8)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn extract_reads_inclusive_range() {
        // SD Mode Register 1 reset value: standard=0, luma filter=4, chroma=0.
        assert_eq!(extract(0x10, 5, 7), 0);
        assert_eq!(extract(0x10, 2, 4), 4);
        assert_eq!(extract(0x10, 0, 1), 0);
        assert_eq!(extract(0xFF, 0, 7), 0xFF);
        assert_eq!(extract(0b1000_0000, 7, 7), 1);
    }

    #[test]
    fn insert_clears_before_writing() {
        assert_eq!(insert(0xFF, 2, 4, 0), 0b1110_0011);
        assert_eq!(insert(0x00, 5, 7, 3), 0b0110_0000);
        assert_eq!(insert(0x10, 5, 7, 1), 0x30);
    }

    #[test]
    fn insert_truncates_oversized_field() {
        assert_eq!(insert(0x00, 0, 1, 0xFF), 0b11);
        assert_eq!(insert(0x00, 6, 6, 2), 0x00);
    }

    #[test]
    fn is_modified_compares_field_only() {
        // Power Mode reset 0x12: toggling bit 0 leaves the DAC1 field alone.
        assert!(!is_modified(0x13, 3, 3, 0x12));
        assert!(is_modified(0x1A, 3, 3, 0x12));
        assert!(!is_modified(0x12, 7, 7, 0x12));
    }

    #[test]
    fn range_validation() {
        assert!(BitRange::new(0, 31).is_ok());
        assert!(matches!(
            BitRange::new(5, 3),
            Err(RegsError::InvalidBitRange { start: 5, end: 3, .. })
        ));
        assert!(matches!(
            BitRange::new(0, 32),
            Err(RegsError::InvalidBitRange { .. })
        ));
    }

    #[test]
    fn full_width_mask_does_not_overflow() {
        let range = BitRange::new(0, 31).unwrap();
        assert_eq!(range.width(), 32);
        assert_eq!(range.mask(), u32::MAX);
        assert_eq!(range.extract(0x1F7C_0F21), 0x1F7C_0F21);
        assert_eq!(range.insert(0, 0xDEAD_BEEF), 0xDEAD_BEEF);
    }

    #[test]
    fn high_bits_of_wide_value() {
        let range = BitRange::new(24, 31).unwrap();
        assert_eq!(range.extract(0x1F7C_0F21), 0x1F);
        assert_eq!(range.insert(0x1F7C_0F21, 0xAB), 0xAB7C_0F21);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_hex(0x12, 1), "0x12");
        assert_eq!(format_hex(0x0a, 1), "0x0A");
        assert_eq!(format_hex(0x1F7C_0F21, 4), "0x1F7C0F21");
        assert_eq!(format_bin(0x12, 1), "0b00010010");
        assert_eq!(format_bin(1, 2), "0b0000000000000001");
    }

    #[test]
    fn range_deserializes_from_descriptor_keys() {
        let range: BitRange = serde_json::from_str(r#"{"bit_start":2,"bit_end":4}"#).unwrap();
        assert_eq!(range, BitRange::new(2, 4).unwrap());
    }

    proptest! {
        #[test]
        fn insert_then_extract_roundtrip(
            value in any::<u8>(),
            (start, end) in (0u8..=7).prop_flat_map(|s| (Just(s), s..=7)),
            field in any::<u32>(),
        ) {
            let mask = (1u32 << (end - start + 1)) - 1;
            prop_assert_eq!(extract(insert(value, start, end, field), start, end), field & mask);
        }

        #[test]
        fn insert_leaves_other_bits_untouched(
            value in any::<u8>(),
            (start, end) in (0u8..=7).prop_flat_map(|s| (Just(s), s..=7)),
            field in any::<u32>(),
        ) {
            let mask = (((1u32 << (end - start + 1)) - 1) << start) as u8;
            prop_assert_eq!(insert(value, start, end, field) & !mask, value & !mask);
        }

        #[test]
        fn wide_roundtrip(
            value in any::<u32>(),
            (start, end) in (0u8..=31).prop_flat_map(|s| (Just(s), s..=31)),
            field in any::<u32>(),
        ) {
            let range = BitRange::new(start, end).unwrap();
            prop_assert_eq!(range.extract(range.insert(value, field)), field & range.mask());
        }
    }
}
