//! Frame type tags.
//!
//! Host→device commands live in `0xC0..=0xCF`, device→host data in
//! `0xF0..=0xFF`. The two spaces are independent: a command tag is never
//! interpreted as data and vice versa.

/// Advance the on-device debug screen.
pub const NEXT_SCREEN: u8 = 0xC1;
/// Go back one debug screen.
pub const PREV_SCREEN: u8 = 0xC2;
/// Request a [`TIMING_CONFIG`] snapshot.
pub const GET_TIMING_CONFIG: u8 = 0xC3;
/// Write 10 timing registers.
pub const PUSH_TIMING_CONFIG: u8 = 0xC4;
/// Request a [`CLOCK_CONFIG`] snapshot.
pub const GET_CLOCK_CONFIG: u8 = 0xC5;
/// Write the PLLSAI settings.
pub const PUSH_CLOCK_CONFIG: u8 = 0xC6;
/// Read a list of encoder registers.
pub const GET_ENCODER_CONFIG: u8 = 0xC7;
/// Write `(address, value)` encoder register pairs.
pub const PUSH_ENCODER_CONFIG: u8 = 0xC8;

/// Timing controller register snapshot.
pub const TIMING_CONFIG: u8 = 0xF1;
/// Pixel clock configuration snapshot.
pub const CLOCK_CONFIG: u8 = 0xF2;
/// Encoder `(address, value)` snapshot.
pub const ENCODER_CONFIG: u8 = 0xF3;
/// Encoder registers changed since the last snapshot.
pub const ENCODER_CHANGESET: u8 = 0xF4;

/// First tag of the command range.
pub const COMMAND_RANGE_START: u8 = 0xC0;
/// Last tag of the command range.
pub const COMMAND_RANGE_END: u8 = 0xCF;
/// First tag of the data range.
pub const DATA_RANGE_START: u8 = 0xF0;

/// Every command tag, in wire order.
pub const COMMAND_TAGS: [u8; 8] = [
    NEXT_SCREEN,
    PREV_SCREEN,
    GET_TIMING_CONFIG,
    PUSH_TIMING_CONFIG,
    GET_CLOCK_CONFIG,
    PUSH_CLOCK_CONFIG,
    GET_ENCODER_CONFIG,
    PUSH_ENCODER_CONFIG,
];

/// Every data tag, in wire order.
pub const DATA_TAGS: [u8; 4] = [TIMING_CONFIG, CLOCK_CONFIG, ENCODER_CONFIG, ENCODER_CHANGESET];

/// Returns a human-readable name for a tag.
pub fn tag_name(tag: u8) -> &'static str {
    match tag {
        NEXT_SCREEN => "NEXT_SCREEN",
        PREV_SCREEN => "PREV_SCREEN",
        GET_TIMING_CONFIG => "GET_TIMING_CONFIG",
        PUSH_TIMING_CONFIG => "PUSH_TIMING_CONFIG",
        GET_CLOCK_CONFIG => "GET_CLOCK_CONFIG",
        PUSH_CLOCK_CONFIG => "PUSH_CLOCK_CONFIG",
        GET_ENCODER_CONFIG => "GET_ENCODER_CONFIG",
        PUSH_ENCODER_CONFIG => "PUSH_ENCODER_CONFIG",
        TIMING_CONFIG => "TIMING_CONFIG",
        CLOCK_CONFIG => "CLOCK_CONFIG",
        ENCODER_CONFIG => "ENCODER_CONFIG",
        ENCODER_CHANGESET => "ENCODER_CHANGESET",
        COMMAND_RANGE_START..=COMMAND_RANGE_END => "RESERVED_COMMAND",
        DATA_RANGE_START..=u8::MAX => "RESERVED_DATA",
        _ => "UNKNOWN",
    }
}

/// Returns true if the tag is in the host→device range.
pub fn is_command(tag: u8) -> bool {
    (COMMAND_RANGE_START..=COMMAND_RANGE_END).contains(&tag)
}

/// Returns true if the tag is in the device→host range.
pub fn is_data(tag: u8) -> bool {
    tag >= DATA_RANGE_START
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_spaces_do_not_overlap() {
        for tag in COMMAND_TAGS {
            assert!(is_command(tag));
            assert!(!is_data(tag));
        }
        for tag in DATA_TAGS {
            assert!(is_data(tag));
            assert!(!is_command(tag));
        }
    }

    #[test]
    fn names() {
        assert_eq!(tag_name(PUSH_CLOCK_CONFIG), "PUSH_CLOCK_CONFIG");
        assert_eq!(tag_name(ENCODER_CHANGESET), "ENCODER_CHANGESET");
        assert_eq!(tag_name(0xCF), "RESERVED_COMMAND");
        assert_eq!(tag_name(0xFF), "RESERVED_DATA");
        assert_eq!(tag_name(0x01), "UNKNOWN");
    }
}
