//! Fixed-size framing with an additive checksum for the panelcfg serial link.
//!
//! Every frame on the wire, in both directions, is exactly 64 bytes:
//! - a 1-byte type tag
//! - a 1-byte payload length (0-61)
//! - the payload, zero padded
//! - a 1-byte additive checksum of bytes 0..=62
//!
//! Inbound bytes arrive in arbitrary chunks; [`FrameDecoder`] reassembles
//! them and drops anything that fails the checksum.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod reader;
pub mod tags;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::FixedFrameCodec;
pub use codec::{
    build_command, checksum, decode_frame, encode_frame, parse_frame, Frame, FrameConfig,
    CHECKSUM_OFFSET, FRAME_SIZE, HEADER_SIZE, MAX_PAYLOAD,
};
pub use decoder::{DecoderStats, FrameDecoder};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use tags::{
    is_command, is_data, tag_name, CLOCK_CONFIG, COMMAND_TAGS, DATA_TAGS, ENCODER_CHANGESET,
    ENCODER_CONFIG, GET_CLOCK_CONFIG, GET_ENCODER_CONFIG, GET_TIMING_CONFIG, NEXT_SCREEN,
    PREV_SCREEN, PUSH_CLOCK_CONFIG, PUSH_ENCODER_CONFIG, PUSH_TIMING_CONFIG, TIMING_CONFIG,
};
pub use writer::FrameWriter;
