//! Register model for the video encoder attached to the panel board.
//!
//! Two pure codecs sit at the bottom:
//! - [`bitfield`] reads and writes inclusive bit ranges inside a value.
//! - [`multibyte`] spreads integers across consecutive byte registers,
//!   little-endian.
//!
//! On top of them, [`RegisterMap`] pairs static descriptors (names, reset
//! values, field layout) with the values last seen on the device. The
//! ADV7393 table ships embedded; other tables load from JSON.

pub mod bitfield;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod map;
pub mod multibyte;

pub use bitfield::{extract, format_bin, format_hex, insert, is_modified, BitRange};
pub use config::RegistryConfig;
pub use descriptor::{
    parse_number, DescriptorSet, EnumOption, FieldKind, Register, RegisterField, RegisterGroup,
};
pub use error::{RegsError, Result};
pub use map::{RegisterMap, EXPORT_MARKER};
pub use multibyte::{combine, split, MAX_GROUP_BYTES};
