/// Errors raised by the register model.
#[derive(Debug, thiserror::Error)]
pub enum RegsError {
    /// A bit range is reversed or reaches past the register width.
    #[error("invalid bit range {start}..={end} (max bit {max})")]
    InvalidBitRange { start: u8, end: u8, max: u8 },

    /// More bytes than fit in a 32-bit value.
    #[error("group of {len} bytes exceeds {max}-byte limit")]
    GroupTooWide { len: usize, max: usize },

    /// No descriptor for the given register address.
    #[error("unknown register 0x{0:02X}")]
    UnknownRegister(u8),

    /// The register has no field with this name.
    #[error("register 0x{address:02X} has no field named {field:?}")]
    UnknownField { address: u8, field: String },

    /// The group has no field with this name.
    #[error("register group {group:?} has no field named {field:?}")]
    UnknownGroupField { group: String, field: String },

    /// No group with this name.
    #[error("unknown register group {0:?}")]
    UnknownGroup(String),

    /// Two descriptors claim the same address.
    #[error("duplicate register 0x{0:02X}")]
    DuplicateRegister(u8),

    /// The descriptor set is structurally inconsistent.
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// The descriptor file could not be read.
    #[error("failed to load descriptors: {0}")]
    LoadFailed(String),

    /// The descriptor document is not valid JSON for the expected shape.
    #[error("failed to parse descriptors: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RegsError>;
