/// Errors that can occur while talking to the device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] panelcfg_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] panelcfg_frame::FrameError),

    /// Register model error.
    #[error("register error: {0}")]
    Regs(#[from] panelcfg_regs::RegsError),

    /// A valid frame carried a tag outside the data tag set.
    #[error("unknown message type 0x{0:02X}")]
    UnknownMessageType(u8),

    /// The payload does not match the layout its tag implies.
    #[error("malformed payload for tag 0x{tag:02X}: {reason}")]
    MalformedPayload { tag: u8, reason: String },

    /// The byte sink refused a command frame.
    #[error("transport write failed")]
    TransportWriteFailure,

    /// More registers than one frame can carry.
    #[error("{count} registers exceed the per-frame limit of {max}")]
    TooManyRegisters { count: usize, max: usize },
}

impl DeviceError {
    pub(crate) fn malformed(tag: u8, reason: impl Into<String>) -> Self {
        DeviceError::MalformedPayload {
            tag,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
