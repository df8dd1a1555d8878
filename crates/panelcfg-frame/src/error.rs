/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The trailing checksum byte does not match the sum of bytes 0..63.
    #[error("checksum mismatch (computed 0x{expected:02X}, frame carries 0x{actual:02X})")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// The length byte claims more payload than a frame can carry.
    #[error("invalid payload length {length} (max {max})")]
    InvalidLength { length: u8, max: usize },

    /// A raw frame handed to the parser was not exactly one frame long.
    #[error("truncated frame ({len} bytes, expected {expected})")]
    Truncated { len: usize, expected: usize },

    /// The payload exceeds what fits in one frame.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The byte sink reported a failed write.
    #[error("byte sink rejected a {len}-byte frame")]
    SinkRejected { len: usize },

    /// Transport-level error while pulling bytes.
    #[error("transport error: {0}")]
    Transport(#[from] panelcfg_transport::TransportError),

    /// An I/O error occurred inside an async codec.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte stream ended before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// True for errors that cost exactly one frame and leave the stream usable.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            FrameError::ChecksumMismatch { .. }
                | FrameError::InvalidLength { .. }
                | FrameError::Truncated { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
