//! Host side of the panel board configuration link.
//!
//! panelcfg talks to an LCD panel board over a serial line: it frames
//! commands, reassembles and checks replies, and keeps a register model of
//! the board's ADV7393 video encoder.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte sink/source seams (device files, loopback)
//! - [`frame`]: fixed 64-byte frames with additive checksum
//! - [`regs`]: bit-field and multi-byte codecs, encoder register map
//! - [`device`]: typed commands, message interpretation, device sessions

/// Re-export transport types.
pub mod transport {
    pub use panelcfg_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use panelcfg_frame::*;
}

/// Re-export register model types.
pub mod regs {
    pub use panelcfg_regs::*;
}

/// Re-export device types.
pub mod device {
    pub use panelcfg_device::*;
}
