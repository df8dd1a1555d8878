//! Byte-level transport seams for the panelcfg serial link.
//!
//! The serial port itself (baud rate, line discipline, reconnects) is owned
//! by whoever opens it. This crate only describes what the codec layers need
//! from it:
//! - a [`ByteSink`] that accepts a buffer and reports success
//! - a [`ByteSource`] that yields raw chunks in arrival order, with no framing
//!   guarantee
//!
//! Adapters are provided for any `Read`/`Write` pair, for an already-configured
//! device file, and for an in-memory loopback used in tests.

pub mod error;
pub mod file;
pub mod loopback;
pub mod traits;

pub use error::{Result, TransportError};
pub use file::DeviceFile;
pub use loopback::{loopback, LoopbackSink, LoopbackSource};
pub use traits::{pump, ByteSink, ByteSource, Chunk, IoSink, IoSource};
