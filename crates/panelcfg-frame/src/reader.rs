use panelcfg_transport::ByteSource;

use crate::codec::{Frame, FrameConfig};
use crate::decoder::{DecoderStats, FrameDecoder};
use crate::error::{FrameError, Result};

/// Pulls complete, checksum-valid frames from any [`ByteSource`].
///
/// Handles partial chunks internally. Corrupt frames are skipped (and
/// counted), so callers only ever see frames that passed validation.
pub struct FrameReader<S> {
    inner: S,
    decoder: FrameDecoder,
}

impl<S: ByteSource> FrameReader<S> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: S) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: S, config: FrameConfig) -> Self {
        Self {
            inner,
            decoder: FrameDecoder::with_config(config),
        }
    }

    /// Read the next valid frame (blocking if the source blocks).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the source ends.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            while let Some(result) = self.decoder.next_frame() {
                match result {
                    Ok(frame) => return Ok(frame),
                    Err(err) if err.is_frame_local() => continue,
                    Err(err) => return Err(err),
                }
            }

            match self.inner.next_chunk()? {
                Some(chunk) => self.decoder.push(&chunk.bytes),
                None => return Err(FrameError::ConnectionClosed),
            }
        }
    }

    /// Decoder counters (frames decoded and discarded so far).
    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the reader and return the inner source.
    pub fn into_inner(self) -> S {
        self.inner
    }
}
