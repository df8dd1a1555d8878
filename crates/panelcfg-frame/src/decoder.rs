use bytes::BytesMut;
use tracing::{trace, warn};

use crate::codec::{decode_frame, Frame, FrameConfig, FRAME_SIZE};
use crate::error::Result;

const INITIAL_BUFFER_CAPACITY: usize = 4 * FRAME_SIZE;

/// Counters kept by a [`FrameDecoder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Raw bytes pushed in.
    pub bytes_received: u64,
    /// Frames that passed validation.
    pub frames_decoded: u64,
    /// Frames dropped for a bad checksum or length byte.
    pub frames_discarded: u64,
}

/// Reassembles fixed-size frames from arbitrarily chunked input.
///
/// One decoder per connection. Chunk boundaries never line up with frame
/// boundaries, so input is accumulated in a flat buffer and sliced every
/// [`FRAME_SIZE`] bytes.
///
/// There is no resynchronization: a stream that loses a byte stays shifted
/// until the link is reset with [`FrameDecoder::reset`].
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    stats: DecoderStats,
    config: FrameConfig,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a decoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            stats: DecoderStats::default(),
            config,
        }
    }

    /// Append raw bytes without decoding anything yet.
    pub fn push(&mut self, chunk: &[u8]) {
        self.stats.bytes_received = self
            .stats
            .bytes_received
            .saturating_add(chunk.len() as u64);
        self.buf.extend_from_slice(chunk);
    }

    /// Take the next complete frame off the buffer.
    ///
    /// `None` means fewer than [`FRAME_SIZE`] bytes are buffered. `Some(Err)`
    /// reports a frame that was consumed and dropped.
    pub fn next_frame(&mut self) -> Option<Result<Frame>> {
        match decode_frame(&mut self.buf) {
            Ok(None) => None,
            Ok(Some(frame)) => {
                self.stats.frames_decoded = self.stats.frames_decoded.saturating_add(1);
                trace!(tag = frame.tag, len = frame.payload.len(), "frame decoded");
                Some(Ok(frame))
            }
            Err(err) => {
                self.stats.frames_discarded = self.stats.frames_discarded.saturating_add(1);
                if self.config.log_discarded_frames {
                    warn!(error = %err, "discarding corrupt frame");
                }
                Some(Err(err))
            }
        }
    }

    /// Append a chunk and return every frame it completed.
    ///
    /// Corrupt frames are logged and dropped here; see [`DecoderStats`] for
    /// how many were lost.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.push(chunk);
        let mut frames = Vec::new();
        while let Some(result) = self.next_frame() {
            if let Ok(frame) = result {
                frames.push(frame);
            }
        }
        frames
    }

    /// Bytes buffered towards the next frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
