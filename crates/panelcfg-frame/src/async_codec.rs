//! `tokio_util::codec` adapter for async byte streams.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::codec::{build_command, decode_frame, Frame, FRAME_SIZE};
use crate::error::FrameError;

/// Fixed 64-byte frame codec for `FramedRead`/`FramedWrite`.
///
/// Corrupt frames are dropped and decoding continues with the next 64 bytes;
/// returning an error would terminate the stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedFrameCodec {
    discarded: u64,
}

impl FixedFrameCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames dropped for a bad checksum or length byte.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

impl Decoder for FixedFrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match decode_frame(src) {
                Ok(frame) => return Ok(frame),
                Err(err) if err.is_frame_local() => {
                    self.discarded = self.discarded.saturating_add(1);
                    warn!(error = %err, "discarding corrupt frame");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Encoder<Frame> for FixedFrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let wire = build_command(item.tag, &item.payload)?;
        dst.reserve(FRAME_SIZE);
        dst.put_slice(&wire);
        Ok(())
    }
}
