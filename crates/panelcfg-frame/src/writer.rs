use panelcfg_transport::ByteSink;
use tracing::debug;

use crate::codec::{build_command, Frame};
use crate::error::{FrameError, Result};
use crate::tags::tag_name;

/// Writes complete frames to any [`ByteSink`].
pub struct FrameWriter<S> {
    inner: S,
    frames_sent: u64,
}

impl<S: ByteSink> FrameWriter<S> {
    /// Create a new frame writer.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            frames_sent: 0,
        }
    }

    /// Write a complete frame.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.tag, frame.payload.as_ref())
    }

    /// Build a frame around `payload` and hand it to the sink in one write.
    ///
    /// A rejected write is reported as [`FrameError::SinkRejected`] and not
    /// retried.
    pub fn send(&mut self, tag: u8, payload: &[u8]) -> Result<()> {
        let wire = build_command(tag, payload)?;
        if !self.inner.write(&wire) {
            return Err(FrameError::SinkRejected { len: wire.len() });
        }
        self.frames_sent = self.frames_sent.saturating_add(1);
        debug!(tag = tag_name(tag), len = payload.len(), "frame sent");
        Ok(())
    }

    /// Frames accepted by the sink so far.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use panelcfg_transport::{loopback, IoSink};

    use super::*;
    use crate::codec::{decode_frame, FRAME_SIZE, MAX_PAYLOAD};
    use crate::reader::FrameReader;
    use crate::tags::{GET_CLOCK_CONFIG, NEXT_SCREEN, PUSH_ENCODER_CONFIG};

    #[test]
    fn write_single_frame() {
        let mut writer = FrameWriter::new(IoSink::new(Vec::<u8>::new()));
        writer.send(GET_CLOCK_CONFIG, &[]).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire.len(), FRAME_SIZE);
        let mut buf = BytesMut::from(wire.as_slice());
        let frame = decode_frame(&mut buf).unwrap().unwrap();
        assert_eq!(frame.tag, GET_CLOCK_CONFIG);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn write_multiple_frames() {
        let mut writer = FrameWriter::new(IoSink::new(Vec::<u8>::new()));
        writer.send(NEXT_SCREEN, &[]).unwrap();
        writer.send(PUSH_ENCODER_CONFIG, &[0x80, 0x10]).unwrap();
        writer.write_frame(&Frame::new(GET_CLOCK_CONFIG, "")).unwrap();
        assert_eq!(writer.frames_sent(), 3);

        let wire = writer.into_inner().into_inner();
        let mut buf = BytesMut::from(wire.as_slice());
        let f1 = decode_frame(&mut buf).unwrap().unwrap();
        let f2 = decode_frame(&mut buf).unwrap().unwrap();
        let f3 = decode_frame(&mut buf).unwrap().unwrap();

        assert_eq!(f1.tag, NEXT_SCREEN);
        assert_eq!(f2.tag, PUSH_ENCODER_CONFIG);
        assert_eq!(f2.payload.as_ref(), &[0x80, 0x10]);
        assert_eq!(f3.tag, GET_CLOCK_CONFIG);
    }

    #[test]
    fn payload_too_large_rejected() {
        let mut writer = FrameWriter::new(IoSink::new(Vec::<u8>::new()));
        let err = writer.send(PUSH_ENCODER_CONFIG, &[0u8; MAX_PAYLOAD + 1]).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(writer.get_ref().get_ref().is_empty());
    }

    #[test]
    fn rejected_write_is_reported() {
        let (sink, _source) = loopback();
        sink.fail_writes(true);
        let mut writer = FrameWriter::new(sink);

        let err = writer.send(NEXT_SCREEN, &[]).unwrap_err();
        assert!(matches!(err, FrameError::SinkRejected { len: FRAME_SIZE }));
        assert_eq!(writer.frames_sent(), 0);
    }

    #[test]
    fn written_frames_read_back() {
        let (sink, source) = loopback();
        let mut writer = FrameWriter::new(sink);
        writer.send(PUSH_ENCODER_CONFIG, &[0x00, 0x12]).unwrap();

        let mut reader = FrameReader::new(source);
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.tag, PUSH_ENCODER_CONFIG);
        assert_eq!(frame.payload.as_ref(), &[0x00, 0x12]);
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = FrameWriter::new(IoSink::new(Vec::<u8>::new()));

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }
}
