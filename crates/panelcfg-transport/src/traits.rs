use std::io::{ErrorKind, Read, Write};
use std::time::SystemTime;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{Result, TransportError};

const DEFAULT_CHUNK_SIZE: usize = 256;

/// Outbound half of a link.
///
/// Mirrors the host serial API: a write either lands completely or the
/// call reports `false`. There is no partial-write signal and no retry.
pub trait ByteSink {
    /// Write the whole buffer. Returns `true` on success.
    fn write(&mut self, bytes: &[u8]) -> bool;
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write(&mut self, bytes: &[u8]) -> bool {
        (**self).write(bytes)
    }
}

impl<S: ByteSink + ?Sized> ByteSink for Box<S> {
    fn write(&mut self, bytes: &[u8]) -> bool {
        (**self).write(bytes)
    }
}

/// A raw chunk delivered by a [`ByteSource`].
///
/// Chunk boundaries carry no meaning; a chunk may hold part of a frame,
/// several frames, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub bytes: Bytes,
    pub timestamp: SystemTime,
}

impl Chunk {
    /// Create a chunk stamped with the current time.
    pub fn now(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            timestamp: SystemTime::now(),
        }
    }
}

/// Inbound half of a link. Chunks arrive in order, one at a time.
pub trait ByteSource {
    /// Next chunk, or `Ok(None)` once the stream has ended.
    fn next_chunk(&mut self) -> Result<Option<Chunk>>;
}

/// Drive a source into a callback until the stream ends.
///
/// This is the subscription primitive: `on_chunk` sees `(bytes, timestamp)`
/// for every chunk, in arrival order. Returns the number of chunks delivered.
pub fn pump<S, F>(source: &mut S, mut on_chunk: F) -> Result<usize>
where
    S: ByteSource + ?Sized,
    F: FnMut(&[u8], SystemTime),
{
    let mut delivered = 0usize;
    while let Some(chunk) = source.next_chunk()? {
        on_chunk(chunk.bytes.as_ref(), chunk.timestamp);
        delivered = delivered.saturating_add(1);
    }
    debug!(delivered, "byte source ended");
    Ok(delivered)
}

/// [`ByteSink`] over any `Write` stream.
pub struct IoSink<W> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(std::io::Error::from(ErrorKind::WriteZero)),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(err),
            }
        }
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

impl<W: Write> ByteSink for IoSink<W> {
    fn write(&mut self, bytes: &[u8]) -> bool {
        match self.write_all(bytes) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, len = bytes.len(), "write to byte sink failed");
                false
            }
        }
    }
}

/// [`ByteSource`] over any `Read` stream.
pub struct IoSource<R> {
    inner: R,
    chunk_size: usize,
}

impl<R: Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, DEFAULT_CHUNK_SIZE)
    }

    /// Read at most `chunk_size` bytes per delivered chunk.
    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        Self {
            inner,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for IoSource<R> {
    fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(Some(Chunk::now(buf)));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}
