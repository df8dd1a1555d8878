//! In-memory link: bytes written to the sink come back out of the source.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tracing::trace;

use crate::error::Result;
use crate::traits::{ByteSink, ByteSource, Chunk};

#[derive(Debug, Default)]
struct LoopbackState {
    queue: VecDeque<Bytes>,
    source_dropped: bool,
    fail_writes: bool,
}

fn lock(state: &Mutex<LoopbackState>) -> MutexGuard<'_, LoopbackState> {
    // A panicking test thread must not wedge the other half.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Create a connected sink/source pair.
pub fn loopback() -> (LoopbackSink, LoopbackSource) {
    let state = Arc::new(Mutex::new(LoopbackState::default()));
    (
        LoopbackSink {
            state: Arc::clone(&state),
        },
        LoopbackSource { state },
    )
}

/// Writing half of a [`loopback`] pair.
#[derive(Debug, Clone)]
pub struct LoopbackSink {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackSink {
    /// Make every subsequent write report failure (or stop doing so).
    pub fn fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// Inject bytes as if the remote end had sent them.
    pub fn inject(&self, bytes: impl Into<Bytes>) {
        lock(&self.state).queue.push_back(bytes.into());
    }
}

impl ByteSink for LoopbackSink {
    fn write(&mut self, bytes: &[u8]) -> bool {
        let mut state = lock(&self.state);
        if state.fail_writes || state.source_dropped {
            return false;
        }
        trace!(len = bytes.len(), "loopback write");
        state.queue.push_back(Bytes::copy_from_slice(bytes));
        true
    }
}

/// Reading half of a [`loopback`] pair.
///
/// Never blocks: once the queue is drained, `next_chunk` reports end of stream.
#[derive(Debug)]
pub struct LoopbackSource {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackSource {
    /// Number of chunks waiting to be read.
    pub fn pending(&self) -> usize {
        lock(&self.state).queue.len()
    }

    /// Drain every queued chunk into one contiguous buffer.
    pub fn drain_bytes(&mut self) -> Vec<u8> {
        let mut state = lock(&self.state);
        let mut out = Vec::new();
        for chunk in state.queue.drain(..) {
            out.extend_from_slice(&chunk);
        }
        out
    }
}

impl ByteSource for LoopbackSource {
    fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        Ok(lock(&self.state).queue.pop_front().map(Chunk::now))
    }
}

impl Drop for LoopbackSource {
    fn drop(&mut self) {
        lock(&self.state).source_dropped = true;
    }
}
