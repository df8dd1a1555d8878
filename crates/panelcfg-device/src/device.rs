use std::fmt;
use std::time::SystemTime;

use panelcfg_frame::{FrameConfig, FrameDecoder, FrameError, FrameWriter};
use panelcfg_transport::{pump, ByteSink, ByteSource};
use tracing::{debug, warn};

use crate::command::Command;
use crate::error::{DeviceError, Result};
use crate::message::{interpret, Message};

/// Handle returned by [`Device::subscribe`].
pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&Message, SystemTime) + Send>;

/// Device session behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Warn for every frame dropped on a bad checksum or length. Default: true.
    pub log_discarded_frames: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            log_discarded_frames: true,
        }
    }
}

/// Session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub commands_sent: u64,
    pub frames_decoded: u64,
    pub frames_discarded: u64,
    pub messages_dispatched: u64,
    pub interpreter_errors: u64,
}

/// One connection to the panel board.
///
/// Owns the outbound sink and the inbound reassembly buffer. Feed it every
/// chunk the transport delivers, in order, from a single caller; wrap it in a
/// `Mutex` to share it across threads.
pub struct Device<S> {
    writer: FrameWriter<S>,
    decoder: FrameDecoder,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
    messages_dispatched: u64,
    interpreter_errors: u64,
}

impl<S: ByteSink> Device<S> {
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, DeviceConfig::default())
    }

    pub fn with_config(sink: S, config: DeviceConfig) -> Self {
        let frame_config = FrameConfig {
            log_discarded_frames: config.log_discarded_frames,
        };
        Self {
            writer: FrameWriter::new(sink),
            decoder: FrameDecoder::with_config(frame_config),
            listeners: Vec::new(),
            next_subscription: 1,
            messages_dispatched: 0,
            interpreter_errors: 0,
        }
    }

    /// Frame and write one command. A refused write is not retried.
    pub fn send(&mut self, command: &Command) -> Result<()> {
        command.validate()?;
        match self.writer.write_frame(&command.to_frame()) {
            Ok(()) => {
                debug!(command = command.name(), "command sent");
                Ok(())
            }
            Err(FrameError::SinkRejected { .. }) => {
                warn!(command = command.name(), "transport refused command");
                Err(DeviceError::TransportWriteFailure)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Send several commands, stopping at the first failure.
    pub fn send_all<'a>(&mut self, commands: impl IntoIterator<Item = &'a Command>) -> Result<()> {
        for command in commands {
            self.send(command)?;
        }
        Ok(())
    }

    /// Feed a chunk and interpret every frame it completes.
    ///
    /// Corrupt frames are dropped inside the decoder and never show up here;
    /// unknown tags and malformed payloads come back as `Err` entries.
    pub fn receive(&mut self, chunk: &[u8]) -> Vec<Result<Message>> {
        let frames = self.decoder.feed(chunk);
        frames
            .iter()
            .map(|frame| {
                let result = interpret(frame);
                if let Err(err) = &result {
                    self.interpreter_errors = self.interpreter_errors.saturating_add(1);
                    debug!(tag = frame.tag, error = %err, "frame not interpreted");
                }
                result
            })
            .collect()
    }

    /// Transport-subscription entry point: decode `chunk` and hand each
    /// message to every listener.
    ///
    /// Returns the per-frame interpretation errors.
    pub fn on_chunk(&mut self, chunk: &[u8], timestamp: SystemTime) -> Vec<DeviceError> {
        let mut errors = Vec::new();
        for result in self.receive(chunk) {
            match result {
                Ok(message) => self.dispatch(&message, timestamp),
                Err(err) => errors.push(err),
            }
        }
        errors
    }

    /// Drive a byte source until it ends, dispatching as chunks arrive.
    ///
    /// Returns the interpretation errors collected along the way.
    pub fn run<B: ByteSource + ?Sized>(&mut self, source: &mut B) -> Result<Vec<DeviceError>> {
        let mut errors = Vec::new();
        pump(source, |chunk, timestamp| {
            errors.extend(self.on_chunk(chunk, timestamp));
        })?;
        Ok(errors)
    }

    /// Register a callback invoked once per valid message.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Message, SystemTime) + Send + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription = self.next_subscription.saturating_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Drop any partially received frame.
    pub fn reset(&mut self) {
        self.decoder.reset();
    }

    pub fn stats(&self) -> DeviceStats {
        let decoder = self.decoder.stats();
        DeviceStats {
            commands_sent: self.writer.frames_sent(),
            frames_decoded: decoder.frames_decoded,
            frames_discarded: decoder.frames_discarded,
            messages_dispatched: self.messages_dispatched,
            interpreter_errors: self.interpreter_errors,
        }
    }

    pub fn sink(&self) -> &S {
        self.writer.get_ref()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.writer.get_mut()
    }

    pub fn into_sink(self) -> S {
        self.writer.into_inner()
    }

    fn dispatch(&mut self, message: &Message, timestamp: SystemTime) {
        for (_, listener) in &mut self.listeners {
            listener(message, timestamp);
        }
        self.messages_dispatched = self.messages_dispatched.saturating_add(1);
    }
}

impl<S> fmt::Debug for Device<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("buffered", &self.decoder.buffered())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
