//! Publish sinks.
//!
//! Publishing is fire-and-forget: a sink never reports failure back to the
//! frame path. Sinks that can lose records count them instead.

use std::io::Write;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::warn;

use crate::records::Publication;

/// Destination for emitted records
pub trait RecordSink {
    fn publish(&mut self, publication: Publication);
}

impl RecordSink for Vec<Publication> {
    fn publish(&mut self, publication: Publication) {
        self.push(publication);
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn publish(&mut self, publication: Publication) {
        (**self).publish(publication);
    }
}

/// Bounded channel towards a consumer thread
#[derive(Debug)]
pub struct ChannelSink {
    sender: Sender<Publication>,
    dropped: u64,
}

impl ChannelSink {
    /// Create the sink and the receiving end of its channel
    pub fn bounded(capacity: usize) -> (Self, Receiver<Publication>) {
        let (sender, receiver) = bounded(capacity);
        (Self { sender, dropped: 0 }, receiver)
    }

    /// Records lost to a full or disconnected channel
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl RecordSink for ChannelSink {
    fn publish(&mut self, publication: Publication) {
        match self.sender.try_send(publication) {
            Ok(()) => {}
            Err(TrySendError::Full(p)) => {
                self.dropped += 1;
                warn!("channel full, dropped {} record", p.topic());
            }
            Err(TrySendError::Disconnected(p)) => {
                self.dropped += 1;
                warn!("receiver gone, dropped {} record", p.topic());
            }
        }
    }
}

/// One JSON object per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
    failures: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failures: 0,
        }
    }

    /// Publications that could not be serialized or written
    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn publish(&mut self, publication: Publication) {
        let result = serde_json::to_writer(&mut self.writer, &publication)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"))
            .and_then(|()| self.writer.flush());
        if let Err(e) = result {
            self.failures += 1;
            warn!("failed to write {} record: {}", publication.topic(), e);
        }
    }
}
