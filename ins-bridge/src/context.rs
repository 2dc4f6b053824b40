//! Session state for one device: decode, emit, publish.

use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use vectornav::{parse, DeviceFamily, FrameSync};

use crate::anchor::SharedAnchor;
use crate::config::BridgeConfig;
use crate::emitter::RecordEmitter;
use crate::records::Publication;
use crate::sink::RecordSink;

/// Session statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub frames_decoded: u64,
    pub frames_dropped: u64,
    pub bytes_skipped: u64,
    pub records_published: u64,
}

/// Clears the reference fix; usable from any thread
#[derive(Debug, Clone)]
pub struct ResetHandle {
    anchor: SharedAnchor,
}

impl ResetHandle {
    pub fn reset(&self) {
        self.anchor.reset();
    }
}

/// Frame-processing context for one connected device
pub struct NavContext<S: RecordSink> {
    emitter: RecordEmitter,
    family: DeviceFamily,
    anchor: SharedAnchor,
    sink: S,
    counters: Counters,
}

impl<S: RecordSink> NavContext<S> {
    pub fn new(config: &BridgeConfig, family: DeviceFamily, sink: S) -> Self {
        Self {
            emitter: RecordEmitter::new(config),
            family,
            anchor: SharedAnchor::new(),
            sink,
            counters: Counters::default(),
        }
    }

    pub fn reset_handle(&self) -> ResetHandle {
        ResetHandle {
            anchor: self.anchor.clone(),
        }
    }

    pub fn anchor(&self) -> &SharedAnchor {
        &self.anchor
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Decode one frame and publish its records.
    ///
    /// Returns the number of records published; a frame that fails to decode
    /// is logged and counted as dropped.
    pub fn handle_frame(&mut self, frame: &[u8], received_at: DateTime<Utc>) -> usize {
        let data = match parse(frame, self.family) {
            Ok(data) => data,
            Err(e) => {
                self.counters.frames_dropped += 1;
                warn!("dropping frame: {}", e);
                return 0;
            }
        };
        self.counters.frames_decoded += 1;

        let records = {
            let mut anchor = self.anchor.lock();
            self.emitter.emit(&data, &mut anchor)
        };
        debug!(
            "frame with {} fields produced {} records",
            data.present_fields().len(),
            records.len()
        );

        let count = records.len();
        let gps_tow = data.time_of_week();
        for record in records {
            self.sink.publish(Publication {
                received_at,
                gps_tow,
                record,
            });
        }
        self.counters.records_published += count as u64;
        count
    }

    /// Drive `reader` through frame synchronization until EOF or `stop`.
    ///
    /// Read timeouts and interruptions are retried; other I/O errors end the
    /// stream and are returned.
    pub fn run_stream<R: Read>(
        &mut self,
        mut reader: R,
        stop: &AtomicBool,
    ) -> std::io::Result<Counters> {
        let mut sync = FrameSync::new();
        let mut buf = [0u8; 4096];
        let skipped_before = self.counters.bytes_skipped;

        while !stop.load(Ordering::Relaxed) {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::TimedOut) => {
                    continue
                }
                Err(e) => {
                    warn!("stream read failed: {}", e);
                    return Err(e);
                }
            };
            for frame in sync.feed(&buf[..n]) {
                self.handle_frame(&frame, Utc::now());
            }
            self.counters.bytes_skipped = skipped_before + sync.skipped_bytes();
        }

        if sync.pending() > 0 {
            debug!("{} trailing bytes left unprocessed", sync.pending());
        }
        info!(
            "stream ended: {} frames decoded, {} dropped, {} bytes skipped",
            self.counters.frames_decoded, self.counters.frames_dropped, self.counters.bytes_skipped
        );
        Ok(self.counters)
    }
}
