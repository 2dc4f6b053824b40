//! Frame synchronization on a continuous byte stream
//!
//! The serial link delivers bytes in arbitrary chunks, interleaved with
//! ASCII command responses and the occasional corrupted frame. [`FrameSync`]
//! buffers the stream, locks onto the sync byte, sizes the candidate frame
//! from its header, and only releases frames whose CRC checks out. On a bad
//! candidate it slides forward one byte and searches again.

use tracing::{debug, trace};

use crate::checksum::verify_crc;
use crate::groups::SYNC_BYTE;
use crate::parser::{FrameHeader, ParseError};

/// Largest frame the decoder will wait for before giving up on a candidate
pub const MAX_FRAME_LEN: usize = 600;

/// Streaming frame extractor
#[derive(Debug, Default)]
pub struct FrameSync {
    buffer: Vec<u8>,
    frames: u64,
    skipped_bytes: u64,
}

impl FrameSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append newly received bytes
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of frames released so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Number of bytes discarded while searching for frames
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped_bytes
    }

    /// Bytes buffered but not yet consumed
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn skip(&mut self, count: usize) {
        let count = count.min(self.buffer.len());
        self.buffer.drain(..count);
        self.skipped_bytes += count as u64;
    }

    /// Extract the next CRC-valid frame, if a complete one is buffered.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        loop {
            let Some(start) = self.buffer.iter().position(|&b| b == SYNC_BYTE) else {
                let count = self.buffer.len();
                self.skip(count);
                return None;
            };
            if start > 0 {
                trace!("skipping {} bytes before sync", start);
                self.skip(start);
            }

            match FrameHeader::parse(&self.buffer) {
                Ok(header) => {
                    let len = header.frame_len();
                    if len > MAX_FRAME_LEN {
                        debug!("candidate frame of {} bytes rejected", len);
                        self.skip(1);
                        continue;
                    }
                    if self.buffer.len() < len {
                        return None;
                    }
                    if verify_crc(&self.buffer[..len]) {
                        self.frames += 1;
                        return Some(self.buffer.drain(..len).collect());
                    }
                    debug!("CRC mismatch on {} byte candidate, resyncing", len);
                    self.skip(1);
                }
                Err(ParseError::TooShort { .. }) => return None,
                Err(e) => {
                    trace!("false sync: {}", e);
                    self.skip(1);
                }
            }
        }
    }

    /// Push `bytes` and drain every frame that became complete
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.push(bytes);
        std::iter::from_fn(|| self.next_frame()).collect()
    }
}
