//! Multi-part message reassembly and canonical status length detection.
//!
//! Status and config blocks arrive as several bus frames.  Each fragment
//! loses its 16-byte header; the remainders are concatenated until a
//! fragment without the continuation flag closes the message.
//!
//! The length of a status-only message differs between firmware builds,
//! so it is learned from traffic: the first completed payload inside the
//! detection bracket whose byte 1 is zero becomes the canonical status
//! length, pinned for the rest of the session.

use heapless::Vec;
use log::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::error::{Error, Result};

/// Upper bound on a reassembled payload.
pub const REASSEMBLY_CAPACITY: usize = 512;

/// Byte that must precede a status suffix inside a combined payload.
const COMBINED_SPLIT_MARKER: u8 = 0x3B;

/// A complete logical payload.
pub type Payload = Vec<u8, REASSEMBLY_CAPACITY>;

/// What a completed payload contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadLayout {
    /// Exactly the canonical status length.
    StatusOnly,
    /// Config block followed by a status block.  `split` is the start of
    /// the status suffix, present only when the canonical length is known
    /// and both split markers validate.
    Combined { split: Option<usize> },
    /// Neither of the above.
    Unrecognized,
}

pub struct MessageReassembler {
    buf: Payload,
    discarding: bool,
    canonical_len: Option<usize>,
    status_bracket: (usize, usize),
    combined_bracket: (usize, usize),
}

impl MessageReassembler {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            buf: Vec::new(),
            discarding: false,
            canonical_len: None,
            status_bracket: (config.status_len_min, config.status_len_max),
            combined_bracket: (config.combined_len_min, config.combined_len_max),
        }
    }

    /// Append one de-headered fragment.
    ///
    /// Returns the finished payload on the terminal fragment.  On overflow
    /// the partial buffer is discarded, [`Error::ReassemblyOverflow`] is
    /// returned once, and further fragments are ignored until the next
    /// terminal one.
    pub fn push(&mut self, fragment: &[u8], continuation: bool) -> Result<Option<Payload>> {
        if self.discarding {
            if !continuation {
                self.discarding = false;
                debug!("reassembly: resynchronised after overflow");
            }
            return Ok(None);
        }

        if self.buf.extend_from_slice(fragment).is_err() {
            warn!(
                "reassembly: overflow ({} + {} bytes), discarding partial message",
                self.buf.len(),
                fragment.len()
            );
            self.buf.clear();
            self.discarding = continuation;
            return Err(Error::ReassemblyOverflow);
        }

        if continuation {
            debug!("reassembly: part of {} bytes, buffer now {}", fragment.len(), self.buf.len());
            return Ok(None);
        }

        let payload = core::mem::take(&mut self.buf);
        self.detect_canonical(&payload);
        Ok(Some(payload))
    }

    /// Classify a completed payload against the pinned canonical length.
    pub fn layout(&self, payload: &[u8]) -> PayloadLayout {
        let len = payload.len();
        if Some(len) == self.canonical_len && payload.get(1) == Some(&0x00) {
            return PayloadLayout::StatusOnly;
        }
        let (lo, hi) = self.combined_bracket;
        if (lo..=hi).contains(&len) {
            let split = self.canonical_len.and_then(|canonical| {
                let s = len.checked_sub(canonical)?;
                let ok = s >= 1
                    && payload.get(s - 1) == Some(&COMBINED_SPLIT_MARKER)
                    && payload.get(s + 1) == Some(&0x00);
                ok.then_some(s)
            });
            return PayloadLayout::Combined { split };
        }
        PayloadLayout::Unrecognized
    }

    pub fn canonical_len(&self) -> Option<usize> {
        self.canonical_len
    }

    /// Bytes currently held for an unfinished message.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    fn detect_canonical(&mut self, payload: &[u8]) {
        if self.canonical_len.is_some() {
            return;
        }
        let (lo, hi) = self.status_bracket;
        if (lo..=hi).contains(&payload.len()) && payload.get(1) == Some(&0x00) {
            info!("reassembly: {} bytes pinned as the status message length", payload.len());
            self.canonical_len = Some(payload.len());
        }
    }
}
