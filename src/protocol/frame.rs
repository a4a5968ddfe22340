//! Bus frame layout and the XOR checksum.
//!
//! Every framed bus message carries a 16-byte header followed by a
//! payload, and ends in a checksum byte:
//!
//! ```text
//!  [0]   [1]   [2..9]  [9]   [10..14]  [14..16]  [16..n-1]  [n-1]
//! ┌─────┬─────┬───────┬──────┬─────────┬─────────┬──────────┬─────┐
//! │0x17 │type │ addr  │ cont │ ...     │ marker  │ payload  │ xor │
//! └─────┴─────┴───────┴──────┴─────────┴─────────┴──────────┴─────┘
//! ```
//!
//! The checksum is the XOR of every byte except the last.

use heapless::Vec;

use crate::error::{Error, Result};

/// Largest frame a single bus transaction can carry.
pub const MAX_FRAME_LEN: usize = 128;

/// Header stripped from each multi-part fragment, frame marker included.
pub const HEADER_LEN: usize = 16;

/// Index of the type byte.
pub const TYPE_INDEX: usize = 1;

/// Type byte of config/status fragments.
pub const TYPE_STATUS_CONFIG: u8 = 0x09;

/// Index of the "more fragments follow" flag.
pub const CONTINUATION_INDEX: usize = 9;

/// Frames shorter than this carry no checksum worth verifying
/// (the 2-byte bus ACK is the usual example).
pub const MIN_CHECKED_LEN: usize = 15;

/// One frame as captured from, or written to, the bus.
pub type RawFrame = Vec<u8, MAX_FRAME_LEN>;

/// XOR of every byte except the last one.
///
/// For a frame whose last byte already holds the checksum, XOR over the
/// whole frame is therefore zero.
pub fn checksum(frame: &[u8]) -> u8 {
    match frame.split_last() {
        Some((_, body)) => body.iter().fold(0, |acc, b| acc ^ b),
        None => 0,
    }
}

/// Overwrite the last byte with the checksum of the bytes before it.
pub fn seal(frame: &mut [u8]) {
    let sum = checksum(frame);
    if let Some(last) = frame.last_mut() {
        *last = sum;
    }
}

/// Check the trailing XOR byte.  Short frames pass unchecked.
pub fn verify(frame: &[u8]) -> Result<()> {
    if frame.len() < MIN_CHECKED_LEN {
        return Ok(());
    }
    let expected = checksum(frame);
    let actual = frame[frame.len() - 1];
    if expected == actual {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch { expected, actual })
    }
}

/// Copy a byte slice into a [`RawFrame`], rejecting anything too long.
pub fn raw_frame(bytes: &[u8]) -> Result<RawFrame> {
    Vec::from_slice(bytes).map_err(|()| Error::MalformedEnvelope)
}
