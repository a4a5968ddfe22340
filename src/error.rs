//! Unified error type for the bridge.
//!
//! Every fallible step in the proxy and the decoder funnels into [`Error`].
//! None of these conditions is fatal: callers log the error, drop the
//! offending frame or command, and carry on with the next tick.
//! All variants are `Copy` so they can be passed around without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A transport line was not a valid envelope (bad prefix, odd hex
    /// length, non-hex character, or declared length mismatch).
    MalformedEnvelope,
    /// A bus frame matched no known `(length, marker)` shape.
    UnrecognizedMessageShape { len: usize },
    /// A command argument was outside its accepted range.  Nothing is sent.
    OutOfRangeCommand,
    /// A multi-part message grew past the reassembly capacity.
    ReassemblyOverflow,
    /// The trailing XOR byte of a received frame did not match.
    ChecksumMismatch { expected: u8, actual: u8 },
    /// A payload is too short for the field table being applied to it.
    PayloadTooShort { needed: usize, actual: usize },
    /// The byte-stream link to the peer failed.
    Link,
    /// A bus transaction failed.
    Bus,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedEnvelope => write!(f, "malformed envelope"),
            Self::UnrecognizedMessageShape { len } => {
                write!(f, "unrecognized message shape ({len} bytes)")
            }
            Self::OutOfRangeCommand => write!(f, "command argument out of range"),
            Self::ReassemblyOverflow => write!(f, "reassembly buffer overflow"),
            Self::ChecksumMismatch { expected, actual } => write!(
                f,
                "checksum mismatch (expected 0x{expected:02X}, got 0x{actual:02X})"
            ),
            Self::PayloadTooShort { needed, actual } => {
                write!(f, "payload too short (need {needed} bytes, got {actual})")
            }
            Self::Link => write!(f, "link I/O failed"),
            Self::Bus => write!(f, "bus transaction failed"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
