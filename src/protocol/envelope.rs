//! Line envelope spoken between the proxy and the decoder.
//!
//! Wire format (every record is one `\n`-terminated ASCII line):
//! ```text
//! RX:<len>:<HEX>     frame captured off the bus (proxy → decoder)
//! TX:<HEX>           frame to transmit on the bus (decoder → proxy)
//! TX:OK              proxy acknowledges a relayed TX
//! READY              proxy finished start-up
//! I2C_PROXY:V<n>     proxy version token
//! PING / PONG        link probe and its answer
//! ```
//!
//! [`LineDecoder`] accumulates raw bytes from the link and yields complete
//! lines.  A single `Link::read` may return part of a line, or several.

use core::fmt::Write as _;

use heapless::String;
use serde::{Deserialize, Serialize};

use super::frame::{self, MAX_FRAME_LEN, RawFrame};
use crate::error::{Error, Result};

/// Version token announced by the proxy at start-up.
pub const PROXY_VERSION: &str = "I2C_PROXY:V1";

const VERSION_PREFIX: &str = "I2C_PROXY:";

/// Longest line either side ever produces: `RX:128:` plus 256 hex digits.
pub const MAX_LINE_LEN: usize = 8 + MAX_FRAME_LEN * 2;

/// How invalid hex digits are treated when decoding an `RX:`/`TX:` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HexMode {
    /// Odd length or any non-hex digit rejects the line.
    Strict,
    /// A non-hex digit decodes as nibble 0.  Length must still be even.
    Lenient,
}

/// One parsed line of the proxy link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyEnvelope {
    Rx(RawFrame),
    Tx(RawFrame),
    TxOk,
    Ready,
    Ping,
    Pong,
    Version(String<32>),
}

impl ProxyEnvelope {
    /// Parse one line (without its terminator).
    pub fn parse(line: &str, mode: HexMode) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        match line {
            "READY" => return Ok(Self::Ready),
            "PING" => return Ok(Self::Ping),
            "PONG" => return Ok(Self::Pong),
            "TX:OK" => return Ok(Self::TxOk),
            _ => {}
        }

        if let Some(rest) = line.strip_prefix("RX:") {
            let (len, hex) = rest.split_once(':').ok_or(Error::MalformedEnvelope)?;
            let len: usize = len.parse().map_err(|_| Error::MalformedEnvelope)?;
            let frame = decode_hex(hex, mode)?;
            if frame.len() != len {
                return Err(Error::MalformedEnvelope);
            }
            return Ok(Self::Rx(frame));
        }

        if let Some(hex) = line.strip_prefix("TX:") {
            return decode_hex(hex, mode).map(Self::Tx);
        }

        if line.starts_with(VERSION_PREFIX) {
            let token = String::try_from(line).map_err(|()| Error::MalformedEnvelope)?;
            return Ok(Self::Version(token));
        }

        Err(Error::MalformedEnvelope)
    }

    /// Render the envelope as a newline-terminated line.
    pub fn to_line(&self) -> String<MAX_LINE_LEN> {
        let mut out = String::new();
        // Capacity covers the longest possible record, so writes cannot fail.
        let _ = match self {
            Self::Rx(f) => write!(out, "RX:{}:", f.len()).and_then(|()| push_hex(&mut out, f)),
            Self::Tx(f) => out.write_str("TX:").and_then(|()| push_hex(&mut out, f)),
            Self::TxOk => out.write_str("TX:OK"),
            Self::Ready => out.write_str("READY"),
            Self::Ping => out.write_str("PING"),
            Self::Pong => out.write_str("PONG"),
            Self::Version(v) => out.write_str(v),
        };
        let _ = out.push('\n');
        out
    }
}

/// Decode a hex body into a frame.
pub fn decode_hex(text: &str, mode: HexMode) -> Result<RawFrame> {
    if text.len() % 2 != 0 || text.len() > MAX_FRAME_LEN * 2 {
        return Err(Error::MalformedEnvelope);
    }
    let n = text.len() / 2;
    let mut buf = [0u8; MAX_FRAME_LEN];
    match mode {
        HexMode::Strict => {
            hex::decode_to_slice(text, &mut buf[..n]).map_err(|_| Error::MalformedEnvelope)?;
        }
        HexMode::Lenient => {
            for (dst, pair) in buf.iter_mut().zip(text.as_bytes().chunks_exact(2)) {
                *dst = (nibble(pair[0]) << 4) | nibble(pair[1]);
            }
        }
    }
    frame::raw_frame(&buf[..n])
}

fn nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'A'..=b'F' => c - b'A' + 10,
        b'a'..=b'f' => c - b'a' + 10,
        _ => 0,
    }
}

/// Append `bytes` as uppercase hex, no separators.
fn push_hex<const N: usize>(out: &mut String<N>, bytes: &[u8]) -> core::fmt::Result {
    let mut buf = [0u8; MAX_FRAME_LEN * 2];
    let text = buf.get_mut(..bytes.len() * 2).ok_or(core::fmt::Error)?;
    hex::encode_to_slice(bytes, text).map_err(|_| core::fmt::Error)?;
    text.make_ascii_uppercase();
    let text = core::str::from_utf8(text).map_err(|_| core::fmt::Error)?;
    out.push_str(text).map_err(|()| core::fmt::Error)
}

// ── Line decoder ──────────────────────────────────────────────

/// Splits a byte stream into lines with a fixed-capacity buffer.
///
/// `\n` and `\r` both terminate a line; empty lines are skipped.  A line
/// that outgrows the buffer is discarded up to its terminator.
pub struct LineDecoder<const N: usize> {
    buf: String<N>,
    overflowed: bool,
}

impl<const N: usize> LineDecoder<N> {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            overflowed: false,
        }
    }

    /// Feed bytes and invoke `on_line` for every completed line.
    pub fn feed(&mut self, data: &[u8], mut on_line: impl FnMut(&str)) {
        for &b in data {
            if let Some(line) = self.push(b) {
                on_line(&line);
            }
        }
    }

    /// Feed one byte.  Returns the line it completed, if any.
    pub fn push(&mut self, b: u8) -> Option<String<N>> {
        if b == b'\n' || b == b'\r' {
            if self.overflowed {
                log::warn!("link: dropped over-long line");
                self.overflowed = false;
                return None;
            }
            if self.buf.is_empty() {
                return None;
            }
            return Some(core::mem::take(&mut self.buf));
        }
        if self.overflowed {
            return None;
        }
        // Non-ASCII bytes cannot belong to any envelope.
        let c = if b.is_ascii() { b as char } else { '?' };
        if self.buf.push(c).is_err() {
            self.overflowed = true;
            self.buf.clear();
        }
        None
    }

    /// Discard any partial line (e.g. after the peer was reset).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }
}

impl<const N: usize> Default for LineDecoder<N> {
    fn default() -> Self {
        Self::new()
    }
}
