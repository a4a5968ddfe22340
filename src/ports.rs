//! Port traits: the boundary between the bridge logic and the outside world.
//!
//! ```text
//!   Link ◀──▶ SpaSession ──▶ StatusSink
//!   Link ◀──▶ TransportProxy ──▶ BusPort
//! ```
//!
//! Adapters (UART, bus peripheral, entity layer) implement these traits.
//! [`SpaSession`](crate::session::SpaSession) and
//! [`TransportProxy`](crate::proxy::TransportProxy) consume them via
//! generics passed at each call, so neither owns any hardware.

use log::warn;

use crate::error::{Error, Result};
use crate::protocol::envelope::ProxyEnvelope;
use crate::protocol::message::{ClockSync, SchemaKind};
use crate::session::config_block::DecodedConfig;
use crate::session::notification::DueNotification;
use crate::session::status::{DecodedStatus, StatusField};

// ───────────────────────────────────────────────────────────────
// Byte-stream link (proxy ◀──▶ decoder)
// ───────────────────────────────────────────────────────────────

/// Byte-oriented, non-blocking channel between the proxy and the decoder.
pub trait Link {
    /// Error type for this link.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes.  Returns 0 if nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Self::Error>;

    /// Write `data`.  Returns the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> core::result::Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> core::result::Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

/// Write a full envelope line and flush.
pub fn send_envelope(link: &mut impl Link, envelope: &ProxyEnvelope) -> Result<()> {
    let line = envelope.to_line();
    let mut rest = line.as_bytes();
    while !rest.is_empty() {
        match link.write(rest) {
            Ok(0) => {
                warn!("link: write stalled with {} bytes pending", rest.len());
                return Err(Error::Link);
            }
            Ok(n) => rest = &rest[n.min(rest.len())..],
            Err(e) => {
                warn!("link: write failed: {e:?}");
                return Err(Error::Link);
            }
        }
    }
    link.flush().map_err(|e| {
        warn!("link: flush failed: {e:?}");
        Error::Link
    })
}

// ───────────────────────────────────────────────────────────────
// Bus port (proxy ──▶ controller)
// ───────────────────────────────────────────────────────────────

/// Half-duplex bus transaction primitive on the proxy side.
///
/// Reception is not part of this trait: the bus receive callback feeds a
/// [`CaptureProducer`](crate::proxy::CaptureProducer) instead.
pub trait BusPort {
    type Error: core::fmt::Debug;

    /// Take the bus as initiator and write one complete frame
    /// (begin, write, end without releasing the bus).
    fn write_frame(&mut self, frame: &[u8]) -> core::result::Result<(), Self::Error>;

    /// Request the short acknowledgement that follows a write.
    /// Returns the number of bytes read into `buf`.
    fn read_ack(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Self::Error>;

    /// Re-arm as a listening peer at the emulated address.
    fn listen(&mut self) -> core::result::Result<(), Self::Error>;
}

// ───────────────────────────────────────────────────────────────
// Status sink (decoder ──▶ presentation layer)
// ───────────────────────────────────────────────────────────────

/// Downstream consumer of decoded state.
///
/// The session calls [`on_field`](Self::on_field) once per changed field
/// (or for every field on the first decode of a session), followed by one
/// [`on_status`](Self::on_status) with the full snapshot.  Methods other
/// than `on_field` and `on_status` default to no-ops so a sink only needs
/// to implement what it presents.
pub trait StatusSink {
    /// One semantic field changed.
    fn on_field(&mut self, field: &StatusField);

    /// A complete status snapshot was decoded and at least one field changed.
    fn on_status(&mut self, status: &DecodedStatus);

    /// A configuration block was decoded and differs from the last one.
    fn on_config(&mut self, _config: &DecodedConfig) {}

    /// An active maintenance reminder with its computed due date.
    fn on_notification(&mut self, _notification: &DueNotification) {}

    /// Controller link came up or went down.
    fn on_connection(&mut self, _connected: bool) {}

    /// The controller reported a different operating program.
    fn on_program(&mut self, _program_id: u8) {}

    /// Controller clock sync.
    fn on_clock(&mut self, _clock: &ClockSync) {}

    /// Schema file announced during the handshake.
    fn on_schema_file(&mut self, _kind: SchemaKind, _name: &str, _version: u8) {}
}
