//! Classification of captured bus frames into logical messages.
//!
//! Dispatch is purely by `(length, marker bytes)` and is evaluated in a
//! fixed order.  Anything that is not one of the well-known singletons and
//! carries the status/config type byte is a reassembly fragment.

use heapless::{String, Vec};

use super::frame::{CONTINUATION_INDEX, HEADER_LEN, MAX_FRAME_LEN, TYPE_INDEX, TYPE_STATUS_CONFIG};
use crate::error::{Error, Result};

const GO_LEN: usize = 15;
const HANDSHAKE_XML_LEN: usize = 33;
const CLOCK_LEN: usize = 22;
const CLOCK_MARKER: u8 = b'K';
const NOTIFICATION_LEN: usize = 77;
const NOTIFICATION_MARKER_INDEX: usize = 6;
const NOTIFICATION_MARKER: u8 = 0x0B;
const PROGRAM_LEN: usize = 18;
const PROGRAM_ID_INDEX: usize = 16;

/// Embedded file name occupies bytes `16..29`, NUL-terminated.
const XML_NAME_RANGE: core::ops::Range<usize> = 16..29;

/// First byte of the notification table and size of one entry.
pub const NOTIFICATION_TABLE_START: usize = 16;
pub const NOTIFICATION_ENTRY_LEN: usize = 6;
pub const NOTIFICATION_SLOTS: usize = 4;

/// Handshake file name, e.g. `inYT_S81.xml`.
pub type SchemaName = String<16>;

/// Which of the two schema files a handshake names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// `_C<n>`: configuration block layout.
    Config,
    /// `_S<n>`: status block layout.
    Status,
}

/// Schema kind and version parsed from a handshake file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaVersion {
    pub kind: SchemaKind,
    pub version: u8,
}

impl SchemaVersion {
    /// Find `_C<digits>` (preferred) or `_S<digits>` in `name`.
    ///
    /// Returns `None` when neither marker is present.  A marker without
    /// digits yields version 0.
    pub fn parse(name: &str) -> Option<Self> {
        let (kind, rest) = if let Some(i) = name.find("_C") {
            (SchemaKind::Config, &name[i + 2..])
        } else if let Some(i) = name.find("_S") {
            (SchemaKind::Status, &name[i + 2..])
        } else {
            return None;
        };
        let version = rest
            .bytes()
            .take_while(u8::is_ascii_digit)
            .fold(0u8, |acc, d| acc.saturating_mul(10).saturating_add(d - b'0'));
        Some(Self { kind, version })
    }
}

/// Controller clock as carried by the 22-byte sync frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSync {
    pub day: u8,
    pub month: u8,
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// One raw maintenance-reminder slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationEntry {
    pub id: u8,
    pub reset_day: u8,
    pub reset_month: u8,
    /// Two-digit year, 2000-based.
    pub reset_year: u8,
    pub interval_days: u16,
}

impl NotificationEntry {
    /// Slots with id 0 or interval 0 are unused.
    pub fn is_active(&self) -> bool {
        self.id != 0 && self.interval_days != 0
    }

    fn from_slot(b: &[u8]) -> Self {
        Self {
            id: b[0],
            reset_day: b[1],
            reset_month: b[2],
            reset_year: b[3],
            interval_days: u16::from_le_bytes([b[4], b[5]]),
        }
    }
}

/// A classified bus frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalMessage {
    GoKeepalive,
    HandshakeConfigXml {
        name: SchemaName,
        schema: Option<SchemaVersion>,
    },
    ClockSync(ClockSync),
    HandshakeComplete,
    Notification77 {
        entries: [NotificationEntry; NOTIFICATION_SLOTS],
    },
    ProgramStatus18 {
        program_id: u8,
    },
    Fragment {
        continuation: bool,
        payload: Vec<u8, MAX_FRAME_LEN>,
    },
    /// Short frame with no known meaning (bus ACKs and similar).
    ShortDiagnostic,
}

impl LogicalMessage {
    /// Classify one frame.
    ///
    /// Frames longer than a GO that match nothing fail with
    /// [`Error::UnrecognizedMessageShape`].
    pub fn classify(f: &[u8]) -> Result<Self> {
        let len = f.len();

        if len == GO_LEN && &f[13..15] == b"GO" {
            return Ok(Self::GoKeepalive);
        }
        if len == HANDSHAKE_XML_LEN {
            let name = xml_name(&f[XML_NAME_RANGE]);
            let schema = SchemaVersion::parse(&name);
            return Ok(Self::HandshakeConfigXml { name, schema });
        }
        if len == CLOCK_LEN && f[13] == CLOCK_MARKER {
            return Ok(Self::ClockSync(ClockSync {
                day: f[15],
                month: f[16],
                weekday: f[17],
                hour: f[18],
                minute: f[19],
                second: f[20],
            }));
        }
        if len == GO_LEN && &f[13..15] == b"LO" {
            return Ok(Self::HandshakeComplete);
        }
        if len == NOTIFICATION_LEN && f[NOTIFICATION_MARKER_INDEX] == NOTIFICATION_MARKER {
            let mut entries = [NotificationEntry::from_slot(&[0; NOTIFICATION_ENTRY_LEN]); NOTIFICATION_SLOTS];
            for (i, e) in entries.iter_mut().enumerate() {
                let at = NOTIFICATION_TABLE_START + i * NOTIFICATION_ENTRY_LEN;
                *e = NotificationEntry::from_slot(&f[at..at + NOTIFICATION_ENTRY_LEN]);
            }
            return Ok(Self::Notification77 { entries });
        }
        if len == PROGRAM_LEN {
            return Ok(Self::ProgramStatus18 {
                program_id: f[PROGRAM_ID_INDEX],
            });
        }
        // The whole 16-byte header is stripped, so a shorter frame carries no fragment payload.
        if len >= HEADER_LEN && f[TYPE_INDEX] == TYPE_STATUS_CONFIG {
            let payload = Vec::from_slice(&f[HEADER_LEN..]).map_err(|()| Error::ReassemblyOverflow)?;
            return Ok(Self::Fragment {
                continuation: f[CONTINUATION_INDEX] == 0x01,
                payload,
            });
        }
        if len <= GO_LEN {
            return Ok(Self::ShortDiagnostic);
        }
        Err(Error::UnrecognizedMessageShape { len })
    }
}

fn xml_name(field: &[u8]) -> SchemaName {
    let mut name = SchemaName::new();
    for &b in field.iter().take_while(|&&b| b != 0) {
        let c = if b.is_ascii_graphic() { b as char } else { '?' };
        // Field is 13 bytes; capacity is 16.
        let _ = name.push(c);
    }
    name
}
