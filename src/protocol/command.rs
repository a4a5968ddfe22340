//! Outbound command frames.
//!
//! Each family is a fixed header template with a handful of variable bytes
//! and a trailing XOR checksum.  Encoding is pure: the caller decides when
//! (and whether) the resulting bytes reach the bus.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use super::frame;
use crate::error::{Error, Result};

/// Encoded command, always short enough for one bus transaction.
pub type CommandFrame = Vec<u8, 32>;

/// Accepted set-point range in °C (inclusive).
pub const TEMP_MIN_C: f32 = 26.0;
pub const TEMP_MAX_C: f32 = 40.0;

/// Highest valid program id.
pub const PROGRAM_MAX: u8 = 4;

const ON_OFF_TEMPLATE: [u8; 20] = [
    0x17, 0x0A, 0x00, 0x00, 0x00, 0x17, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x46, 0x52,
    0x51, 0x01, 0x00, 0x00, 0x00,
];

const PROGRAM_TEMPLATE: [u8; 18] = [
    0x17, 0x0B, 0x00, 0x00, 0x00, 0x17, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x4E, 0x03,
    0xD0, 0x00, 0x00,
];

const SETPOINT_TEMPLATE: [u8; 21] = [
    0x17, 0x0A, 0x00, 0x00, 0x00, 0x17, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07, 0x46, 0x52,
    0x51, 0x00, 0x01, 0x00, 0x00, 0x00,
];

/// Function byte used by the single-byte set-point layout.
const LEGACY_TEMP_FUNCTION: u8 = 0x50;

// ── Targets ───────────────────────────────────────────────────

/// Device channel addressed by an on/off command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnOffTarget {
    Light,
    Circulation,
    /// Pump 1..=4.
    Pump(u8),
}

impl OnOffTarget {
    fn function_id(self) -> Result<u8> {
        match self {
            Self::Light => Ok(0x33),
            Self::Circulation => Ok(0x6B),
            Self::Pump(n @ 1..=4) => Ok(0x02 + n),
            Self::Pump(_) => Err(Error::OutOfRangeCommand),
        }
    }

    /// Pumps expect `0x02` for "on"; every other channel expects `0x01`.
    fn on_value(self) -> u8 {
        match self {
            Self::Pump(_) => 0x02,
            _ => 0x01,
        }
    }
}

/// Operating program names by id.
pub const PROGRAM_NAMES: [&str; 5] = ["Away", "Standard", "Energy", "Super Energy", "Weekend"];

/// Human name of a program id, if valid.
pub fn program_name(id: u8) -> Option<&'static str> {
    PROGRAM_NAMES.get(usize::from(id)).copied()
}

// ── Temperature encodings ─────────────────────────────────────

/// Layout of the set-point command.
///
/// Two layouts have been seen in the field and neither is confirmed by a
/// reference capture, so the choice is left to configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureEncoding {
    /// 20 bytes: on/off template, function `0x50`, low byte of the raw value at [18].
    LegacyByte,
    /// 21 bytes: raw value as a big-endian word at [18..20].
    WordSetpoint,
}

impl TemperatureEncoding {
    /// °C → raw device units (1/18 °C steps).  Rejects values outside
    /// [`TEMP_MIN_C`, `TEMP_MAX_C`] and NaN.
    pub fn encode_raw(celsius: f32) -> Result<u16> {
        if !(TEMP_MIN_C..=TEMP_MAX_C).contains(&celsius) {
            return Err(Error::OutOfRangeCommand);
        }
        Ok((celsius * 18.0).round() as u16)
    }

    /// Raw device units → °C.
    pub fn decode_raw(raw: u16) -> f32 {
        f32::from(raw) / 18.0
    }

    fn encode(self, celsius: f32) -> Result<CommandFrame> {
        let raw = Self::encode_raw(celsius)?;
        match self {
            Self::LegacyByte => {
                let mut cmd = ON_OFF_TEMPLATE;
                cmd[17] = LEGACY_TEMP_FUNCTION;
                cmd[18] = raw.to_be_bytes()[1];
                sealed(&mut cmd)
            }
            Self::WordSetpoint => {
                let mut cmd = SETPOINT_TEMPLATE;
                cmd[18..20].copy_from_slice(&raw.to_be_bytes());
                sealed(&mut cmd)
            }
        }
    }
}

// ── Commands ──────────────────────────────────────────────────

/// A typed outbound command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    OnOff { target: OnOffTarget, on: bool },
    Program(u8),
    Temperature { celsius: f32, encoding: TemperatureEncoding },
}

impl Command {
    /// Serialize to a sealed bus frame.
    ///
    /// Fails with [`Error::OutOfRangeCommand`] for an unknown pump, a
    /// program id above [`PROGRAM_MAX`], or a set-point outside
    /// [26.0, 40.0] °C.  On failure no bytes are produced.
    pub fn encode(&self) -> Result<CommandFrame> {
        match *self {
            Self::OnOff { target, on } => {
                let mut cmd = ON_OFF_TEMPLATE;
                cmd[17] = target.function_id()?;
                cmd[18] = if on { target.on_value() } else { 0x00 };
                sealed(&mut cmd)
            }
            Self::Program(id) => {
                if id > PROGRAM_MAX {
                    return Err(Error::OutOfRangeCommand);
                }
                let mut cmd = PROGRAM_TEMPLATE;
                cmd[16] = id;
                sealed(&mut cmd)
            }
            Self::Temperature { celsius, encoding } => encoding.encode(celsius),
        }
    }
}

fn sealed(cmd: &mut [u8]) -> Result<CommandFrame> {
    frame::seal(cmd);
    Vec::from_slice(cmd).map_err(|()| Error::OutOfRangeCommand)
}
