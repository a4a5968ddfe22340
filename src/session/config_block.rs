//! Configuration block decoding.
//!
//! The config block leads a combined config+status payload.  Its fields
//! are numbered from the start of the block and sit two bytes further into
//! the payload than their published offset.

use log::info;

use super::status::Temperature;
use crate::error::{Error, Result};

/// Payload index of published config offset 0.
pub const CONFIG_BIAS: usize = 2;

const CONFIG_NUMBER: usize = 0;
const SETPOINT: usize = 1;
const FILTER_FREQUENCY: usize = 3;
const TEMP_UNITS: usize = 33;
const TIME_FORMAT: usize = 34;
const PUMP_TIMEOUT: usize = 54;
const LIGHT_TIMEOUT: usize = 55;
const ECONOMY_TYPE: usize = 70;
const CUSTOMER_ID: usize = 111;
const ZONES: usize = 127;
const SILENT_MODE: usize = 157;

/// Smallest config block every field fits in.
pub const MIN_CONFIG_LEN: usize = CONFIG_BIAS + SILENT_MODE + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempUnit {
    Fahrenheit,
    Celsius,
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    NotSet,
    AmPm,
    H24,
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EconomyType {
    Standard,
    Night,
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilentMode {
    NotSet,
    Off,
    Economy,
    Sleep,
    Night,
    Unknown(u8),
}

impl From<u8> for TempUnit {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Fahrenheit,
            1 => Self::Celsius,
            other => Self::Unknown(other),
        }
    }
}

impl From<u8> for TimeFormat {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::NotSet,
            1 => Self::AmPm,
            2 => Self::H24,
            other => Self::Unknown(other),
        }
    }
}

impl From<u8> for EconomyType {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Standard,
            1 => Self::Night,
            other => Self::Unknown(other),
        }
    }
}

impl From<u8> for SilentMode {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::NotSet,
            1 => Self::Off,
            2 => Self::Economy,
            3 => Self::Sleep,
            4 => Self::Night,
            other => Self::Unknown(other),
        }
    }
}

/// One decoded configuration block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedConfig {
    pub config_number: u8,
    pub setpoint: Temperature,
    pub filter_frequency: u8,
    pub temp_unit: TempUnit,
    pub time_format: TimeFormat,
    pub pump_timeout_min: u8,
    pub light_timeout_min: u8,
    pub economy: EconomyType,
    pub customer_id: u8,
    pub zones: u8,
    pub silent_mode: SilentMode,
}

impl DecodedConfig {
    pub fn decode(block: &[u8]) -> Result<Self> {
        if block.len() < MIN_CONFIG_LEN {
            return Err(Error::PayloadTooShort {
                needed: MIN_CONFIG_LEN,
                actual: block.len(),
            });
        }
        let at = |n: usize| block[CONFIG_BIAS + n];
        Ok(Self {
            config_number: at(CONFIG_NUMBER),
            setpoint: Temperature::from_raw(u16::from_be_bytes([at(SETPOINT), at(SETPOINT + 1)])),
            filter_frequency: at(FILTER_FREQUENCY),
            temp_unit: at(TEMP_UNITS).into(),
            time_format: at(TIME_FORMAT).into(),
            pump_timeout_min: at(PUMP_TIMEOUT),
            light_timeout_min: at(LIGHT_TIMEOUT),
            economy: at(ECONOMY_TYPE).into(),
            customer_id: at(CUSTOMER_ID),
            zones: at(ZONES),
            silent_mode: at(SILENT_MODE).into(),
        })
    }
}

/// Decodes config blocks and reports only those that differ from the last.
#[derive(Default)]
pub struct ConfigDecoder {
    previous: Option<DecodedConfig>,
}

impl ConfigDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some` when the block decoded and differs from the previous one.
    pub fn decode(&mut self, block: &[u8]) -> Result<Option<DecodedConfig>> {
        let config = DecodedConfig::decode(block)?;
        if self.previous == Some(config) {
            return Ok(None);
        }
        info!(
            "config: #{} setpoint={} units={:?} filter={} pump_to={}min light_to={}min \
             econ={:?} customer={} zones={} silent={:?}",
            config.config_number,
            config.setpoint,
            config.temp_unit,
            config.filter_frequency,
            config.pump_timeout_min,
            config.light_timeout_min,
            config.economy,
            config.customer_id,
            config.zones,
            config.silent_mode,
        );
        self.previous = Some(config);
        Ok(Some(config))
    }
}
