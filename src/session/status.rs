//! Status block decoding.
//!
//! Field positions are published in an external numbering scheme that
//! sits 254 above the index in the reassembled payload.  Two layouts
//! exist: firmware whose status schema is ≤ 50 uses the legacy table,
//! everything newer uses the current one.
//!
//! Packed fields:
//! ```text
//!  pump / demand byte     device status byte
//!  ┌──┬──┬──┬──┐          bit 1  blower
//!  │P4│P3│P2│P1│          bit 2  circulation
//!  └──┴──┴──┴──┘          bit 5  heater
//!   7-6 5-4 3-2 1-0        bit 7  waterfall
//! ```

use heapless::Vec;
use log::{info, warn};

use crate::error::{Error, Result};

/// External offset of payload byte 0.
pub const STATUS_BIAS: u16 = 254;

// ───────────────────────────────────────────────────────────────
// Offset tables
// ───────────────────────────────────────────────────────────────

/// External offsets of every decoded status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetTable {
    pub name: &'static str,
    pub hours: u16,
    pub quiet_state: u16,
    pub user_demand_pumps: u16,
    pub device_status: u16,
    pub pumps: u16,
    pub user_demand_light: u16,
    pub real_setpoint: u16,
    pub displayed_temp: u16,
    pub lock_mode: u16,
    pub pack_type: u16,
    pub pump_timer: u16,
}

impl OffsetTable {
    /// Status schema 51 and later.
    pub const CURRENT: Self = Self {
        name: "v51+",
        hours: 256,
        quiet_state: 257,
        user_demand_pumps: 259,
        device_status: 260,
        pumps: 261,
        user_demand_light: 307,
        real_setpoint: 275,
        displayed_temp: 277,
        lock_mode: 310,
        pack_type: 289,
        pump_timer: 303,
    };

    /// Status schema 50 and earlier.
    pub const LEGACY: Self = Self {
        name: "v50",
        hours: 284,
        quiet_state: 285,
        user_demand_pumps: 258,
        device_status: 259,
        pumps: 260,
        user_demand_light: 307,
        real_setpoint: 274,
        displayed_temp: 276,
        lock_mode: 309,
        pack_type: 288,
        pump_timer: 302,
    };

    pub fn for_schema(version: u8, legacy_max: u8) -> &'static Self {
        if version <= legacy_max {
            &Self::LEGACY
        } else {
            &Self::CURRENT
        }
    }

    /// Smallest payload every offset (and both temperature words) fits in.
    pub fn min_payload_len(&self) -> usize {
        let single = [
            self.hours,
            self.quiet_state,
            self.user_demand_pumps,
            self.device_status,
            self.pumps,
            self.user_demand_light,
            self.lock_mode,
            self.pack_type,
            self.pump_timer,
        ];
        let words = [self.real_setpoint + 1, self.displayed_temp + 1];
        let max = single.into_iter().chain(words).max().unwrap_or(STATUS_BIAS);
        usize::from(max - STATUS_BIAS) + 1
    }
}

fn idx(offset: u16) -> usize {
    usize::from(offset - STATUS_BIAS)
}

// ───────────────────────────────────────────────────────────────
// Field enums
// ───────────────────────────────────────────────────────────────

/// Split one byte into its four 2-bit slots, lowest bits first.
pub fn unpack_quad(byte: u8) -> [u8; 4] {
    [0, 2, 4, 6].map(|shift| (byte >> shift) & 0b11)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Off,
    High,
    Low,
    Unknown,
}

impl From<u8> for PumpState {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Off,
            1 => Self::High,
            2 => Self::Low,
            _ => Self::Unknown,
        }
    }
}

impl PumpState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::High => "HIGH",
            Self::Low => "LOW",
            Self::Unknown => "?",
        }
    }
}

/// Requested (not actual) pump level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDemand {
    Off,
    Low,
    High,
    Reserved,
}

impl From<u8> for UserDemand {
    fn from(v: u8) -> Self {
        match v & 0b11 {
            0 => Self::Off,
            1 => Self::Low,
            2 => Self::High,
            _ => Self::Reserved,
        }
    }
}

impl UserDemand {
    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Low => "LO",
            Self::High => "HI",
            Self::Reserved => "?",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuietState {
    NotSet,
    Drain,
    Soak,
    Off,
    Unknown(u8),
}

impl From<u8> for QuietState {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::NotSet,
            1 => Self::Drain,
            2 => Self::Soak,
            3 => Self::Off,
            other => Self::Unknown(other),
        }
    }
}

impl QuietState {
    pub fn name(self) -> &'static str {
        match self {
            Self::NotSet => "NOT_SET",
            Self::Drain => "DRAIN",
            Self::Soak => "SOAK",
            Self::Off => "OFF",
            Self::Unknown(_) => "?",
        }
    }
}

/// Keypad lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Unlock,
    Partial,
    Full,
    Unknown(u8),
}

impl From<u8> for LockMode {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Unlock,
            1 => Self::Partial,
            2 => Self::Full,
            other => Self::Unknown(other),
        }
    }
}

impl LockMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Unlock => "UNLOCK",
            Self::Partial => "PARTIAL",
            Self::Full => "FULL",
            Self::Unknown(_) => "?",
        }
    }
}

/// Controller pack model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackType {
    Unspecified,
    InXe,
    MasIbc,
    Mia,
    Djs4,
    InClear,
    InXm,
    K600,
    InTerface,
    InTouch,
    InYt,
    Unknown(u8),
}

impl From<u8> for PackType {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Unspecified,
            1 => Self::InXe,
            2 => Self::MasIbc,
            3 => Self::Mia,
            4 => Self::Djs4,
            5 => Self::InClear,
            6 => Self::InXm,
            7 => Self::K600,
            8 => Self::InTerface,
            9 => Self::InTouch,
            10 => Self::InYt,
            other => Self::Unknown(other),
        }
    }
}

impl PackType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Unspecified => "Unknown",
            Self::InXe => "inXE",
            Self::MasIbc => "MasIBC",
            Self::Mia => "MIA",
            Self::Djs4 => "DJS4",
            Self::InClear => "inClear",
            Self::InXm => "inXM",
            Self::K600 => "K600",
            Self::InTerface => "inTerface",
            Self::InTouch => "inTouch",
            Self::InYt => "inYT",
            Self::Unknown(_) => "?",
        }
    }
}

/// Temperature at 0.1 °C resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Temperature {
    pub deci_celsius: u16,
}

impl Temperature {
    /// From a raw device word (1/18 °C steps), rounded to the nearest tenth.
    pub fn from_raw(raw: u16) -> Self {
        let deci = (u32::from(raw) * 10 + 9) / 18;
        Self {
            deci_celsius: deci as u16,
        }
    }

    pub fn celsius(self) -> f32 {
        f32::from(self.deci_celsius) / 10.0
    }
}

impl core::fmt::Display for Temperature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.deci_celsius / 10, self.deci_celsius % 10)
    }
}

// ───────────────────────────────────────────────────────────────
// Snapshot and changes
// ───────────────────────────────────────────────────────────────

/// One decoded status block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedStatus {
    pub pumps: [PumpState; 4],
    pub pump_demand: [UserDemand; 4],
    pub light: bool,
    pub circulation: bool,
    pub blower: bool,
    pub heater: bool,
    pub waterfall: bool,
    /// Quiet state OFF means the spa is in standby.
    pub standby: bool,
    pub quiet_state: QuietState,
    pub lock_mode: LockMode,
    pub pack_type: PackType,
    pub pump_timer_min: u8,
    pub hours: u8,
    /// `None` when the controller sent both temperature words as zero.
    pub target_temp: Option<Temperature>,
    pub actual_temp: Option<Temperature>,
}

impl DecodedStatus {
    pub fn decode(payload: &[u8], table: &OffsetTable) -> Result<Self> {
        let needed = table.min_payload_len();
        if payload.len() < needed {
            return Err(Error::PayloadTooShort {
                needed,
                actual: payload.len(),
            });
        }
        let byte = |offset: u16| payload[idx(offset)];
        let word = |offset: u16| u16::from_be_bytes([byte(offset), byte(offset + 1)]);

        let device = byte(table.device_status);
        let bit = |n: u8| device & (1 << n) != 0;
        let quiet_state = QuietState::from(byte(table.quiet_state));
        let target_raw = word(table.real_setpoint);
        let actual_raw = word(table.displayed_temp);
        let temps_valid = target_raw != 0 || actual_raw != 0;

        Ok(Self {
            pumps: unpack_quad(byte(table.pumps)).map(PumpState::from),
            pump_demand: unpack_quad(byte(table.user_demand_pumps)).map(UserDemand::from),
            light: byte(table.user_demand_light) != 0,
            circulation: bit(2),
            blower: bit(1),
            heater: bit(5),
            waterfall: bit(7),
            standby: quiet_state == QuietState::Off,
            quiet_state,
            lock_mode: LockMode::from(byte(table.lock_mode)),
            pack_type: PackType::from(byte(table.pack_type)),
            pump_timer_min: byte(table.pump_timer),
            hours: byte(table.hours),
            target_temp: temps_valid.then(|| Temperature::from_raw(target_raw)),
            actual_temp: temps_valid.then(|| Temperature::from_raw(actual_raw)),
        })
    }

    /// Fields that differ from `prev`, or every field when there is no
    /// baseline yet.  Temperatures are reported as one pair and skipped
    /// while unknown.
    pub fn changes(&self, prev: Option<&DecodedStatus>) -> Vec<StatusField, MAX_FIELDS> {
        let mut out = Vec::new();
        let mut emit = |changed: bool, field: StatusField| {
            if changed {
                // Capacity equals the number of fields.
                let _ = out.push(field);
            }
        };
        let differs = |f: fn(&DecodedStatus) -> StatusField| match prev {
            Some(p) => f(p) != f(self),
            None => true,
        };

        for i in 0..4u8 {
            let n = usize::from(i);
            let pump_changed = prev.is_none_or(|p| p.pumps[n] != self.pumps[n]);
            emit(pump_changed, StatusField::Pump { index: i + 1, state: self.pumps[n] });
            let demand_changed = prev.is_none_or(|p| p.pump_demand[n] != self.pump_demand[n]);
            emit(
                demand_changed,
                StatusField::PumpDemand { index: i + 1, demand: self.pump_demand[n] },
            );
        }
        emit(differs(|s| StatusField::Light(s.light)), StatusField::Light(self.light));
        emit(
            differs(|s| StatusField::Circulation(s.circulation)),
            StatusField::Circulation(self.circulation),
        );
        emit(differs(|s| StatusField::Blower(s.blower)), StatusField::Blower(self.blower));
        emit(differs(|s| StatusField::Heater(s.heater)), StatusField::Heater(self.heater));
        emit(
            differs(|s| StatusField::Waterfall(s.waterfall)),
            StatusField::Waterfall(self.waterfall),
        );
        emit(differs(|s| StatusField::Standby(s.standby)), StatusField::Standby(self.standby));
        emit(
            differs(|s| StatusField::QuietState(s.quiet_state)),
            StatusField::QuietState(self.quiet_state),
        );
        emit(
            differs(|s| StatusField::LockMode(s.lock_mode)),
            StatusField::LockMode(self.lock_mode),
        );
        emit(
            differs(|s| StatusField::PackType(s.pack_type)),
            StatusField::PackType(self.pack_type),
        );
        emit(
            differs(|s| StatusField::PumpTimer(s.pump_timer_min)),
            StatusField::PumpTimer(self.pump_timer_min),
        );
        emit(differs(|s| StatusField::Hours(s.hours)), StatusField::Hours(self.hours));

        if let (Some(target), Some(actual)) = (self.target_temp, self.actual_temp) {
            let changed = prev.is_none_or(|p| {
                p.target_temp != self.target_temp || p.actual_temp != self.actual_temp
            });
            emit(changed, StatusField::Temperature { target, actual });
        }
        out
    }

    /// Keep the previous temperatures when this block carried none.
    fn carry_temperatures(&mut self, prev: Option<&DecodedStatus>) {
        if let (None, Some(p)) = (self.target_temp, prev) {
            self.target_temp = p.target_temp;
            self.actual_temp = p.actual_temp;
        }
    }
}

/// Upper bound on the number of [`StatusField`]s one decode can produce.
pub const MAX_FIELDS: usize = 20;

/// One semantic status field, as delivered to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusField {
    /// Pump 1..=4 actual state.
    Pump { index: u8, state: PumpState },
    /// Pump 1..=4 requested level.
    PumpDemand { index: u8, demand: UserDemand },
    Light(bool),
    Circulation(bool),
    Blower(bool),
    Heater(bool),
    Waterfall(bool),
    Standby(bool),
    QuietState(QuietState),
    LockMode(LockMode),
    PackType(PackType),
    PumpTimer(u8),
    Hours(u8),
    Temperature { target: Temperature, actual: Temperature },
}

// ───────────────────────────────────────────────────────────────
// Decoder
// ───────────────────────────────────────────────────────────────

/// Decodes status blocks with the session's offset table and diffs each
/// result against the previous one.
pub struct StatusDecoder {
    table: &'static OffsetTable,
    pinned_schema: Option<u8>,
    previous: Option<DecodedStatus>,
}

impl StatusDecoder {
    /// Before any handshake the current table is assumed.
    pub fn new() -> Self {
        Self {
            table: &OffsetTable::CURRENT,
            pinned_schema: None,
            previous: None,
        }
    }

    /// Select the table for a status schema announced during the handshake.
    ///
    /// The first announcement pins the table for the session.  A later one
    /// that would pick a different table is ignored.  If pinning changes the
    /// table, the baseline decoded with the old one is dropped.
    pub fn select_schema(&mut self, version: u8, legacy_max: u8) {
        let table = OffsetTable::for_schema(version, legacy_max);
        match self.pinned_schema {
            None => {
                self.pinned_schema = Some(version);
                if table != self.table {
                    self.previous = None;
                }
                self.table = table;
                info!("status: schema v{version}, using {} offsets", table.name);
            }
            Some(_) if table == self.table => {}
            Some(pinned) => warn!(
                "status: schema v{version} would switch offset table mid-session \
                 (pinned v{pinned}, {}), ignored",
                self.table.name
            ),
        }
    }

    /// Decode `payload` and return the snapshot plus the changed fields.
    /// The snapshot becomes the new baseline.
    pub fn decode(&mut self, payload: &[u8]) -> Result<(DecodedStatus, Vec<StatusField, MAX_FIELDS>)> {
        let mut status = DecodedStatus::decode(payload, self.table)?;
        status.carry_temperatures(self.previous.as_ref());
        let changes = status.changes(self.previous.as_ref());
        self.previous = Some(status);
        Ok((status, changes))
    }

    pub fn table(&self) -> &'static OffsetTable {
        self.table
    }
}

impl Default for StatusDecoder {
    fn default() -> Self {
        Self::new()
    }
}
