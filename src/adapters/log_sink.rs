//! Log-based status sink adapter.
//!
//! Implements [`StatusSink`] by writing one line per decoded item to the
//! logger (UART / USB-CDC in production).  An entity or MQTT layer would
//! implement the same trait.

use log::info;

use crate::ports::StatusSink;
use crate::protocol::command::program_name;
use crate::protocol::message::{ClockSync, SchemaKind};
use crate::session::config_block::DecodedConfig;
use crate::session::notification::DueNotification;
use crate::session::status::{DecodedStatus, StatusField, Temperature};

/// Adapter that logs every decoded field and snapshot to the console.
#[derive(Default)]
pub struct LogStatusSink {
    snapshots: u32,
}

impl LogStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of status snapshots logged so far.
    pub fn snapshots(&self) -> u32 {
        self.snapshots
    }
}

fn on_off(v: bool) -> &'static str {
    if v { "ON" } else { "OFF" }
}

fn temp(t: Option<Temperature>) -> Temperature {
    t.unwrap_or_default()
}

impl StatusSink for LogStatusSink {
    fn on_field(&mut self, field: &StatusField) {
        match *field {
            StatusField::Pump { index, state } => info!("FIELD | pump{} = {}", index, state.name()),
            StatusField::PumpDemand { index, demand } => {
                info!("FIELD | pump{} demand = {}", index, demand.name());
            }
            StatusField::Light(v) => info!("FIELD | light = {}", on_off(v)),
            StatusField::Circulation(v) => info!("FIELD | circulation = {}", on_off(v)),
            StatusField::Blower(v) => info!("FIELD | blower = {}", on_off(v)),
            StatusField::Heater(v) => info!("FIELD | heater = {}", on_off(v)),
            StatusField::Waterfall(v) => info!("FIELD | waterfall = {}", on_off(v)),
            StatusField::Standby(v) => info!("FIELD | standby = {}", on_off(v)),
            StatusField::QuietState(q) => info!("FIELD | quiet = {}", q.name()),
            StatusField::LockMode(l) => info!("FIELD | lock = {}", l.name()),
            StatusField::PackType(p) => info!("FIELD | pack = {}", p.name()),
            StatusField::PumpTimer(m) => info!("FIELD | pump timer = {}min", m),
            StatusField::Hours(h) => info!("FIELD | hours = {}", h),
            StatusField::Temperature { target, actual } => {
                info!("FIELD | temp target={} actual={}", target, actual);
            }
        }
    }

    fn on_status(&mut self, status: &DecodedStatus) {
        self.snapshots = self.snapshots.wrapping_add(1);
        info!(
            "STATUS | #{} | pumps={}/{}/{}/{} | light={} circ={} heater={} | \
             T={}/{} | quiet={} lock={} | hours={}",
            self.snapshots,
            status.pumps[0].name(),
            status.pumps[1].name(),
            status.pumps[2].name(),
            status.pumps[3].name(),
            on_off(status.light),
            on_off(status.circulation),
            on_off(status.heater),
            temp(status.actual_temp),
            temp(status.target_temp),
            status.quiet_state.name(),
            status.lock_mode.name(),
            status.hours,
        );
    }

    fn on_config(&mut self, config: &DecodedConfig) {
        info!(
            "CONFIG | #{} | setpoint={} | filter={} | zones={}",
            config.config_number, config.setpoint, config.filter_frequency, config.zones
        );
    }

    fn on_notification(&mut self, n: &DueNotification) {
        info!("REMIND | {} due {}", n.kind.name(), n.due);
    }

    fn on_connection(&mut self, connected: bool) {
        info!("LINK | {}", if connected { "connected" } else { "lost" });
    }

    fn on_program(&mut self, program_id: u8) {
        info!("PROGRAM | {} ({})", program_id, program_name(program_id).unwrap_or("?"));
    }

    fn on_clock(&mut self, clock: &ClockSync) {
        info!(
            "CLOCK | {:02}/{:02} {:02}:{:02}:{:02}",
            clock.day, clock.month, clock.hour, clock.minute, clock.second
        );
    }

    fn on_schema_file(&mut self, kind: SchemaKind, name: &str, version: u8) {
        info!("SCHEMA | {:?} v{} ({})", kind, version, name);
    }
}
