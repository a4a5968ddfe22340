//! Decoder-side scenarios: `SpaSession` driven through a mock link, a
//! mock reset pin and a recording sink.

use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};
use spalink::config::BridgeConfig;
use spalink::protocol::canned::{GO_KEEPALIVE, HANDSHAKE_ACK};
use spalink::protocol::command::OnOffTarget;
use spalink::protocol::message::SchemaKind;
use spalink::session::SpaSession;
use spalink::session::config_block::SilentMode;
use spalink::session::status::{PumpState, StatusField};

use crate::mock_ports::{
    MockLink, RecordingSink, fragment_frame, fragment_frames, handshake_frame, sealed,
};

const STATUS_LEN: usize = 162;
const CONFIG_LEN: usize = 188;
const CHUNK: usize = 100;

fn tx_line(bytes: &[u8]) -> String {
    format!("TX:{}", hex::encode_upper(bytes))
}

/// Status payload laid out with the current offset table.
fn status_payload() -> Vec<u8> {
    let mut p = vec![0u8; STATUS_LEN];
    p[2] = 42; // hours
    p[3] = 3; // quiet state OFF
    p[5] = 0b00_00_00_10; // pump 1 demand high
    p[6] = 0b0010_0100; // circulation + heater
    p[7] = 0b00_00_00_01; // pump 1 high
    p[21..23].copy_from_slice(&[0x02, 0xA3]); // set-point 37.5
    p[23..25].copy_from_slice(&[0x02, 0x88]); // water 36.0
    p[35] = 10; // inYT
    p[49] = 15; // pump timer
    p[53] = 1; // light
    p
}

/// The same status laid out with the legacy offset table.
fn legacy_status_payload() -> Vec<u8> {
    let mut p = vec![0u8; STATUS_LEN];
    p[4] = 0b00_00_00_10; // pump 1 demand high
    p[5] = 0b0010_0100; // circulation + heater
    p[6] = 0b00_00_00_01; // pump 1 high
    p[20..22].copy_from_slice(&[0x02, 0xA3]); // set-point 37.5
    p[22..24].copy_from_slice(&[0x02, 0x88]); // water 36.0
    p[30] = 42; // hours
    p[31] = 3; // quiet state OFF
    p[34] = 10; // inYT
    p[48] = 15; // pump timer
    p[53] = 1; // light
    p
}

fn config_block() -> Vec<u8> {
    let mut c = vec![0u8; CONFIG_LEN];
    c[2] = 7; // config number
    c[3..5].copy_from_slice(&[0x02, 0x88]);
    c[2 + 127] = 2; // zones
    c[2 + 157] = 4; // silent mode night
    c[CONFIG_LEN - 1] = 0x3B;
    c
}

struct Rig {
    session: SpaSession,
    link: MockLink,
    pin: PinMock,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        Self::with_pin(&[Transaction::set(State::High)])
    }

    fn with_pin(expectations: &[Transaction]) -> Self {
        let mut rig = Self {
            session: SpaSession::new(BridgeConfig::default()),
            link: MockLink::new(),
            pin: PinMock::new(expectations),
            sink: RecordingSink::default(),
        };
        rig.session.begin(&mut rig.pin);
        rig
    }

    fn tick(&mut self, now_ms: u64) {
        self.session.tick(now_ms, &mut self.link, &mut self.pin, &mut self.sink);
    }

    fn feed_payload(&mut self, now_ms: u64, payload: &[u8]) {
        for f in fragment_frames(payload, CHUNK) {
            self.link.push_rx(&f);
        }
        self.tick(now_ms);
    }

    fn finish(mut self) {
        self.pin.done();
    }
}

// ── Handshake ─────────────────────────────────────────────────

#[test]
fn status_handshake_selects_current_table_and_acks() {
    let mut rig = Rig::new();
    rig.link.push_rx(&handshake_frame("inYT_S81.xml"));
    rig.tick(1_000);

    assert_eq!(rig.link.take_lines(), [tx_line(&HANDSHAKE_ACK)]);
    assert_eq!(rig.sink.connections, [true]);
    assert_eq!(rig.sink.schemas, [(SchemaKind::Status, "inYT_S81.xml".to_owned(), 81)]);
    assert_eq!(rig.session.offset_table().name, "v51+");
    assert_eq!(rig.session.schema_versions(), (None, Some(81)));
    rig.finish();
}

#[test]
fn old_status_schema_selects_legacy_table() {
    let mut rig = Rig::new();
    rig.link.push_rx(&handshake_frame("inYT_S50.xml"));
    rig.tick(1_000);
    assert_eq!(rig.session.offset_table().name, "v50");

    // A later announcement cannot switch tables mid-session.
    rig.link.push_rx(&handshake_frame("inYT_S81.xml"));
    rig.tick(1_100);
    assert_eq!(rig.session.offset_table().name, "v50");
    rig.finish();
}

#[test]
fn config_schema_is_reported() {
    let mut rig = Rig::new();
    rig.link.push_rx(&handshake_frame("inYT_C37.xml"));
    rig.tick(1_000);
    assert_eq!(rig.session.schema_versions(), (Some(37), None));
    assert_eq!(rig.sink.schemas[0].0, SchemaKind::Config);
    rig.finish();
}

#[test]
fn unsendable_ack_does_not_stop_decoding() {
    let mut rig = Rig::new();
    rig.link.fail_writes = true;
    rig.link.push_rx(&handshake_frame("inYT_S81.xml"));
    rig.tick(1_000);
    rig.feed_payload(1_500, &status_payload());

    assert_eq!(rig.sink.connections, [true]);
    assert_eq!(rig.session.schema_versions(), (None, Some(81)));
    assert_eq!(rig.sink.statuses.len(), 1);
    assert!(rig.link.tx.is_empty());
    rig.finish();
}

#[test]
fn clock_sync_is_reported_and_acknowledged() {
    let mut rig = Rig::new();
    let mut f = vec![0u8; 22];
    f[0] = 0x17;
    f[13] = b'K';
    f[15..21].copy_from_slice(&[14, 10, 3, 9, 30, 5]);
    rig.link.push_rx(&sealed(f));
    rig.tick(1_000);

    assert_eq!(rig.sink.clocks.len(), 1);
    assert_eq!(rig.sink.clocks[0].day, 14);
    assert_eq!(rig.sink.clocks[0].minute, 30);
    assert_eq!(rig.link.take_lines(), [tx_line(&HANDSHAKE_ACK)]);
    rig.finish();
}

// ── Status and config ─────────────────────────────────────────

#[test]
fn fragments_assemble_into_status() {
    let mut rig = Rig::new();
    rig.feed_payload(1_000, &status_payload());

    assert_eq!(rig.session.canonical_status_len(), Some(STATUS_LEN));
    assert_eq!(rig.sink.statuses.len(), 1);
    // Every field is reported on the first decode.
    assert_eq!(rig.sink.fields.len(), 20);

    let s = &rig.sink.statuses[0];
    assert_eq!(s.pumps[0], PumpState::High);
    assert!(s.light && s.circulation && s.heater && s.standby);
    assert_eq!(s.hours, 42);
    assert_eq!(s.target_temp.map(|t| t.deci_celsius), Some(375));
    assert_eq!(s.actual_temp.map(|t| t.deci_celsius), Some(360));
    rig.finish();
}

#[test]
fn unchanged_status_is_silent_and_changes_are_diffed() {
    let mut rig = Rig::new();
    let mut payload = status_payload();
    rig.feed_payload(1_000, &payload);
    rig.sink.fields.clear();

    rig.feed_payload(2_000, &payload);
    assert!(rig.sink.fields.is_empty());
    assert_eq!(rig.sink.statuses.len(), 1);

    payload[53] = 0;
    rig.feed_payload(3_000, &payload);
    assert_eq!(rig.sink.fields, [StatusField::Light(false)]);
    assert_eq!(rig.sink.statuses.len(), 2);
    rig.finish();
}

#[test]
fn combined_payload_splits_into_config_and_status() {
    let mut rig = Rig::new();
    rig.feed_payload(1_000, &status_payload());
    rig.sink.fields.clear();

    let mut status = status_payload();
    status[2] = 43;
    let mut combined = config_block();
    combined.extend_from_slice(&status);
    assert_eq!(combined.len(), 350);
    rig.feed_payload(2_000, &combined);

    assert_eq!(rig.sink.configs.len(), 1);
    let c = &rig.sink.configs[0];
    assert_eq!(c.config_number, 7);
    assert_eq!(c.zones, 2);
    assert_eq!(c.silent_mode, SilentMode::Night);
    assert_eq!(c.setpoint.deci_celsius, 360);
    assert_eq!(rig.sink.fields, [StatusField::Hours(43)]);

    // Same config again: nothing new reported.
    rig.feed_payload(3_000, &combined);
    assert_eq!(rig.sink.configs.len(), 1);
    rig.finish();
}

#[test]
fn combined_payload_before_canonical_length_only_yields_config() {
    let mut rig = Rig::new();
    let mut combined = config_block();
    combined.extend_from_slice(&status_payload());
    rig.feed_payload(1_000, &combined);

    assert_eq!(rig.sink.configs.len(), 1);
    assert!(rig.sink.statuses.is_empty());
    rig.finish();
}

#[test]
fn legacy_handshake_after_first_status_restarts_baseline() {
    let mut rig = Rig::new();
    let payload = legacy_status_payload();
    // Decoded with the current table until the schema is known.
    rig.feed_payload(1_000, &payload);
    assert_eq!(rig.sink.statuses.len(), 1);

    rig.link.push_rx(&handshake_frame("inYT_S50.xml"));
    rig.tick(2_000);
    rig.sink.fields.clear();

    rig.feed_payload(3_000, &payload);
    assert_eq!(rig.sink.fields.len(), 20);
    let s = rig.sink.statuses.last().unwrap();
    assert_eq!(s.hours, 42);
    assert_eq!(s.pumps[0], PumpState::High);
    assert_eq!(s.target_temp.map(|t| t.deci_celsius), Some(375));
    rig.finish();
}

#[test]
fn overflow_resynchronises_on_next_terminal_fragment() {
    let mut rig = Rig::new();
    let part = [0u8; 112];
    // Five 112-byte parts outgrow the 512-byte buffer.
    for _ in 0..6 {
        rig.link.push_rx(&fragment_frame(&part, true));
    }
    rig.link.push_rx(&fragment_frame(&part, false));
    rig.tick(1_000);
    assert!(rig.sink.statuses.is_empty());
    assert_eq!(rig.session.canonical_status_len(), None);

    rig.feed_payload(2_000, &status_payload());
    assert_eq!(rig.sink.statuses.len(), 1);
    assert_eq!(rig.session.canonical_status_len(), Some(STATUS_LEN));
    assert_eq!(rig.sink.statuses[0].hours, 42);
    rig.finish();
}

// ── Program, notifications ────────────────────────────────────

#[test]
fn program_change_reported_once() {
    let mut rig = Rig::new();
    let mut f = vec![0u8; 18];
    f[16] = 4;
    let f = sealed(f);
    rig.link.push_rx(&f);
    rig.link.push_rx(&f);
    rig.tick(1_000);
    assert_eq!(rig.sink.programs, [4]);
    assert_eq!(rig.session.program_id(), Some(4));
    rig.finish();
}

#[test]
fn notification_due_date_is_computed() {
    let mut rig = Rig::new();
    let mut f = vec![0u8; 77];
    f[0] = 0x17;
    f[6] = 0x0B;
    f[16..22].copy_from_slice(&[2, 1, 1, 24, 90, 0]);
    f[22..28].copy_from_slice(&[0, 1, 1, 24, 90, 0]);
    rig.link.push_rx(&sealed(f));
    rig.tick(1_000);

    assert_eq!(rig.sink.notifications.len(), 1);
    let n = &rig.sink.notifications[0];
    assert_eq!(n.kind.name(), "Clean Filter");
    assert_eq!(n.due.to_string(), "2024-03-31");
    rig.finish();
}

// ── Liveness ──────────────────────────────────────────────────

#[test]
fn keepalive_sent_every_period() {
    let mut rig = Rig::new();
    let go = tx_line(&GO_KEEPALIVE);

    rig.tick(23_000);
    assert!(rig.link.take_lines().is_empty());
    rig.tick(23_001);
    assert_eq!(rig.link.take_lines(), [go.clone()]);
    rig.tick(40_000);
    assert!(rig.link.take_lines().is_empty());
    rig.tick(46_002);
    assert_eq!(rig.link.take_lines(), [go]);
    rig.finish();
}

#[test]
fn silence_drops_connection_and_pulses_reset() {
    let mut rig = Rig::with_pin(&[
        Transaction::set(State::High),
        Transaction::set(State::Low),
        Transaction::set(State::High),
    ]);
    rig.link.push_rx(&handshake_frame("inYT_S50.xml"));
    rig.feed_payload(1_000, &status_payload());
    assert_eq!(rig.session.canonical_status_len(), Some(STATUS_LEN));
    assert!(rig.session.is_connected());

    rig.tick(61_000);
    assert!(rig.session.is_connected());

    rig.tick(61_001);
    assert!(!rig.session.is_connected());
    assert_eq!(rig.sink.connections, [true, false]);
    assert!(rig.session.reset_in_progress());
    // Fresh session state.
    assert_eq!(rig.session.canonical_status_len(), None);
    assert_eq!(rig.session.offset_table().name, "v51+");
    assert_eq!(rig.session.schema_versions(), (None, None));

    rig.tick(61_050);
    assert!(rig.session.reset_in_progress());
    rig.tick(61_101);
    assert!(!rig.session.reset_in_progress());
    rig.finish();
}

#[test]
fn manual_reset_refused_while_pulsing() {
    let mut rig = Rig::with_pin(&[
        Transaction::set(State::High),
        Transaction::set(State::Low),
        Transaction::set(State::High),
    ]);
    assert!(rig.session.reset_proxy(5_000, &mut rig.pin));
    assert!(!rig.session.reset_proxy(5_010, &mut rig.pin));
    rig.tick(5_100);
    assert!(!rig.session.reset_in_progress());
    rig.finish();
}

// ── Robustness ────────────────────────────────────────────────

#[test]
fn malformed_lines_are_dropped() {
    let mut rig = Rig::new();
    rig.link.read_chunk = Some(7);
    rig.link.push_line("RX:5:ZZ");
    rig.link.push_line("NONSENSE");
    rig.link.push_line("RX:4:ABC");
    rig.link.push_line("I2C_PROXY:V1");
    rig.link.push_line("READY");
    let mut f = vec![0u8; 18];
    f[16] = 3;
    rig.link.push_rx(&sealed(f));
    rig.tick(1_000);

    assert_eq!(rig.sink.programs, [3]);
    assert!(rig.link.take_lines().is_empty());
    rig.finish();
}

#[test]
fn unknown_shape_still_counts_as_traffic() {
    let mut rig = Rig::new();
    rig.link.push_rx(&sealed(vec![0x17; 40]));
    rig.tick(1_000);
    assert!(rig.session.is_connected());
    assert!(rig.sink.statuses.is_empty());
    rig.finish();
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn commands_go_out_as_tx_lines() {
    let mut rig = Rig::new();
    rig.session.send_on_off(&mut rig.link, OnOffTarget::Pump(2), true).unwrap();
    rig.session.send_program(&mut rig.link, 1).unwrap();
    rig.session.send_temperature(&mut rig.link, 37.5).unwrap();
    rig.session.request_status(&mut rig.link).unwrap();

    let lines = rig.link.take_lines();
    assert_eq!(lines.len(), 4);
    assert!(lines[..3].iter().all(|l| l.starts_with("TX:")));
    assert_eq!(lines[3], "PING");
    rig.finish();
}

#[test]
fn out_of_range_commands_send_nothing() {
    let mut rig = Rig::new();
    assert!(rig.session.send_program(&mut rig.link, 9).is_err());
    assert!(rig.session.send_temperature(&mut rig.link, 10.0).is_err());
    assert!(rig.session.send_temperature(&mut rig.link, f32::NAN).is_err());
    assert!(rig.session.send_on_off(&mut rig.link, OnOffTarget::Pump(7), true).is_err());
    assert!(rig.link.tx.is_empty());
    rig.finish();
}
