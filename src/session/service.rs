//! Decoder-side orchestrator.
//!
//! [`SpaSession`] owns the liveness timers and the per-connection decode
//! state.  All I/O flows through ports passed into each call, so the whole
//! session runs on the host against mock links, pins and sinks.
//!
//! ```text
//!  Link ──▶ ┌───────────────────────────────┐ ──▶ StatusSink
//!           │          SpaSession           │
//!  Link ◀── │ keep-alive · monitor · decode │ ──▶ reset line
//!           └───────────────────────────────┘
//! ```

use embedded_hal::digital::OutputPin;
use log::{debug, info, log_enabled, trace, warn, Level};

use super::config_block::ConfigDecoder;
use super::handshake::{ConnectionMonitor, KeepaliveTimer, LinkEdge, ResetPulse};
use super::notification::NotificationScheduler;
use super::reassembly::{MessageReassembler, PayloadLayout};
use super::status::{OffsetTable, StatusDecoder};
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::ports::{Link, StatusSink, send_envelope};
use crate::protocol::canned::{GO_KEEPALIVE, HANDSHAKE_ACK};
use crate::protocol::command::{Command, OnOffTarget, PROGRAM_MAX, program_name};
use crate::protocol::envelope::{LineDecoder, MAX_LINE_LEN, ProxyEnvelope};
use crate::protocol::frame::{self, CONTINUATION_INDEX};
use crate::protocol::message::{LogicalMessage, SchemaKind};

/// Bytes pulled from the link per read call.
const LINK_CHUNK: usize = 64;

/// Bytes per row of a payload hex dump.
const DUMP_ROW: usize = 32;

// ───────────────────────────────────────────────────────────────
// Session state
// ───────────────────────────────────────────────────────────────

/// Everything learned about the controller during one connection.
/// Discarded as a whole when the link is declared lost.
struct SessionState {
    reassembler: MessageReassembler,
    status: StatusDecoder,
    config: ConfigDecoder,
    program_id: Option<u8>,
    config_schema: Option<u8>,
    status_schema: Option<u8>,
}

impl SessionState {
    fn new(config: &BridgeConfig) -> Self {
        Self {
            reassembler: MessageReassembler::new(config),
            status: StatusDecoder::new(),
            config: ConfigDecoder::new(),
            program_id: None,
            config_schema: None,
            status_schema: None,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// SpaSession
// ───────────────────────────────────────────────────────────────

pub struct SpaSession {
    config: BridgeConfig,
    lines: LineDecoder<MAX_LINE_LEN>,
    keepalive: KeepaliveTimer,
    monitor: ConnectionMonitor,
    reset: ResetPulse,
    state: SessionState,
}

impl SpaSession {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            lines: LineDecoder::new(),
            keepalive: KeepaliveTimer::new(config.keepalive_period_ms),
            monitor: ConnectionMonitor::new(config.decoder_timeout_ms),
            reset: ResetPulse::new(config.reset_pulse_ms),
            state: SessionState::new(&config),
            config,
        }
    }

    /// Put the reset line in its released state.  Call once at start-up.
    pub fn begin(&mut self, reset_line: &mut impl OutputPin) {
        self.reset.release(reset_line);
        info!("session: started");
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One poll-loop iteration: finish a pending reset pulse, drain the
    /// link, check liveness, and send the keep-alive when due.
    pub fn tick(
        &mut self,
        now_ms: u64,
        link: &mut impl Link,
        reset_line: &mut impl OutputPin,
        sink: &mut impl StatusSink,
    ) {
        self.reset.poll(now_ms, reset_line);

        let mut buf = [0u8; LINK_CHUNK];
        while link.available() {
            let n = match link.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!("session: link read failed: {e:?}");
                    break;
                }
            };
            for &b in &buf[..n] {
                if let Some(line) = self.lines.push(b) {
                    self.process_line(now_ms, &line, link, sink);
                }
            }
        }

        if self.monitor.check(now_ms) == Some(LinkEdge::Lost) {
            warn!(
                "session: no controller traffic for {} ms, connection lost",
                self.config.decoder_timeout_ms
            );
            sink.on_connection(false);
            self.reset.trigger(now_ms, reset_line);
            self.state = SessionState::new(&self.config);
        }

        if self.keepalive.due(now_ms) {
            debug!("session: sending GO keep-alive");
            if let Err(e) = self.transmit(link, &GO_KEEPALIVE) {
                trace!("session: keep-alive not sent: {e}");
            }
        }
    }

    /// Handle one line from the proxy.
    pub fn process_line(
        &mut self,
        now_ms: u64,
        line: &str,
        link: &mut impl Link,
        sink: &mut impl StatusSink,
    ) {
        match ProxyEnvelope::parse(line, self.config.hex_mode) {
            Ok(ProxyEnvelope::Rx(f)) => self.process_frame(now_ms, &f, link, sink),
            Ok(ProxyEnvelope::Ready) => info!("session: proxy ready"),
            Ok(ProxyEnvelope::Version(v)) => info!("session: proxy version {v}"),
            Ok(ProxyEnvelope::TxOk) => debug!("session: TX acknowledged"),
            Ok(ProxyEnvelope::Pong) => debug!("session: proxy ping OK"),
            Ok(other) => debug!("session: unexpected {other:?} from proxy"),
            Err(e) => warn!("session: dropped line ({e}): {line}"),
        }
    }

    /// Handle one captured bus frame.
    pub fn process_frame(
        &mut self,
        now_ms: u64,
        f: &[u8],
        link: &mut impl Link,
        sink: &mut impl StatusSink,
    ) {
        if self.monitor.on_traffic(now_ms) == Some(LinkEdge::Connected) {
            info!("session: controller connected");
            sink.on_connection(true);
        }

        if self.config.verify_checksums {
            if let Err(e) = frame::verify(f) {
                warn!("session: dropped frame ({e}): {}", hex::encode_upper(f));
                return;
            }
        }

        let standalone = f.get(CONTINUATION_INDEX) != Some(&0x01);
        if standalone && self.state.reassembler.pending() == 0 {
            dump("FULL-RX", f);
        }

        let message = match LogicalMessage::classify(f) {
            Ok(m) => m,
            Err(e) => {
                warn!("session: {e}: {}", hex::encode_upper(f));
                return;
            }
        };

        match message {
            LogicalMessage::GoKeepalive => debug!("session: GO from controller"),
            LogicalMessage::HandshakeConfigXml { name, schema } => {
                info!("session: handshake file {name}");
                if let Some(s) = schema {
                    match s.kind {
                        SchemaKind::Config => self.state.config_schema = Some(s.version),
                        SchemaKind::Status => {
                            self.state.status_schema = Some(s.version);
                            self.state
                                .status
                                .select_schema(s.version, self.config.legacy_schema_max);
                        }
                    }
                    sink.on_schema_file(s.kind, &name, s.version);
                }
                if let Err(e) = self.transmit(link, &HANDSHAKE_ACK) {
                    trace!("session: handshake ACK not sent: {e}");
                }
            }
            LogicalMessage::ClockSync(clock) => {
                debug!(
                    "session: controller clock {:02}/{:02} {:02}:{:02}:{:02}",
                    clock.day, clock.month, clock.hour, clock.minute, clock.second
                );
                sink.on_clock(&clock);
                if let Err(e) = self.transmit(link, &HANDSHAKE_ACK) {
                    trace!("session: clock ACK not sent: {e}");
                }
            }
            LogicalMessage::HandshakeComplete => info!("session: handshake complete"),
            LogicalMessage::Notification77 { entries } => {
                for due in NotificationScheduler::schedule(&entries) {
                    info!(
                        "session: reminder {} due {} (interval {} d)",
                        due.kind.name(),
                        due.due,
                        due.entry.interval_days
                    );
                    sink.on_notification(&due);
                }
            }
            LogicalMessage::ProgramStatus18 { program_id } => {
                if program_id <= PROGRAM_MAX && self.state.program_id != Some(program_id) {
                    self.state.program_id = Some(program_id);
                    info!(
                        "session: program {} ({})",
                        program_id,
                        program_name(program_id).unwrap_or("?")
                    );
                    sink.on_program(program_id);
                }
            }
            LogicalMessage::Fragment {
                continuation,
                payload,
            } => match self.state.reassembler.push(&payload, continuation) {
                Ok(Some(complete)) => self.process_payload(&complete, sink),
                Ok(None) => {}
                Err(e) => warn!("session: {e}"),
            },
            LogicalMessage::ShortDiagnostic => {
                if f.len() > 2 {
                    debug!("session: short frame ({} bytes): {}", f.len(), hex::encode_upper(f));
                }
            }
        }
    }

    fn process_payload(&mut self, payload: &[u8], sink: &mut impl StatusSink) {
        dump("FULL-RX", payload);
        match self.state.reassembler.layout(payload) {
            PayloadLayout::StatusOnly => self.publish_status(payload, sink),
            PayloadLayout::Combined { split } => {
                let block = &payload[..split.unwrap_or(payload.len())];
                match self.state.config.decode(block) {
                    Ok(Some(config)) => sink.on_config(&config),
                    Ok(None) => {}
                    Err(e) => warn!("session: config block: {e}"),
                }
                match split {
                    Some(s) => self.publish_status(&payload[s..], sink),
                    None => debug!("session: combined payload without a usable status suffix"),
                }
            }
            PayloadLayout::Unrecognized => {
                debug!("session: unclassified payload of {} bytes", payload.len());
            }
        }
    }

    fn publish_status(&mut self, block: &[u8], sink: &mut impl StatusSink) {
        let (status, changes) = match self.state.status.decode(block) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("session: status block: {e}");
                return;
            }
        };
        if changes.is_empty() {
            return;
        }
        for field in &changes {
            sink.on_field(field);
        }
        sink.on_status(&status);
    }

    // ── Commands ──────────────────────────────────────────────

    pub fn send_on_off(&mut self, link: &mut impl Link, target: OnOffTarget, on: bool) -> Result<()> {
        self.send_command(link, Command::OnOff { target, on })
    }

    pub fn send_program(&mut self, link: &mut impl Link, program_id: u8) -> Result<()> {
        self.send_command(link, Command::Program(program_id))
    }

    pub fn send_temperature(&mut self, link: &mut impl Link, celsius: f32) -> Result<()> {
        let encoding = self.config.temperature_encoding;
        self.send_command(link, Command::Temperature { celsius, encoding })
    }

    /// Ask the proxy to answer with `PONG`.
    pub fn request_status(&mut self, link: &mut impl Link) -> Result<()> {
        send_envelope(link, &ProxyEnvelope::Ping)
    }

    /// Pulse the proxy reset line now.  Returns `false` if a pulse is
    /// already running.
    pub fn reset_proxy(&mut self, now_ms: u64, reset_line: &mut impl OutputPin) -> bool {
        if self.reset.in_progress() {
            debug!("session: reset already in progress");
            return false;
        }
        self.reset.trigger(now_ms, reset_line)
    }

    fn send_command(&mut self, link: &mut impl Link, command: Command) -> Result<()> {
        let encoded = command.encode().inspect_err(|e| {
            warn!("session: {command:?} not sent: {e}");
        })?;
        self.transmit(link, &encoded)?;
        info!("session: sent {command:?}");
        Ok(())
    }

    fn transmit(&mut self, link: &mut impl Link, bytes: &[u8]) -> Result<()> {
        let f = frame::raw_frame(bytes)?;
        send_envelope(link, &ProxyEnvelope::Tx(f))
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn is_connected(&self) -> bool {
        self.monitor.is_connected()
    }

    pub fn reset_in_progress(&self) -> bool {
        self.reset.in_progress()
    }

    pub fn canonical_status_len(&self) -> Option<usize> {
        self.state.reassembler.canonical_len()
    }

    pub fn offset_table(&self) -> &'static OffsetTable {
        self.state.status.table()
    }

    pub fn program_id(&self) -> Option<u8> {
        self.state.program_id
    }

    pub fn schema_versions(&self) -> (Option<u8>, Option<u8>) {
        (self.state.config_schema, self.state.status_schema)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

/// Hex dump at debug level, `DUMP_ROW` bytes per line.
fn dump(label: &str, bytes: &[u8]) {
    if !log_enabled!(Level::Debug) {
        return;
    }
    debug!("{label}:{} bytes", bytes.len());
    for (row, chunk) in bytes.chunks(DUMP_ROW).enumerate() {
        debug!("  {:03}: {}", row * DUMP_ROW, hex::encode_upper(chunk));
    }
}
