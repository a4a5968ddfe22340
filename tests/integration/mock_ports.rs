//! Mock ports for integration tests.
//!
//! Every port records what it was asked to do so tests can assert on the
//! full history without a UART, a bus peripheral or a presentation layer.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use spalink::ports::{BusPort, Link, StatusSink};
use spalink::protocol::frame;
use spalink::protocol::message::{ClockSync, SchemaKind};
use spalink::session::config_block::DecodedConfig;
use spalink::session::notification::DueNotification;
use spalink::session::status::{DecodedStatus, StatusField};

// ── MockLink ──────────────────────────────────────────────────

/// In-memory byte stream.  `rx` is what the unit under test reads,
/// `tx` is everything it wrote.
#[derive(Default)]
pub struct MockLink {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    /// Maximum bytes handed out per `read`, to exercise partial reads.
    pub read_chunk: Option<usize>,
    /// Fail every `write` while set.
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one line for the unit under test (terminator appended).
    pub fn push_line(&mut self, line: &str) {
        self.rx.extend(line.bytes());
        self.rx.push_back(b'\n');
    }

    /// Queue a captured frame as an `RX:` line.
    pub fn push_rx(&mut self, f: &[u8]) {
        self.push_line(&format!("RX:{}:{}", f.len(), hex::encode_upper(f)));
    }

    /// Drain and split everything written so far.
    pub fn take_lines(&mut self) -> Vec<String> {
        let text = String::from_utf8(std::mem::take(&mut self.tx)).expect("ASCII output");
        text.lines().map(str::to_owned).collect()
    }

    /// Move everything written here into `peer`'s receive queue.
    pub fn pipe_to(&mut self, peer: &mut MockLink) {
        peer.rx.extend(self.tx.drain(..));
    }
}

impl Link for MockLink {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let limit = self.read_chunk.unwrap_or(buf.len()).min(buf.len());
        let mut n = 0;
        while n < limit {
            match self.rx.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        if self.fail_writes {
            return Err(());
        }
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.rx.is_empty()
    }
}

// ── MockBus ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BusCall {
    Write(Vec<u8>),
    ReadAck,
    Listen,
}

#[derive(Default)]
pub struct MockBus {
    pub calls: Vec<BusCall>,
    /// Fail every `write_frame` while set.
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<&[u8]> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BusCall::Write(f) => Some(f.as_slice()),
                _ => None,
            })
            .collect()
    }
}

impl BusPort for MockBus {
    type Error = ();

    fn write_frame(&mut self, f: &[u8]) -> Result<(), ()> {
        self.calls.push(BusCall::Write(f.to_vec()));
        if self.fail_writes { Err(()) } else { Ok(()) }
    }

    fn read_ack(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        self.calls.push(BusCall::ReadAck);
        let n = buf.len().min(2);
        buf[..n].fill(0);
        Ok(n)
    }

    fn listen(&mut self) -> Result<(), ()> {
        self.calls.push(BusCall::Listen);
        Ok(())
    }
}

// ── RecordingDelay ────────────────────────────────────────────

/// Sums requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
    pub calls: usize,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.calls += 1;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub fields: Vec<StatusField>,
    pub statuses: Vec<DecodedStatus>,
    pub configs: Vec<DecodedConfig>,
    pub notifications: Vec<DueNotification>,
    pub connections: Vec<bool>,
    pub programs: Vec<u8>,
    pub clocks: Vec<ClockSync>,
    pub schemas: Vec<(SchemaKind, String, u8)>,
}

impl StatusSink for RecordingSink {
    fn on_field(&mut self, field: &StatusField) {
        self.fields.push(*field);
    }

    fn on_status(&mut self, status: &DecodedStatus) {
        self.statuses.push(*status);
    }

    fn on_config(&mut self, config: &DecodedConfig) {
        self.configs.push(*config);
    }

    fn on_notification(&mut self, notification: &DueNotification) {
        self.notifications.push(*notification);
    }

    fn on_connection(&mut self, connected: bool) {
        self.connections.push(connected);
    }

    fn on_program(&mut self, program_id: u8) {
        self.programs.push(program_id);
    }

    fn on_clock(&mut self, clock: &ClockSync) {
        self.clocks.push(*clock);
    }

    fn on_schema_file(&mut self, kind: SchemaKind, name: &str, version: u8) {
        self.schemas.push((kind, name.to_owned(), version));
    }
}

// ── Frame builders ────────────────────────────────────────────

/// Overwrite the trailing byte with the XOR checksum.
pub fn sealed(mut f: Vec<u8>) -> Vec<u8> {
    frame::seal(&mut f);
    f
}

/// 33-byte handshake frame carrying `name`.
#[allow(dead_code)]
pub fn handshake_frame(name: &str) -> Vec<u8> {
    let mut f = vec![0u8; 33];
    f[0] = 0x17;
    f[5] = 0x17;
    f[16..16 + name.len()].copy_from_slice(name.as_bytes());
    sealed(f)
}

/// One status/config fragment frame carrying `part`.
pub fn fragment_frame(part: &[u8], continuation: bool) -> Vec<u8> {
    let mut f = vec![0u8; 16];
    f[0] = 0x17;
    f[1] = 0x09;
    f[5] = 0x17;
    f[6] = 0x0A;
    f[9] = u8::from(continuation);
    f.extend_from_slice(part);
    sealed(f)
}

/// Split `payload` into status/config fragments of at most `chunk` bytes.
///
/// The last payload byte of every fragment doubles as the frame checksum,
/// so callers pick `chunk` such that no decoded field lands there.
#[allow(dead_code)]
pub fn fragment_frames(payload: &[u8], chunk: usize) -> Vec<Vec<u8>> {
    let parts: Vec<&[u8]> = payload.chunks(chunk).collect();
    let last = parts.len() - 1;
    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| fragment_frame(part, i != last))
        .collect()
}
