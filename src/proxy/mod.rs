//! Transport proxy: impersonates a companion device on the controller bus
//! and relays raw frames over the byte-stream link.
//!
//! ```text
//!  controller bus                         byte-stream link
//!  ──────────────                         ────────────────
//!  bus callback ─▶ CaptureQueue ─▶ tick ─▶ RX:<len>:<hex>   ─▶ decoder
//!                                   │
//!       GO ◀─ canned replay ◀───────┘
//!  write_frame ◀──────────────────  tick ◀─ TX:<hex>        ◀─ decoder
//!                                        ─▶ TX:OK
//! ```
//!
//! All work happens in [`TransportProxy::tick`].  The receive callback only
//! enqueues.  Bus writes are synchronous: write, read the acknowledgement,
//! then re-arm as a listener.

pub mod capture;

pub use capture::{CaptureConsumer, CaptureProducer, CaptureQueue};

use embedded_hal::delay::DelayNs;
use log::{debug, info, trace, warn};

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::ports::{BusPort, Link, send_envelope};
use crate::protocol::canned::{GO_REPLIES, GO_REPLY_ACK};
use crate::protocol::envelope::{LineDecoder, MAX_LINE_LEN, PROXY_VERSION, ProxyEnvelope};
use crate::protocol::frame;
use crate::protocol::message::LogicalMessage;

/// Bytes pulled from the link per read call.
const LINK_CHUNK: usize = 64;

/// Proxy-side state.  One instance per bus attachment.
pub struct TransportProxy {
    config: BridgeConfig,
    lines: LineDecoder<MAX_LINE_LEN>,
    last_go_ms: u64,
    controller_present: bool,
    frames_forwarded: u32,
    replays: u32,
}

impl TransportProxy {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            lines: LineDecoder::new(),
            last_go_ms: 0,
            controller_present: false,
            frames_forwarded: 0,
            replays: 0,
        }
    }

    /// Announce the proxy on the link: version token, then `READY`.
    pub fn start(&mut self, link: &mut impl Link) -> Result<()> {
        let version = heapless::String::try_from(PROXY_VERSION).map_err(|()| Error::Link)?;
        send_envelope(link, &ProxyEnvelope::Version(version))?;
        send_envelope(link, &ProxyEnvelope::Ready)?;
        info!("proxy: started ({PROXY_VERSION})");
        Ok(())
    }

    /// One poll-loop iteration.
    ///
    /// 1. Forward every captured frame as `RX:` and answer GO with the
    ///    canned replay.
    /// 2. Execute `TX:` requests and answer `PING`.
    /// 3. Declare the controller gone after the configured silence.
    pub fn tick<const N: usize>(
        &mut self,
        now_ms: u64,
        captures: &mut CaptureConsumer<'_, N>,
        bus: &mut impl BusPort,
        link: &mut impl Link,
        delay: &mut impl DelayNs,
    ) {
        let dropped = captures.take_dropped();
        if dropped > 0 {
            warn!("proxy: capture queue full, {dropped} frame(s) dropped");
        }

        while let Some(captured) = captures.pop() {
            if send_envelope(link, &ProxyEnvelope::Rx(captured.clone())).is_ok() {
                self.frames_forwarded = self.frames_forwarded.wrapping_add(1);
            }
            if matches!(LogicalMessage::classify(&captured), Ok(LogicalMessage::GoKeepalive)) {
                self.last_go_ms = now_ms;
                if !self.controller_present {
                    self.controller_present = true;
                    info!("proxy: controller present");
                }
                self.replay_handshake(bus, delay);
            }
        }

        self.poll_link(bus, link);

        if self.controller_present
            && now_ms.saturating_sub(self.last_go_ms) > u64::from(self.config.proxy_timeout_ms)
        {
            self.controller_present = false;
            warn!(
                "proxy: no GO for {} ms, controller considered gone",
                self.config.proxy_timeout_ms
            );
        }
    }

    pub fn controller_present(&self) -> bool {
        self.controller_present
    }

    pub fn frames_forwarded(&self) -> u32 {
        self.frames_forwarded
    }

    pub fn replays(&self) -> u32 {
        self.replays
    }

    // ── Internals ─────────────────────────────────────────────

    /// Recorded responses 1–4, then the bare ACK `replay_ack_repeats` times.
    fn replay_handshake(&mut self, bus: &mut impl BusPort, delay: &mut impl DelayNs) {
        let gap = self.config.replay_gap_ms;
        for reply in GO_REPLIES {
            delay.delay_ms(gap);
            if let Err(e) = bus_send(bus, reply) {
                trace!("proxy: replay frame dropped: {e}");
            }
        }
        for _ in 0..self.config.replay_ack_repeats {
            delay.delay_ms(gap);
            if let Err(e) = bus_send(bus, &GO_REPLY_ACK) {
                trace!("proxy: replay ACK dropped: {e}");
            }
        }
        self.replays = self.replays.wrapping_add(1);
        debug!("proxy: GO replay #{} sent", self.replays);
    }

    fn poll_link(&mut self, bus: &mut impl BusPort, link: &mut impl Link) {
        let mut buf = [0u8; LINK_CHUNK];
        while link.available() {
            let n = match link.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!("proxy: link read failed: {e:?}");
                    break;
                }
            };
            let Self { lines, config, .. } = &mut *self;
            lines.feed(&buf[..n], |line| handle_line(config, line, bus, link));
        }
    }
}

fn handle_line(config: &BridgeConfig, line: &str, bus: &mut impl BusPort, link: &mut impl Link) {
    match ProxyEnvelope::parse(line, config.hex_mode) {
        Ok(ProxyEnvelope::Tx(f)) => {
            if config.verify_checksums {
                if let Err(e) = frame::verify(&f) {
                    warn!("proxy: refusing TX ({e}): {line}");
                    return;
                }
            }
            if bus_send(bus, &f).is_ok() {
                if let Err(e) = send_envelope(link, &ProxyEnvelope::TxOk) {
                    trace!("proxy: TX:OK not sent: {e}");
                }
            }
        }
        Ok(ProxyEnvelope::Ping) => {
            if let Err(e) = send_envelope(link, &ProxyEnvelope::Pong) {
                trace!("proxy: PONG not sent: {e}");
            }
        }
        Ok(other) => debug!("proxy: ignoring {other:?}"),
        Err(e) => warn!("proxy: dropped line ({e}): {line}"),
    }
}

/// Write one frame as initiator, collect the ACK, re-arm as listener.
fn bus_send(bus: &mut impl BusPort, f: &[u8]) -> Result<()> {
    let mut ack = [0u8; 2];
    let result = bus
        .write_frame(f)
        .and_then(|()| bus.read_ack(&mut ack).map(|_| ()));
    if let Err(e) = bus.listen() {
        warn!("proxy: failed to re-arm listener: {e:?}");
    }
    result.map_err(|e| {
        warn!("proxy: bus write of {} bytes failed: {e:?}", f.len());
        Error::Bus
    })
}
