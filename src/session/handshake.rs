//! Liveness: periodic GO keep-alive, link-loss detection, and the
//! non-blocking reset pulse for the proxy.
//!
//! Every wait here is a timestamp comparison evaluated once per tick.
//! Nothing sleeps.
//!
//! ```text
//!            traffic                      now − last_seen > timeout
//!  Down ─────────────────▶ Up ──────────────────────────────────────▶ Down
//!                                                    │
//!                                                    ▼
//!                               reset line LOW ── ≥ pulse_ms ──▶ HIGH
//! ```

use embedded_hal::digital::OutputPin;
use log::{info, warn};

// ── Keep-alive ────────────────────────────────────────────────

/// Fires once per period.  The first fire comes one full period after start.
#[derive(Debug, Clone)]
pub struct KeepaliveTimer {
    period_ms: u64,
    last_sent_ms: u64,
}

impl KeepaliveTimer {
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms: u64::from(period_ms),
            last_sent_ms: 0,
        }
    }

    /// `true` when a keep-alive should go out now.  Re-arms on `true`.
    pub fn due(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_sent_ms) > self.period_ms {
            self.last_sent_ms = now_ms;
            true
        } else {
            false
        }
    }
}

// ── Connection monitor ────────────────────────────────────────

/// Edge reported by [`ConnectionMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEdge {
    Connected,
    Lost,
}

/// Tracks the last time any controller frame was seen.
#[derive(Debug, Clone)]
pub struct ConnectionMonitor {
    timeout_ms: u64,
    last_seen_ms: u64,
    connected: bool,
}

impl ConnectionMonitor {
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout_ms: u64::from(timeout_ms),
            last_seen_ms: 0,
            connected: false,
        }
    }

    /// Record inbound traffic.  Returns the edge if this brought the link up.
    pub fn on_traffic(&mut self, now_ms: u64) -> Option<LinkEdge> {
        self.last_seen_ms = now_ms;
        if self.connected {
            return None;
        }
        self.connected = true;
        Some(LinkEdge::Connected)
    }

    /// Evaluate the timeout.  Returns the edge if the link just dropped.
    pub fn check(&mut self, now_ms: u64) -> Option<LinkEdge> {
        if self.connected && now_ms.saturating_sub(self.last_seen_ms) > self.timeout_ms {
            self.connected = false;
            return Some(LinkEdge::Lost);
        }
        None
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

// ── Reset pulse ───────────────────────────────────────────────

/// Active-low reset line driven without blocking.
///
/// [`trigger`](Self::trigger) pulls the line low and records the time;
/// [`poll`](Self::poll) releases it once `pulse_ms` have passed.  The pin
/// itself is passed in per call.
#[derive(Debug, Clone)]
pub struct ResetPulse {
    pulse_ms: u64,
    started_ms: Option<u64>,
}

impl ResetPulse {
    pub fn new(pulse_ms: u32) -> Self {
        Self {
            pulse_ms: u64::from(pulse_ms),
            started_ms: None,
        }
    }

    /// Drive the line to its idle (released) level.
    pub fn release<P: OutputPin>(&mut self, pin: &mut P) {
        if let Err(e) = pin.set_high() {
            warn!("reset: failed to release line: {e:?}");
        }
        self.started_ms = None;
    }

    /// Start a pulse.  Returns `false` if one is already in progress.
    pub fn trigger<P: OutputPin>(&mut self, now_ms: u64, pin: &mut P) -> bool {
        if self.started_ms.is_some() {
            return false;
        }
        if let Err(e) = pin.set_low() {
            warn!("reset: failed to assert line: {e:?}");
            return false;
        }
        self.started_ms = Some(now_ms);
        info!("reset: proxy reset asserted");
        true
    }

    /// Finish the pulse once it has lasted long enough.  Returns `true`
    /// on the tick that releases the line.
    pub fn poll<P: OutputPin>(&mut self, now_ms: u64, pin: &mut P) -> bool {
        match self.started_ms {
            Some(start) if now_ms.saturating_sub(start) >= self.pulse_ms => {
                self.release(pin);
                info!("reset: proxy reset complete");
                true
            }
            _ => false,
        }
    }

    pub fn in_progress(&self) -> bool {
        self.started_ms.is_some()
    }
}
