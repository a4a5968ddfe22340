//! Bridge configuration parameters
//!
//! All tunable timing and detection parameters for the proxy and the
//! decoder.  Both link-loss thresholds are kept as separate values because
//! the two sides of the bridge observe the controller differently.

use serde::{Deserialize, Serialize};

use crate::protocol::command::TemperatureEncoding;
use crate::protocol::envelope::HexMode;

/// Core bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    // --- Liveness ---
    /// Period between GO keep-alives sent by the decoder (milliseconds)
    pub keepalive_period_ms: u32,
    /// Decoder side: silence after which the link is declared lost (milliseconds)
    pub decoder_timeout_ms: u32,
    /// Proxy side: time without a GO after which the controller is considered gone (milliseconds)
    pub proxy_timeout_ms: u32,
    /// Minimum low time of the proxy reset line (milliseconds)
    pub reset_pulse_ms: u32,

    // --- Reassembly ---
    /// Smallest payload accepted as the canonical status length
    pub status_len_min: usize,
    /// Largest payload accepted as the canonical status length
    pub status_len_max: usize,
    /// Smallest combined config+status payload
    pub combined_len_min: usize,
    /// Largest combined config+status payload
    pub combined_len_max: usize,
    /// Status schema versions at or below this use the legacy offset table
    pub legacy_schema_max: u8,

    // --- Wire ---
    /// Drop received frames whose trailing XOR byte does not match
    pub verify_checksums: bool,
    /// How invalid hex digits in an `RX:` line are handled
    pub hex_mode: HexMode,
    /// Layout used for set-point commands
    pub temperature_encoding: TemperatureEncoding,

    // --- Proxy replay ---
    /// Pause before each canned frame (milliseconds)
    pub replay_gap_ms: u32,
    /// How many times the 2-byte ACK closes a canned replay
    pub replay_ack_repeats: u8,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            // Liveness
            keepalive_period_ms: 23_000,
            decoder_timeout_ms: 60_000,
            proxy_timeout_ms: 90_000,
            reset_pulse_ms: 100,

            // Reassembly
            status_len_min: 120,
            status_len_max: 170,
            combined_len_min: 300,
            combined_len_max: 400,
            legacy_schema_max: 50,

            // Wire
            verify_checksums: true,
            hex_mode: HexMode::Strict,
            temperature_encoding: TemperatureEncoding::WordSetpoint,

            // Proxy replay
            replay_gap_ms: 5,
            replay_ack_repeats: 5,
        }
    }
}

impl BridgeConfig {
    /// Reject values that would make the state machines misbehave.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.keepalive_period_ms == 0 {
            return Err("keepalive_period_ms must be non-zero");
        }
        if self.decoder_timeout_ms <= self.keepalive_period_ms {
            return Err("decoder_timeout_ms must exceed the keep-alive period");
        }
        if self.proxy_timeout_ms == 0 || self.reset_pulse_ms == 0 {
            return Err("proxy_timeout_ms and reset_pulse_ms must be non-zero");
        }
        if self.status_len_min == 0 || self.status_len_min > self.status_len_max {
            return Err("status length bracket is empty");
        }
        if self.combined_len_min > self.combined_len_max
            || self.combined_len_min <= self.status_len_max
        {
            return Err("combined length bracket must sit above the status bracket");
        }
        Ok(())
    }
}
