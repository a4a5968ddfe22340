//! Decoder side of the bridge: one [`SpaSession`] per physical connection.
//!
//! ```text
//!  Link ──▶ LineDecoder ──▶ ProxyEnvelope::Rx ──▶ LogicalMessage
//!                                                   │
//!        ┌──────────────┬──────────────┬────────────┼────────────┐
//!        ▼              ▼              ▼            ▼            ▼
//!   handshake      notification     program    reassembly ──▶ status / config
//!   (ACK, schema)  (due dates)      (on change)                   │
//!        └──────────────┴──────────────┴────────────┴──────▶ StatusSink
//! ```

pub mod config_block;
pub mod handshake;
pub mod notification;
pub mod reassembly;
pub mod service;
pub mod status;

pub use service::SpaSession;
