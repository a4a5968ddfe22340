//! Wire protocol of the controller bus and of the proxy link.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  bus frame  ──▶ frame (checksum) ──▶ message (classify)      │
//! │                                                              │
//! │  envelope (RX:/TX: hex lines) ◀──▶ byte-stream link          │
//! │                                                              │
//! │  command (typed) ──▶ frame bytes ──▶ envelope TX:            │
//! │  canned (recorded handshake replies, GO, ACK)                │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod canned;
pub mod command;
pub mod envelope;
pub mod frame;
pub mod message;
