//! SpaLink: spa controller bus proxy and protocol decoder.
//!
//! Exposes the pure-logic modules for integration testing.  All
//! ESP-IDF-specific code is gated behind the `espidf` feature.

#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod ports;
pub mod protocol;
pub mod proxy;
pub mod session;

mod error;

pub use error::{Error, Result};
