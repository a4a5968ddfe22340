//! Fuzz target: `ProxyEnvelope::parse`
//!
//! Anything that parses must render back to a line that parses to the
//! same envelope.
//!
//! cargo fuzz run fuzz_envelope

#![no_main]

use libfuzzer_sys::fuzz_target;
use spalink::protocol::envelope::{HexMode, ProxyEnvelope};

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };
    for mode in [HexMode::Strict, HexMode::Lenient] {
        if let Ok(env) = ProxyEnvelope::parse(line, mode) {
            let rendered = env.to_line();
            assert_eq!(ProxyEnvelope::parse(&rendered, HexMode::Strict), Ok(env));
        }
    }
});
