//! Fuzz target: `SpaSession::process_line`
//!
//! Splits arbitrary bytes into lines and drives each one through the
//! decoder as if it came from the proxy.  The session must never panic,
//! whatever the envelope, frame shape or fragment sequence.
//!
//! cargo fuzz run fuzz_session

#![no_main]

use libfuzzer_sys::fuzz_target;
use spalink::config::BridgeConfig;
use spalink::ports::{Link, StatusSink};
use spalink::protocol::envelope::HexMode;
use spalink::session::SpaSession;
use spalink::session::status::{DecodedStatus, StatusField};

struct SinkLink;

impl Link for SinkLink {
    type Error = ();
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }
    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }
    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
    fn available(&self) -> bool {
        false
    }
}

struct NullSink;

impl StatusSink for NullSink {
    fn on_field(&mut self, _field: &StatusField) {}
    fn on_status(&mut self, _status: &DecodedStatus) {}
}

fuzz_target!(|data: &[u8]| {
    // First byte picks the decoder options so both hex modes get coverage.
    let Some((&mode, rest)) = data.split_first() else {
        return;
    };
    let config = BridgeConfig {
        hex_mode: if mode & 1 == 0 { HexMode::Strict } else { HexMode::Lenient },
        verify_checksums: mode & 2 == 0,
        ..BridgeConfig::default()
    };
    let mut session = SpaSession::new(config);
    let text = String::from_utf8_lossy(rest);
    for (t, line) in text.split('\n').enumerate() {
        session.process_line(t as u64 * 1_000, line, &mut SinkLink, &mut NullSink);
    }
});
