//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one side of the bridge
//! against mock ports.  All tests run on the host (x86_64) with no real
//! hardware required.

mod mock_ports;
mod session_tests;
