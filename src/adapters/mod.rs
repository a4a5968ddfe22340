//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements   | Connects to                 |
//! |------------|--------------|-----------------------------|
//! | `log_sink` | StatusSink   | Serial log output           |
//! | `time`     | (clock)      | ESP32 system timer          |
//! | `uart`     | Link         | ESP-IDF UART driver         |

pub mod log_sink;
pub mod time;
#[cfg(feature = "espidf")]
pub mod uart;
