//! SpaLink decoder node: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  UartLink (Link)   PinDriver (reset line)   LogStatusSink    │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │               SpaSession (pure logic)                  │  │
//! │  │  keep-alive · monitor · reassembly · status decode     │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;
use log::info;

use spalink::adapters::log_sink::LogStatusSink;
use spalink::adapters::time::UptimeClock;
use spalink::adapters::uart::{LINK_BAUD, UartLink};
use spalink::config::BridgeConfig;
use spalink::session::SpaSession;

/// Poll period of the main loop.
const POLL_INTERVAL_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SpaLink decoder v{}                 ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = BridgeConfig::default();
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Config: keep-alive {} ms, link timeout {} ms, hex {:?}, setpoint {:?}",
        config.keepalive_period_ms,
        config.decoder_timeout_ms,
        config.hex_mode,
        config.temperature_encoding
    );

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let uart_config = UartConfig::default().baudrate(Hertz(LINK_BAUD));
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio18,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart_config,
    )?;
    let mut link = UartLink::new(uart);
    let mut reset_line = PinDriver::output(peripherals.pins.gpio4)?;

    // ── 4. Session ────────────────────────────────────────────
    let clock = UptimeClock::new();
    let mut sink = LogStatusSink::new();
    let mut session = SpaSession::new(config);
    session.begin(&mut reset_line);

    info!("System ready. Entering poll loop.");

    // ── 5. Poll loop ──────────────────────────────────────────
    loop {
        session.tick(clock.now_ms(), &mut link, &mut reset_line, &mut sink);
        FreeRtos::delay_ms(POLL_INTERVAL_MS);
    }
}
