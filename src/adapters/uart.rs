//! UART link adapter.
//!
//! Implements [`Link`] over an ESP-IDF `UartDriver`.  Reads never block:
//! the poll loop calls `available()` first and reads with a zero timeout.

use esp_idf_hal::delay::NON_BLOCK;
use esp_idf_hal::uart::UartDriver;
use esp_idf_svc::sys::EspError;

use crate::ports::Link;

/// Line-protocol baud rate shared by the proxy and the decoder.
pub const LINK_BAUD: u32 = 115_200;

pub struct UartLink<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UartLink<'d> {
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart }
    }
}

impl Link for UartLink<'_> {
    type Error = EspError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.uart.read(buf, NON_BLOCK)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.uart.write(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.uart.wait_tx_done(esp_idf_hal::delay::BLOCK)
    }

    fn available(&self) -> bool {
        self.uart.remaining_read().is_ok_and(|n| n > 0)
    }
}
