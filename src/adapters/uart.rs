//! UART transport adapter.
//!
//! Implements [`Transport`] for the serial link the host talks Improv over.
//!
//! - **`target_os = "espidf"`**: wraps `esp_idf_hal::uart::UartDriver`
//!   with non-blocking reads.
//! - **all other targets**: an in-memory loopback. Tests push host bytes
//!   with [`UartTransport::inject`] and collect device output with
//!   [`UartTransport::take_output`].

use crate::protocol::transport::Transport;

// ───────────────────────────────────────────────────────────────
// ESP-IDF
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use esp_idf_hal::delay::{BLOCK, NON_BLOCK};
    use esp_idf_hal::uart::UartDriver;
    use esp_idf_svc::sys::EspError;
    use log::warn;

    use super::Transport;

    pub struct UartTransport {
        driver: UartDriver<'static>,
    }

    impl UartTransport {
        pub fn new(driver: UartDriver<'static>) -> Self {
            Self { driver }
        }
    }

    impl Transport for UartTransport {
        type Error = EspError;

        fn available(&self) -> usize {
            match self.driver.remaining_read() {
                Ok(n) => n,
                Err(e) => {
                    warn!("UART: remaining_read failed: {}", e);
                    0
                }
            }
        }

        fn read_byte(&mut self) -> Result<Option<u8>, EspError> {
            let mut byte = [0u8; 1];
            let n = self.driver.read(&mut byte, NON_BLOCK)?;
            Ok((n == 1).then_some(byte[0]))
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, EspError> {
            self.driver.write(data)
        }

        fn flush(&mut self) -> Result<(), EspError> {
            self.driver.wait_tx_done(BLOCK)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host loopback
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod platform {
    use std::collections::VecDeque;

    use super::Transport;

    #[derive(Debug, Default)]
    pub struct UartTransport {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
        flushes: usize,
    }

    impl UartTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue bytes as if the host had sent them.
        pub fn inject(&mut self, bytes: &[u8]) {
            self.rx.extend(bytes);
        }

        /// Everything the device wrote since the last call.
        pub fn take_output(&mut self) -> Vec<u8> {
            std::mem::take(&mut self.tx)
        }

        pub fn flush_count(&self) -> usize {
            self.flushes
        }
    }

    impl Transport for UartTransport {
        type Error = core::convert::Infallible;

        fn available(&self) -> usize {
            self.rx.len()
        }

        fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
            Ok(self.rx.pop_front())
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
            self.tx.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushes += 1;
            Ok(())
        }
    }
}

pub use platform::UartTransport;
