//! Transport abstraction over any ordered byte channel.
//!
//! Concrete implementations:
//! - UART serial (USB-serial bridge on ESP32-S3), see
//!   [`UartTransport`](crate::adapters::uart::UartTransport)
//! - recording mocks in the integration tests
//!
//! The service is generic over `Transport`; nothing above this trait knows
//! how bytes move.

/// Non-blocking byte channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Number of bytes that can be read right now without blocking.
    fn available(&self) -> usize;

    /// Read one byte. `Ok(None)` if nothing is pending.
    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Write `data`, returning the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;
}
