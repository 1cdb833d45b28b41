//! Peripheral boundary.
//!
//! Everything the driver does to the hardware goes through [`I2sBus`]. A board
//! support crate implements it on top of the vendor I2S driver; tests use an
//! in-memory mock.
//!
//! Methods take `&self`: the playback and capture workers use the TX and RX
//! DMA channels of the same peripheral concurrently, and install/uninstall are
//! serialized by the lifecycle controller.

use std::time::Duration;

use thiserror::Error;

use crate::config::{BusConfig, PinMap};

/// Failure reported by the peripheral driver.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The transfer did not complete within the given timeout.
    #[error("timed out")]
    Timeout,

    /// Any other driver failure, with the vendor error code.
    #[error("driver error {0}")]
    Driver(i32),
}

/// A full-duplex I2S peripheral.
pub trait I2sBus: Send + Sync {
    /// Install and start the driver with the given configuration.
    fn install(&self, config: &BusConfig) -> Result<(), BusError>;

    /// Stop and uninstall the driver.
    fn uninstall(&self);

    /// Route the bus signals to physical pins.
    fn set_pins(&self, pins: &PinMap) -> Result<(), BusError>;

    /// Clear the DMA buffers so the first transfer starts from silence.
    fn zero_dma_buffer(&self);

    /// Reconfigure the bit clock.
    fn set_clock(
        &self,
        sample_rate: u32,
        bits_per_sample: u8,
        channels: u8,
    ) -> Result<(), BusError>;

    /// Queue `words` for transmission, blocking for at most `timeout`.
    ///
    /// Returns the number of bytes accepted, which may be less than
    /// `words.len() * 4`.
    fn write(&self, words: &[u32], timeout: Duration) -> Result<usize, BusError>;

    /// Fill `words` from the receive DMA, blocking for at most `timeout`.
    ///
    /// Returns the number of bytes stored, starting at `words[0]`.
    fn read(&self, words: &mut [u32], timeout: Duration) -> Result<usize, BusError>;
}
