//! Driver configuration.
//!
//! Nothing is loaded from files: a [`DriverConfig`] is built in code and handed
//! to the driver when the module is initialised. [`Default`] gives the board
//! layout the driver was written for.

use std::ops::BitOr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BACKOFF_BASE_MS, DEFAULT_BACKOFF_CAP_MS, DEFAULT_MAX_CONSECUTIVE_STALLS,
    DEFAULT_TRANSFER_TIMEOUT_MS, DMA_BUFFER_COUNT, DMA_CHUNK_BYTES, HW_BITS_PER_SAMPLE, I2S_PORT,
};

/// Framing flags on the wire. Combine with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommFormat(u8);

impl CommFormat {
    /// Philips I2S framing.
    pub const I2S: Self = Self(1);
    /// MSB first.
    pub const I2S_MSB: Self = Self(2);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for CommFormat {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Which slots of a frame carry data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChannelFormat {
    /// Mono on the right slot.
    OnlyRight,
}

/// Interrupt priority level requested for the DMA interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InterruptLevel(pub u8);

impl InterruptLevel {
    /// Lowest priority level.
    pub const LOWEST: Self = Self(1);
}

/// Peripheral configuration used at install time.
///
/// `sample_rate` is filled in from the stream that triggers installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    pub port: u8,
    pub master: bool,
    pub rx: bool,
    pub tx: bool,
    pub sample_rate: u32,
    pub bits_per_sample: u8,
    pub comm_format: CommFormat,
    pub channel_format: ChannelFormat,
    pub interrupt_level: InterruptLevel,
    pub dma_buf_count: usize,
    /// Length of one DMA buffer in bytes.
    pub dma_buf_len: usize,
    pub use_apll: bool,
}

impl BusConfig {
    /// Copy of this configuration for a concrete sample rate.
    pub fn with_sample_rate(&self, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..self.clone()
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            port: I2S_PORT,
            master: true,
            rx: true,
            tx: true,
            sample_rate: 16_000,
            bits_per_sample: HW_BITS_PER_SAMPLE,
            comm_format: CommFormat::I2S | CommFormat::I2S_MSB,
            channel_format: ChannelFormat::OnlyRight,
            interrupt_level: InterruptLevel::LOWEST,
            dma_buf_count: DMA_BUFFER_COUNT,
            dma_buf_len: DMA_CHUNK_BYTES,
            use_apll: false,
        }
    }
}

/// GPIO assignment for the bus signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    pub bit_clock: u8,
    pub word_select: u8,
    pub data_out: u8,
    pub data_in: u8,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            bit_clock: 26,
            word_select: 25,
            data_out: 22,
            data_in: 23,
        }
    }
}

/// How a worker reacts to consecutive stalled transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay after the first stall, in milliseconds. Doubles per further stall.
    pub base_ms: u32,
    /// Upper bound for the delay, in milliseconds.
    pub cap_ms: u32,
    /// Stalls in a row after which the stream is failed.
    pub max_consecutive_stalls: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: DEFAULT_BACKOFF_BASE_MS,
            cap_ms: DEFAULT_BACKOFF_CAP_MS,
            max_consecutive_stalls: DEFAULT_MAX_CONSECUTIVE_STALLS,
        }
    }
}

/// Everything the driver needs besides the peripheral itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub bus: BusConfig,
    pub pins: PinMap,
    /// Upper bound for one blocking hardware transfer.
    pub transfer_timeout: Duration,
    pub backoff: BackoffConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            pins: PinMap::default(),
            transfer_timeout: Duration::from_millis(DEFAULT_TRANSFER_TIMEOUT_MS),
            backoff: BackoffConfig::default(),
        }
    }
}
