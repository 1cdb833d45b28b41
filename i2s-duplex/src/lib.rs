//! # i2s-duplex
//!
//! A full-duplex I2S audio stream driver for small microcontrollers. It
//! connects a host audio subsystem's players and sources to one serial audio
//! bus peripheral, sharing that peripheral between a playback and a capture
//! stream.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Hardware | [`bus`] | `I2sBus` trait implemented by the board's I2S driver |
//! | Format | [`format`] | 16-bit sample ↔ 32-bit hardware word conversion |
//! | Lifecycle | [`lifecycle`] | Activation mask; install/uninstall on first/last use |
//! | Streams | [`stream`] | Playback and capture worker threads |
//! | Driver | [`driver`] | Stream allocation entry points |
//! | Module | [`module`] / [`host`] | Provider registration with the host |
//!
//! ## Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use i2s_duplex::{AudioHost, DriverConfig, I2sDriver, I2sModule, StreamParams};
//!
//! let host = AudioHost::new();
//! let driver = Arc::new(I2sDriver::new(board_i2s, DriverConfig::default()));
//! let module = I2sModule::init(&host, driver)?;
//!
//! let params = StreamParams::new(16_000, 1, 20);
//! let mut player = host.alloc_player("i2s", &params, "", Box::new(|period: &mut [i16]| {
//!     period.fill(0);
//! }), None)?;
//!
//! player.stop();
//! module.close();
//! ```
//!
//! ## Audio parameters
//!
//! - **Application format:** `i16`, little-endian ([`SampleFormat::S16Le`] only)
//! - **Hardware word:** `u32`, sample in bits 31..17 ([`format`])
//! - **DMA chunk:** 640 bytes = 160 words ([`constants::DMA_CHUNK_BYTES`])
//! - **Sample rates:** any rate where `rate * 4` is a multiple of the chunk
//!   (8, 16, 32, 48 kHz; not 44.1 kHz)
//!
//! ## Logging
//!
//! All diagnostics go through [`tracing`]. The crate installs no subscriber.

pub mod bus;
pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod format;
pub mod host;
pub mod lifecycle;
pub mod module;
pub mod stream;

#[cfg(test)]
mod mock;

pub use bus::{BusError, I2sBus};
pub use config::{BackoffConfig, BusConfig, DriverConfig, PinMap};
pub use driver::I2sDriver;
pub use error::{Error, ErrorKind, Result, StreamError};
pub use host::{AllocResult, AudioHost, Registration};
pub use lifecycle::{ActivationMask, Direction, Lifecycle};
pub use module::I2sModule;
pub use stream::{
    AudioStream, ErrorHandler, ReadHandler, SampleFormat, StdDelay, StreamHandle, StreamParams,
    WriteHandler,
};
