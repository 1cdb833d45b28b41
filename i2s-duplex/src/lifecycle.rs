//! Shared peripheral lifecycle.
//!
//! Playback and capture run on one physical bus. [`Lifecycle`] tracks which
//! directions currently need it as an [`ActivationMask`] and owns the only
//! install/uninstall calls:
//!
//! ```text
//!            activate(P)               activate(C)
//!   None ──── install ────► Playback ─────────────► Both
//!    ▲                                               │
//!    │        deactivate(C)             deactivate(P)│
//!    └─────── uninstall ─── Capture ◄────────────────┘
//! ```
//!
//! Hardware is touched only on None ↔ non-None transitions; every other
//! transition is bookkeeping. Both operations hold the mask lock for their whole
//! duration, so they are mutually exclusive.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::bus::I2sBus;
use crate::config::{BusConfig, PinMap};
use crate::constants::{DMA_CHUNK_BYTES, HW_BITS_PER_SAMPLE, HW_WORD_BYTES};
use crate::error::{Error, Result};

/// Stream direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Playback,
    Capture,
}

impl Direction {
    /// Mask bit for this direction.
    pub const fn mask(self) -> ActivationMask {
        match self {
            Direction::Playback => ActivationMask::PLAYBACK,
            Direction::Capture => ActivationMask::CAPTURE,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Playback => f.write_str("playback"),
            Direction::Capture => f.write_str("capture"),
        }
    }
}

/// Set of directions currently using the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivationMask(u8);

impl ActivationMask {
    pub const NONE: Self = Self(0);
    pub const PLAYBACK: Self = Self(1);
    pub const CAPTURE: Self = Self(2);
    pub const BOTH: Self = Self(3);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, direction: Direction) -> bool {
        self.0 & direction.mask().0 != 0
    }
}

impl BitOr for ActivationMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for ActivationMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for ActivationMask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0 & Self::BOTH.0)
    }
}

/// Check that one second of hardware words splits into whole DMA chunks.
pub fn check_rate_alignment(sample_rate: u32) -> Result<()> {
    let bytes_per_second = sample_rate as u64 * HW_WORD_BYTES as u64;
    if sample_rate == 0 || bytes_per_second % DMA_CHUNK_BYTES as u64 != 0 {
        return Err(Error::MisalignedRate {
            rate: sample_rate,
            chunk: DMA_CHUNK_BYTES,
        });
    }
    Ok(())
}

/// Owner of the peripheral's installed/uninstalled state.
pub struct Lifecycle<B> {
    bus: B,
    config: BusConfig,
    pins: PinMap,
    mask: Mutex<ActivationMask>,
}

impl<B: I2sBus> Lifecycle<B> {
    pub fn new(bus: B, config: BusConfig, pins: PinMap) -> Self {
        Self {
            bus,
            config,
            pins,
            mask: Mutex::new(ActivationMask::NONE),
        }
    }

    /// Mark `direction` as active, installing the peripheral if nothing was.
    ///
    /// The rate check runs before anything else; on any error the mask is left
    /// as it was.
    pub fn activate(&self, direction: Direction, sample_rate: u32) -> Result<()> {
        if let Err(err) = check_rate_alignment(sample_rate) {
            warn!(%direction, sample_rate, "refusing activation: {err}");
            return Err(err);
        }

        let mut mask = self.mask.lock();
        if mask.is_none() {
            self.install(sample_rate)?;
        }
        *mask = *mask | direction.mask();
        info!(%direction, mask = mask.bits(), "i2s activated");
        Ok(())
    }

    /// Clear `direction`, uninstalling the peripheral once nothing is active.
    ///
    /// Deactivating a direction that is not active does nothing.
    pub fn deactivate(&self, direction: Direction) {
        let mut mask = self.mask.lock();
        if !mask.contains(direction) {
            debug!(%direction, mask = mask.bits(), "deactivate: direction not active");
            return;
        }
        *mask = *mask & !direction.mask();
        info!(%direction, mask = mask.bits(), "i2s deactivated");
        if mask.is_none() {
            self.bus.uninstall();
            info!("i2s driver uninstalled");
        }
    }

    /// Reconfigure the bit clock for a stream, with the fixed hardware word width.
    pub fn configure_clock(&self, sample_rate: u32, channels: u8) -> Result<()> {
        debug!(sample_rate, channels, bits = HW_BITS_PER_SAMPLE, "setting i2s clock");
        self.bus
            .set_clock(sample_rate, HW_BITS_PER_SAMPLE, channels)
            .map_err(Error::Clock)
    }

    pub fn mask(&self) -> ActivationMask {
        *self.mask.lock()
    }

    pub fn is_installed(&self) -> bool {
        !self.mask().is_none()
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    fn install(&self, sample_rate: u32) -> Result<()> {
        let config = self.config.with_sample_rate(sample_rate);
        debug!(?config, "installing i2s driver");
        self.bus.install(&config).map_err(|err| {
            warn!("could not install i2s driver: {err}");
            Error::Install(err)
        })?;

        if let Err(err) = self.bus.set_pins(&self.pins) {
            warn!(pins = ?self.pins, "could not bind i2s pins: {err}");
            self.bus.uninstall();
            return Err(Error::Pins(err));
        }

        self.bus.zero_dma_buffer();
        info!(sample_rate, port = config.port, "i2s driver installed");
        Ok(())
    }
}
