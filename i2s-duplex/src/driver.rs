//! Stream allocation entry points.
//!
//! [`I2sDriver`] owns the peripheral (through the shared [`Lifecycle`]) and
//! hands out playback and capture streams. Both directions may run at the same
//! time; the first one installs the peripheral and the last one to stop
//! uninstalls it.
//!
//! ```ignore
//! let driver = I2sDriver::new(board_i2s, DriverConfig::default());
//! let params = StreamParams::new(16_000, 1, 20);
//!
//! let mut player = driver.alloc_player(&params, "", Box::new(|period| tone.fill(period)), None)?;
//! let mut source = driver.alloc_source(&params, "", Box::new(|period| enc.push(period)), None)?;
//! // ...
//! source.stop();
//! player.stop(); // peripheral uninstalled here
//! ```

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use tracing::debug;

use crate::bus::I2sBus;
use crate::config::DriverConfig;
use crate::error::Result;
use crate::lifecycle::Lifecycle;
use crate::stream::{
    capture, playback, ErrorHandler, ReadHandler, StdDelay, StreamHandle, StreamParams,
    WorkerSettings, WriteHandler,
};

/// Full-duplex I2S driver.
///
/// Generic over the peripheral and the delay provider used for stall backoff.
pub struct I2sDriver<B, D = StdDelay> {
    lifecycle: Arc<Lifecycle<B>>,
    config: DriverConfig,
    delay: D,
}

impl<B: I2sBus + 'static> I2sDriver<B, StdDelay> {
    pub fn new(bus: B, config: DriverConfig) -> Self {
        Self::with_delay(bus, config, StdDelay)
    }
}

impl<B, D> I2sDriver<B, D>
where
    B: I2sBus + 'static,
    D: DelayNs + Clone + Send + 'static,
{
    pub fn with_delay(bus: B, config: DriverConfig, delay: D) -> Self {
        let lifecycle = Lifecycle::new(bus, config.bus.clone(), config.pins);
        Self {
            lifecycle: Arc::new(lifecycle),
            config,
            delay,
        }
    }

    /// Allocate a playback stream. `device` is ignored: there is one bus.
    pub fn alloc_player(
        &self,
        params: &StreamParams,
        device: &str,
        producer: WriteHandler,
        on_error: Option<ErrorHandler>,
    ) -> Result<StreamHandle> {
        debug!(device, "player requested");
        playback::alloc(self.lifecycle.clone(), self.settings(), params, producer, on_error)
    }

    /// Allocate a capture stream. `device` is ignored: there is one bus.
    pub fn alloc_source(
        &self,
        params: &StreamParams,
        device: &str,
        consumer: ReadHandler,
        on_error: Option<ErrorHandler>,
    ) -> Result<StreamHandle> {
        debug!(device, "source requested");
        capture::alloc(self.lifecycle.clone(), self.settings(), params, consumer, on_error)
    }

    pub fn lifecycle(&self) -> &Lifecycle<B> {
        &self.lifecycle
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    fn settings(&self) -> WorkerSettings<D> {
        WorkerSettings {
            timeout: self.config.transfer_timeout,
            backoff: self.config.backoff,
            delay: self.delay.clone(),
        }
    }
}
