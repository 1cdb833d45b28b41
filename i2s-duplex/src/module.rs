//! Module lifecycle: provider registration with the host.
//!
//! [`I2sModule::init`] registers one player and one source provider, both
//! named [`PROVIDER_NAME`], that allocate streams from a shared [`I2sDriver`].
//! [`I2sModule::close`] (or dropping the module) releases both.

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use tracing::info;

use crate::bus::I2sBus;
use crate::constants::PROVIDER_NAME;
use crate::driver::I2sDriver;
use crate::error::Result;
use crate::host::{AllocResult, AudioHost, Registration};
use crate::stream::{ErrorHandler, ReadHandler, StreamParams, WriteHandler};

/// The driver's registrations with a host.
pub struct I2sModule {
    player: Registration,
    source: Registration,
}

impl I2sModule {
    pub fn init<B, D>(host: &AudioHost, driver: Arc<I2sDriver<B, D>>) -> Result<Self>
    where
        B: I2sBus + 'static,
        D: DelayNs + Clone + Send + Sync + 'static,
    {
        let player_driver = driver.clone();
        let player = host.register_player(
            PROVIDER_NAME,
            move |params: &StreamParams,
                  device: &str,
                  producer: WriteHandler,
                  on_error: Option<ErrorHandler>|
                  -> AllocResult {
                let stream = player_driver.alloc_player(params, device, producer, on_error)?;
                Ok(Box::new(stream))
            },
        )?;

        let source = host.register_source(
            PROVIDER_NAME,
            move |params: &StreamParams,
                  device: &str,
                  consumer: ReadHandler,
                  on_error: Option<ErrorHandler>|
                  -> AllocResult {
                let stream = driver.alloc_source(params, device, consumer, on_error)?;
                Ok(Box::new(stream))
            },
        )?;

        info!(name = PROVIDER_NAME, "i2s module registered");
        Ok(Self { player, source })
    }

    /// Release both registrations.
    pub fn close(self) {
        info!(player = self.player.name(), source = self.source.name(), "i2s module closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriverConfig;
    use crate::error::ErrorKind;
    use crate::mock::{wait_for, MockBus, MockDelay};
    use crate::stream::AudioStream;

    fn make_driver() -> Arc<I2sDriver<MockBus, MockDelay>> {
        Arc::new(I2sDriver::with_delay(
            MockBus::default(),
            DriverConfig::default(),
            MockDelay::new(),
        ))
    }

    #[test]
    fn init_registers_both_providers() {
        let host = AudioHost::new();
        let module = I2sModule::init(&host, make_driver()).unwrap();

        assert_eq!(host.players(), [PROVIDER_NAME]);
        assert_eq!(host.sources(), [PROVIDER_NAME]);

        module.close();
        assert!(host.players().is_empty());
        assert!(host.sources().is_empty());
    }

    #[test]
    fn second_init_on_same_host_fails_cleanly() {
        let host = AudioHost::new();
        let _module = I2sModule::init(&host, make_driver()).unwrap();

        let err = I2sModule::init(&host, make_driver()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::AlreadyRegistered);
        assert_eq!(host.players().len(), 1);
        assert_eq!(host.sources().len(), 1);
    }

    #[test]
    fn host_allocates_through_module() {
        let host = AudioHost::new();
        let driver = make_driver();
        let module = I2sModule::init(&host, driver.clone()).unwrap();
        let params = StreamParams::new(16_000, 1, 20);

        let mut player = host
            .alloc_player(
                PROVIDER_NAME,
                &params,
                "default",
                Box::new(|p: &mut [i16]| p.fill(0)),
                None,
            )
            .unwrap();
        let mut source = host
            .alloc_source(PROVIDER_NAME, &params, "default", Box::new(|_: &[i16]| {}), None)
            .unwrap();
        assert!(driver.lifecycle().bus().is_installed());
        assert!(player.is_running() && source.is_running());

        player.stop();
        source.stop();
        assert!(wait_for(|| !driver.lifecycle().bus().is_installed()));
        assert_eq!(driver.lifecycle().bus().install_count(), 1);
        assert_eq!(driver.lifecycle().bus().uninstall_count(), 1);
        module.close();
    }

    #[test]
    fn host_reports_allocation_errors() {
        let host = AudioHost::new();
        let driver = make_driver();
        let _module = I2sModule::init(&host, driver.clone()).unwrap();

        let err = host
            .alloc_player(
                PROVIDER_NAME,
                &StreamParams::new(44_100, 2, 20),
                "",
                Box::new(|_: &mut [i16]| {}),
                None,
            )
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(driver.lifecycle().bus().hardware_calls(), 0);
    }
}
