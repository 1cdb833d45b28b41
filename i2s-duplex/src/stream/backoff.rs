//! Stall backoff for stream workers.
//!
//! A persistent hardware fault shows up as a run of empty transfers. Each one
//! sleeps for an exponentially growing, capped delay; once the run reaches the
//! configured limit the stream is failed instead of retried.

use std::time::Duration;

use embedded_hal::delay::DelayNs;
use tracing::debug;

use crate::config::BackoffConfig;

/// [`DelayNs`] backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

pub(crate) struct Backoff<D> {
    config: BackoffConfig,
    delay: D,
    consecutive: u32,
}

impl<D: DelayNs> Backoff<D> {
    pub(crate) fn new(config: BackoffConfig, delay: D) -> Self {
        Self {
            config,
            delay,
            consecutive: 0,
        }
    }

    /// A transfer moved data; forget earlier stalls.
    pub(crate) fn reset(&mut self) {
        if self.consecutive > 0 {
            debug!(stalls = self.consecutive, "transfers resumed");
        }
        self.consecutive = 0;
    }

    /// Record a stall and wait it out.
    ///
    /// Returns `Err(count)` without waiting once `count` reaches
    /// `max_consecutive_stalls`. A limit of zero never fails.
    pub(crate) fn stalled(&mut self) -> Result<(), u32> {
        self.consecutive = self.consecutive.saturating_add(1);
        let limit = self.config.max_consecutive_stalls;
        if limit != 0 && self.consecutive >= limit {
            return Err(self.consecutive);
        }
        let ms = self.delay_ms(self.consecutive);
        self.delay.delay_ms(ms);
        Ok(())
    }

    fn delay_ms(&self, stalls: u32) -> u32 {
        let factor = 2u32.saturating_pow(stalls.saturating_sub(1));
        self.config.base_ms.saturating_mul(factor).min(self.config.cap_ms)
    }
}
