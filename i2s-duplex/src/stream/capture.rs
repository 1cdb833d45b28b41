//! Capture: hardware → consumer callback.
//!
//! The worker reads one DMA chunk at a time, converts the words that arrived
//! back to 16-bit samples and appends them to the period buffer. A full period
//! goes to the consumer; words beyond it start the next period.
//!
//! - Short read: warn, keep what arrived.
//! - Empty read: warn, drop the partially filled period.

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use tracing::{debug, warn};

use super::engine::{self, PeriodPump, Port, Pumped, StreamHandle, Transfer, WorkerSettings};
use super::params::StreamParams;
use super::{alloc_buffer, ErrorHandler, ReadHandler};
use crate::bus::I2sBus;
use crate::constants::{DMA_CHUNK_BYTES, DMA_CHUNK_WORDS, HW_WORD_BYTES};
use crate::error::Result;
use crate::format::from_hw_words;
use crate::lifecycle::{Direction, Lifecycle};

pub(crate) struct CapturePump {
    consumer: ReadHandler,
    period: Vec<i16>,
    filled: usize,
    chunk: Vec<u32>,
    /// Next unconverted word in `chunk`.
    cursor: usize,
    /// Words received by the last read.
    received: usize,
}

impl CapturePump {
    fn new(period_samples: usize, consumer: ReadHandler) -> Result<Self> {
        Ok(Self {
            consumer,
            period: alloc_buffer(period_samples)?,
            filled: 0,
            chunk: alloc_buffer(DMA_CHUNK_WORDS)?,
            cursor: 0,
            received: 0,
        })
    }
}

impl PeriodPump for CapturePump {
    const DIRECTION: Direction = Direction::Capture;

    fn pump<B: I2sBus>(&mut self, port: &Port<'_, B>) -> Pumped {
        loop {
            if self.cursor < self.received {
                let take = (self.received - self.cursor).min(self.period.len() - self.filled);
                from_hw_words(
                    &mut self.period[self.filled..self.filled + take],
                    &self.chunk[self.cursor..self.cursor + take],
                );
                self.filled += take;
                self.cursor += take;

                if self.filled == self.period.len() {
                    (self.consumer)(&self.period);
                    self.filled = 0;
                    return Pumped::Done;
                }
                continue;
            }

            let read = match port.read(&mut self.chunk) {
                Transfer::Bytes(n) => n,
                Transfer::Stopped => return Pumped::Stopped,
            };
            if read != DMA_CHUNK_BYTES {
                warn!("read {read} bytes but expected {DMA_CHUNK_BYTES}");
            }

            self.cursor = 0;
            self.received = (read / HW_WORD_BYTES).min(DMA_CHUNK_WORDS);
            if self.received == 0 {
                self.filled = 0;
                return Pumped::Stalled;
            }
        }
    }
}

/// Allocate a capture stream and start its worker.
pub(crate) fn alloc<B, D>(
    lifecycle: Arc<Lifecycle<B>>,
    settings: WorkerSettings<D>,
    params: &StreamParams,
    consumer: ReadHandler,
    on_error: Option<ErrorHandler>,
) -> Result<StreamHandle>
where
    B: I2sBus + 'static,
    D: DelayNs + Send + 'static,
{
    let period_samples = params
        .validate()
        .inspect_err(|err| warn!("capture: {err}"))?;
    debug!(
        sample_rate = params.sample_rate,
        channels = params.channels,
        period_samples,
        "allocating capture stream"
    );
    let pump = CapturePump::new(period_samples, consumer)?;
    engine::spawn(lifecycle, *params, settings, pump, on_error)
}
