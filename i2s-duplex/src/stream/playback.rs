//! Playback: producer callback → hardware.
//!
//! Each period the producer fills the period buffer. The buffer is walked in
//! windows of one DMA chunk; every window is converted into the chunk buffer
//! and written as exactly [`DMA_CHUNK_BYTES`].
//!
//! ```text
//! producer ─► period [i16; n] ─┬─ window 0 ─► chunk [u32; 160] ─► write 640 B
//!                              ├─ window 1 ─► chunk            ─► write 640 B
//!                              └─ tail ─────► chunk (carried into the next period)
//! ```
//!
//! - Short write: warn, keep the words the hardware did not take at the front
//!   of the chunk and continue.
//! - Empty write: warn, drop the rest of the period.

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use tracing::{debug, warn};

use super::engine::{self, PeriodPump, Port, Pumped, StreamHandle, Transfer, WorkerSettings};
use super::params::StreamParams;
use super::{alloc_buffer, ErrorHandler, WriteHandler};
use crate::bus::I2sBus;
use crate::constants::{DMA_CHUNK_BYTES, DMA_CHUNK_WORDS, HW_WORD_BYTES};
use crate::error::Result;
use crate::format::to_hw_words;
use crate::lifecycle::{Direction, Lifecycle};

pub(crate) struct PlaybackPump {
    producer: WriteHandler,
    period: Vec<i16>,
    chunk: Vec<u32>,
    /// Words at the front of `chunk` waiting to be written.
    staged: usize,
}

impl PlaybackPump {
    fn new(period_samples: usize, producer: WriteHandler) -> Result<Self> {
        Ok(Self {
            producer,
            period: alloc_buffer(period_samples)?,
            chunk: alloc_buffer(DMA_CHUNK_WORDS)?,
            staged: 0,
        })
    }
}

impl PeriodPump for PlaybackPump {
    const DIRECTION: Direction = Direction::Playback;

    fn pump<B: I2sBus>(&mut self, port: &Port<'_, B>) -> Pumped {
        (self.producer)(&mut self.period);

        let mut pos = 0;
        loop {
            let take = (DMA_CHUNK_WORDS - self.staged).min(self.period.len() - pos);
            to_hw_words(
                &mut self.chunk[self.staged..self.staged + take],
                &self.period[pos..pos + take],
            );
            self.staged += take;
            pos += take;

            if self.staged < DMA_CHUNK_WORDS {
                return Pumped::Done;
            }

            let written = match port.write(&self.chunk) {
                Transfer::Bytes(n) => n,
                Transfer::Stopped => return Pumped::Stopped,
            };
            if written != DMA_CHUNK_BYTES {
                warn!("written {written} bytes but expected {DMA_CHUNK_BYTES}");
            }

            let accepted = (written / HW_WORD_BYTES).min(DMA_CHUNK_WORDS);
            if accepted == 0 {
                self.staged = 0;
                return Pumped::Stalled;
            }
            self.chunk.copy_within(accepted.., 0);
            self.staged = DMA_CHUNK_WORDS - accepted;

            if pos == self.period.len() && self.staged == 0 {
                return Pumped::Done;
            }
        }
    }
}

/// Allocate a playback stream and start its worker.
pub(crate) fn alloc<B, D>(
    lifecycle: Arc<Lifecycle<B>>,
    settings: WorkerSettings<D>,
    params: &StreamParams,
    producer: WriteHandler,
    on_error: Option<ErrorHandler>,
) -> Result<StreamHandle>
where
    B: I2sBus + 'static,
    D: DelayNs + Send + 'static,
{
    let period_samples = params
        .validate()
        .inspect_err(|err| warn!("playback: {err}"))?;
    debug!(
        sample_rate = params.sample_rate,
        channels = params.channels,
        period_samples,
        "allocating playback stream"
    );
    let pump = PlaybackPump::new(period_samples, producer)?;
    engine::spawn(lifecycle, *params, settings, pump, on_error)
}
