//! Direction-independent worker.
//!
//! [`spawn`] runs a [`PeriodPump`] on its own thread:
//!
//! ```text
//! activate(direction) ─► set_clock ─► handshake ─► loop { pump period } ─► deactivate
//!                                        │
//!                                        └─► allocation caller gets Ok / bring-up error
//! ```
//!
//! The run flag is checked before every period and whenever a transfer times
//! out, so a stop waits for at most one transfer timeout plus one callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};
use embedded_hal::delay::DelayNs;
use tracing::{error, info, trace, warn};

use super::backoff::Backoff;
use super::params::StreamParams;
use super::{AudioStream, ErrorHandler};
use crate::bus::{BusError, I2sBus};
use crate::config::BackoffConfig;
use crate::constants::HW_SLOTS;
use crate::error::{Error, Result, StreamError};
use crate::lifecycle::{Direction, Lifecycle};

/// Result of one bounded hardware transfer.
pub(crate) enum Transfer {
    /// Bytes moved; zero for an empty transfer or a driver error.
    Bytes(usize),
    /// The transfer timed out and the stream is stopping.
    Stopped,
}

/// Outcome of pumping one period.
pub(crate) enum Pumped {
    /// The period went through; data moved.
    Done,
    /// An empty transfer abandoned the period.
    Stalled,
    Stopped,
}

/// A worker's view of the bus: timeout-bounded transfers that give up only
/// when the stream is stopping.
pub(crate) struct Port<'a, B> {
    bus: &'a B,
    running: &'a AtomicBool,
    timeout: Duration,
    direction: Direction,
}

impl<'a, B: I2sBus> Port<'a, B> {
    pub(crate) fn write(&self, words: &[u32]) -> Transfer {
        self.transfer(|bus, timeout| bus.write(words, timeout))
    }

    pub(crate) fn read(&self, words: &mut [u32]) -> Transfer {
        self.transfer(|bus, timeout| bus.read(words, timeout))
    }

    fn transfer(
        &self,
        mut op: impl FnMut(&B, Duration) -> std::result::Result<usize, BusError>,
    ) -> Transfer {
        loop {
            match op(self.bus, self.timeout) {
                Ok(n) => return Transfer::Bytes(n),
                Err(BusError::Timeout) => {
                    if !self.running.load(Ordering::Acquire) {
                        return Transfer::Stopped;
                    }
                    trace!(direction = %self.direction, "transfer timed out, retrying");
                }
                Err(err) => {
                    warn!(direction = %self.direction, "transfer failed: {err}");
                    return Transfer::Bytes(0);
                }
            }
        }
    }
}

/// Moves one period between the application and the bus.
///
/// Implemented once per direction.
pub(crate) trait PeriodPump: Send + 'static {
    const DIRECTION: Direction;

    fn pump<B: I2sBus>(&mut self, port: &Port<'_, B>) -> Pumped;
}

/// Per-stream worker knobs taken from the driver configuration.
pub(crate) struct WorkerSettings<D> {
    pub(crate) timeout: Duration,
    pub(crate) backoff: BackoffConfig,
    pub(crate) delay: D,
}

struct Worker<B, D, P> {
    lifecycle: Arc<Lifecycle<B>>,
    params: StreamParams,
    running: Arc<AtomicBool>,
    timeout: Duration,
    backoff: Backoff<D>,
    pump: P,
    on_error: Option<ErrorHandler>,
}

impl<B, D, P> Worker<B, D, P>
where
    B: I2sBus,
    D: DelayNs,
    P: PeriodPump,
{
    fn run(mut self, ready: Sender<Result<()>>) {
        let direction = P::DIRECTION;

        if let Err(err) = self.start() {
            warn!(%direction, "could not start stream: {err}");
            let _ = ready.send(Err(err));
            return;
        }
        let _ = ready.send(Ok(()));
        drop(ready);
        let _active = Activation {
            lifecycle: self.lifecycle.clone(),
            running: self.running.clone(),
            direction,
        };
        info!(%direction, "stream worker running");

        let port = Port {
            bus: self.lifecycle.bus(),
            running: &self.running,
            timeout: self.timeout,
            direction,
        };

        while self.running.load(Ordering::Acquire) {
            match self.pump.pump(&port) {
                Pumped::Done => self.backoff.reset(),
                Pumped::Stalled => {
                    if let Err(count) = self.backoff.stalled() {
                        let err = StreamError::Stalled { direction, count };
                        error!("{err}");
                        if let Some(on_error) = self.on_error.as_mut() {
                            on_error(&err);
                        }
                        break;
                    }
                }
                Pumped::Stopped => break,
            }
        }
    }

    fn start(&self) -> Result<()> {
        let direction = P::DIRECTION;
        self.lifecycle.activate(direction, self.params.sample_rate)?;
        if let Err(err) = self.lifecycle.configure_clock(self.params.sample_rate, HW_SLOTS) {
            self.lifecycle.deactivate(direction);
            return Err(err);
        }
        Ok(())
    }
}

/// A started worker's hold on the peripheral.
///
/// Dropped when the worker returns or unwinds out of a panicking callback;
/// either way the run flag is cleared and the direction deactivated.
struct Activation<B: I2sBus> {
    lifecycle: Arc<Lifecycle<B>>,
    running: Arc<AtomicBool>,
    direction: Direction,
}

impl<B: I2sBus> Drop for Activation<B> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        self.lifecycle.deactivate(self.direction);
        if thread::panicking() {
            error!(direction = %self.direction, "stream worker panicked, released i2s");
        } else {
            info!(direction = %self.direction, "stopped stream worker");
        }
    }
}

/// Start `pump` on a new worker thread and wait for its hardware bring-up.
pub(crate) fn spawn<B, D, P>(
    lifecycle: Arc<Lifecycle<B>>,
    params: StreamParams,
    settings: WorkerSettings<D>,
    pump: P,
    on_error: Option<ErrorHandler>,
) -> Result<StreamHandle>
where
    B: I2sBus + 'static,
    D: DelayNs + Send + 'static,
    P: PeriodPump,
{
    let direction = P::DIRECTION;
    let running = Arc::new(AtomicBool::new(true));
    let worker = Worker {
        lifecycle,
        params,
        running: running.clone(),
        timeout: settings.timeout,
        backoff: Backoff::new(settings.backoff, settings.delay),
        pump,
        on_error,
    };

    let (ready_tx, ready_rx) = bounded(1);
    info!(%direction, "starting stream thread");
    let handle = thread::Builder::new()
        .name(format!("i2s-{direction}"))
        .spawn(move || worker.run(ready_tx))?;

    let started = ready_rx
        .recv()
        .unwrap_or(Err(Error::WorkerLost { direction }));
    if let Err(err) = started {
        let _ = handle.join();
        return Err(err);
    }

    info!(%direction, "stream started");
    Ok(StreamHandle {
        direction,
        params,
        running,
        worker: Some(handle),
    })
}

/// A running stream. Dropping it stops the stream.
pub struct StreamHandle {
    direction: Direction,
    params: StreamParams,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl AudioStream for StreamHandle {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn params(&self) -> &StreamParams {
        &self.params
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        info!(direction = %self.direction, "stopping stream thread");
        self.running.store(false, Ordering::Release);
        if worker.join().is_err() {
            error!(direction = %self.direction, "stream worker panicked");
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
