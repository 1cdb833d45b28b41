//! Per-direction streaming engines.
//!
//! Each allocated stream owns one worker thread that moves audio between a
//! period buffer (application side, `i16`) and a DMA chunk buffer (hardware
//! side, `u32`).
//!
//! | Direction | Callback | Per period |
//! |-----------|----------|------------|
//! | Playback | [`WriteHandler`] fills the period | convert + write chunk by chunk |
//! | Capture | [`ReadHandler`] receives the period | read + convert chunk by chunk |
//!
//! The direction-specific part is a small pump; start-up, the run loop, stall
//! handling and shutdown are shared by one generic worker.
//!
//! ## Stopping
//!
//! [`AudioStream::stop`] (or dropping the handle) clears the run flag and joins
//! the worker. The worker notices the flag before each period and whenever a
//! hardware transfer times out, so a stop takes at most one transfer timeout
//! plus one callback. No callback runs after `stop` returns.

mod backoff;
pub(crate) mod capture;
mod engine;
mod params;
pub(crate) mod playback;

pub use backoff::StdDelay;
pub use engine::StreamHandle;
pub use params::{SampleFormat, StreamParams};

use crate::error::{Result, StreamError};
use crate::lifecycle::Direction;

pub(crate) use engine::WorkerSettings;

/// Fills one period of samples for playback.
pub type WriteHandler = Box<dyn FnMut(&mut [i16]) + Send>;

/// Receives one captured period of samples.
pub type ReadHandler = Box<dyn FnMut(&[i16]) + Send>;

/// Told when a running stream fails.
pub type ErrorHandler = Box<dyn FnMut(&StreamError) + Send>;

/// A running playback or capture stream.
///
/// Streams start when they are allocated.
pub trait AudioStream: Send {
    fn direction(&self) -> Direction;

    fn params(&self) -> &StreamParams;

    /// Whether the worker is still streaming.
    fn is_running(&self) -> bool;

    /// Stop the worker and wait for it to exit. Calling it again does nothing.
    fn stop(&mut self);
}

/// Zeroed buffer of `len` elements, or `OutOfMemory`.
fn alloc_buffer<T: Clone + Default>(len: usize) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, T::default());
    Ok(buf)
}
