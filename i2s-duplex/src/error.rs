//! Error types for the driver.

use thiserror::Error;

use crate::bus::BusError;
use crate::lifecycle::Direction;
use crate::stream::SampleFormat;

/// Errors surfaced synchronously by activation, allocation and registration.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported sample format {0}")]
    UnsupportedFormat(SampleFormat),

    #[error("sample rate {rate} Hz: rate * 4 is not a multiple of the {chunk}-byte DMA chunk")]
    MisalignedRate { rate: u32, chunk: usize },

    #[error("invalid stream parameters: {0}")]
    InvalidParams(&'static str),

    #[error("could not install i2s driver: {0}")]
    Install(BusError),

    #[error("could not bind i2s pins: {0}")]
    Pins(BusError),

    #[error("could not configure i2s clock: {0}")]
    Clock(BusError),

    #[error("out of memory")]
    OutOfMemory,

    #[error("could not start stream worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{direction} worker exited before reporting start-up")]
    WorkerLost { direction: Direction },

    #[error("no provider registered as {0:?}")]
    NotFound(String),

    #[error("provider {0:?} already registered")]
    AlreadyRegistered(String),
}

/// Coarse classification of [`Error`], matching the codes a host expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    OutOfMemory,
    Spawn,
    NotFound,
    AlreadyRegistered,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedFormat(_)
            | Error::MisalignedRate { .. }
            | Error::InvalidParams(_)
            | Error::Install(_)
            | Error::Pins(_)
            | Error::Clock(_) => ErrorKind::InvalidArgument,
            Error::OutOfMemory => ErrorKind::OutOfMemory,
            Error::Spawn(_) | Error::WorkerLost { .. } => ErrorKind::Spawn,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
        }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that happen on a running stream's worker.
///
/// These never reach the allocation caller; they are logged and handed to the
/// stream's error handler, if one was given.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("{direction} stream stalled: {count} consecutive empty transfers")]
    Stalled { direction: Direction, count: u32 },
}
