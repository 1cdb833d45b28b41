//! Negotiated stream parameters.

use std::fmt;

use crate::error::{Error, Result};
use crate::lifecycle::check_rate_alignment;

/// Application sample format. Only [`SampleFormat::S16Le`] is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Signed 16-bit, little-endian.
    S16Le,
    /// Signed 24-bit packed in 3 bytes, little-endian.
    S24_3Le,
    /// Signed 32-bit, little-endian.
    S32Le,
    /// 32-bit float, little-endian.
    F32Le,
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleFormat::S16Le => "S16_LE",
            SampleFormat::S24_3Le => "S24_3LE",
            SampleFormat::S32Le => "S32_LE",
            SampleFormat::F32Le => "FLOAT",
        };
        f.write_str(name)
    }
}

/// Parameters a stream is allocated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channels per frame.
    pub channels: u8,
    /// Period duration in milliseconds.
    pub ptime_ms: u32,
    pub format: SampleFormat,
}

impl StreamParams {
    /// 16-bit parameters for the given rate, channel count and period.
    pub const fn new(sample_rate: u32, channels: u8, ptime_ms: u32) -> Self {
        Self {
            sample_rate,
            channels,
            ptime_ms,
            format: SampleFormat::S16Le,
        }
    }

    /// Samples (across all channels) in one period, or `None` if the count
    /// does not fit in memory addresses.
    pub fn period_samples(&self) -> Option<usize> {
        let per_second = u64::from(self.sample_rate).checked_mul(u64::from(self.channels))?;
        let samples = per_second.checked_mul(u64::from(self.ptime_ms))? / 1000;
        usize::try_from(samples).ok()
    }

    /// Bytes in one application-format period.
    pub fn period_bytes(&self) -> Option<usize> {
        self.period_samples()?.checked_mul(2)
    }

    /// Reject anything the driver cannot stream, before touching hardware.
    ///
    /// Returns the period length in samples.
    pub fn validate(&self) -> Result<usize> {
        if self.format != SampleFormat::S16Le {
            return Err(Error::UnsupportedFormat(self.format));
        }
        if self.channels == 0 {
            return Err(Error::InvalidParams("channel count is zero"));
        }
        check_rate_alignment(self.sample_rate)?;
        match self.period_bytes() {
            None => Err(Error::InvalidParams("period too large")),
            Some(0) => Err(Error::InvalidParams("period holds no samples")),
            Some(bytes) => Ok(bytes / 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn period_sizes() {
        let params = StreamParams::new(16_000, 1, 20);
        assert_eq!(params.period_samples(), Some(320));
        assert_eq!(params.period_bytes(), Some(640));

        let stereo = StreamParams::new(48_000, 2, 10);
        assert_eq!(stereo.period_samples(), Some(960));
        assert_eq!(stereo.period_bytes(), Some(1920));
    }

    #[test]
    fn valid_params_pass() {
        assert_eq!(StreamParams::new(16_000, 1, 20).validate().unwrap(), 320);
        assert_eq!(StreamParams::new(8_000, 1, 20).validate().unwrap(), 160);
    }

    #[test]
    fn oversized_period_is_rejected() {
        // 4_294_967_200 is a multiple of 160, so only the period size can fail.
        let params = StreamParams::new(4_294_967_200, 255, u32::MAX);
        assert_eq!(params.period_samples(), None);
        assert_eq!(params.period_bytes(), None);

        let err = params.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidParams("period too large")));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn only_s16le_is_accepted() {
        for format in [SampleFormat::S24_3Le, SampleFormat::S32Le, SampleFormat::F32Le] {
            let params = StreamParams {
                format,
                ..StreamParams::new(16_000, 1, 20)
            };
            let err = params.validate().unwrap_err();
            assert!(matches!(err, Error::UnsupportedFormat(f) if f == format));
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn misaligned_rate_is_rejected() {
        let err = StreamParams::new(44_100, 2, 20).validate().unwrap_err();
        assert!(matches!(err, Error::MisalignedRate { rate: 44_100, .. }));
    }

    #[test]
    fn empty_periods_are_rejected() {
        assert!(matches!(
            StreamParams::new(16_000, 0, 20).validate(),
            Err(Error::InvalidParams(_))
        ));
        assert!(matches!(
            StreamParams::new(16_000, 1, 0).validate(),
            Err(Error::InvalidParams(_))
        ));
    }

    #[test]
    fn format_names() {
        assert_eq!(SampleFormat::S16Le.to_string(), "S16_LE");
        assert_eq!(SampleFormat::F32Le.to_string(), "FLOAT");
    }
}
