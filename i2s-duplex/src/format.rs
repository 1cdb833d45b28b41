//! Sample conversion between application and hardware word formats.
//!
//! The application side uses signed 16-bit samples; the peripheral expects one
//! 32-bit word per sample, with the sample placed in the high-order field:
//!
//! ```text
//! bit 31                 17 16                0
//! ┌──────────────────────┬───────────────────┐
//! │ sample bits 14..0    │ 0 (17 bits)       │
//! └──────────────────────┴───────────────────┘
//! ```
//!
//! The forward mapping is a plain `<< 17` with wraparound, so bit 15 of the
//! sample is shifted out. Samples in `-16384..=16383` survive a round trip
//! unchanged; anything outside that range comes back as its 15-bit truncation.
//!
//! All functions are pure and operate on one chunk window at a time.

use crate::constants::SAMPLE_SHIFT;

/// Convert one application sample to a hardware word.
#[inline]
pub const fn sample_to_word(sample: i16) -> u32 {
    (sample as i32 as u32) << SAMPLE_SHIFT
}

/// Extract the application sample embedded in a hardware word.
#[inline]
pub const fn word_to_sample(word: u32) -> i16 {
    ((word as i32) >> SAMPLE_SHIFT) as i16
}

/// Convert a window of application samples into hardware words.
///
/// # Panics
///
/// Debug-asserts that both slices have the same length.
pub fn to_hw_words(dest: &mut [u32], src: &[i16]) {
    debug_assert_eq!(dest.len(), src.len());

    for (word, &sample) in dest.iter_mut().zip(src) {
        *word = sample_to_word(sample);
    }
}

/// Convert a window of hardware words back into application samples.
///
/// # Panics
///
/// Debug-asserts that both slices have the same length.
pub fn from_hw_words(dest: &mut [i16], src: &[u32]) {
    debug_assert_eq!(dest.len(), src.len());

    for (sample, &word) in dest.iter_mut().zip(src) {
        *sample = word_to_sample(word);
    }
}
