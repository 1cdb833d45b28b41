/// Bytes moved per hardware transfer (one DMA buffer).
pub const DMA_CHUNK_BYTES: usize = 640;

/// Bytes per hardware word.
pub const HW_WORD_BYTES: usize = 4;

/// Hardware words per DMA chunk; also the number of application samples per chunk window.
pub const DMA_CHUNK_WORDS: usize = DMA_CHUNK_BYTES / HW_WORD_BYTES;

/// Number of DMA descriptors handed to the peripheral driver.
pub const DMA_BUFFER_COUNT: usize = 2;

/// Width of one hardware word on the bus, in bits.
pub const HW_BITS_PER_SAMPLE: u8 = 32;

/// Hardware slots clocked per frame (single right-justified channel).
pub const HW_SLOTS: u8 = 1;

/// Peripheral instance used for both directions.
pub const I2S_PORT: u8 = 0;

/// Left shift placing a 16-bit sample into a hardware word.
pub const SAMPLE_SHIFT: u32 = 17;

/// Name both providers are registered under.
pub const PROVIDER_NAME: &str = "i2s";

/// Default upper bound for one blocking hardware transfer, in milliseconds.
pub const DEFAULT_TRANSFER_TIMEOUT_MS: u64 = 100;

/// Consecutive stalled transfers tolerated before a stream is failed.
pub const DEFAULT_MAX_CONSECUTIVE_STALLS: u32 = 16;

/// First backoff delay after a stalled transfer, in milliseconds.
pub const DEFAULT_BACKOFF_BASE_MS: u32 = 1;

/// Ceiling for the stall backoff delay, in milliseconds.
pub const DEFAULT_BACKOFF_CAP_MS: u32 = 64;
