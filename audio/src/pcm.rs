//! Raw PCM stream parameters.

use std::time::Duration;

/// Parameters of an interleaved little-endian signed PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Bits per sample (16 for s16le).
    pub bits_per_sample: u16,
}

impl PcmFormat {
    /// s16le mono at 24 000 Hz — the format generative speech endpoints
    /// return their inline audio in.
    pub const S16LE_MONO_24K: PcmFormat = PcmFormat::new(24_000, 1, 16);

    /// Creates a format description.
    pub const fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    /// Bytes per sample frame (all channels).
    pub const fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    /// Bytes per second of audio.
    pub const fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    /// Returns the duration of `len` bytes of audio in this format.
    pub fn duration(&self, len: usize) -> Duration {
        let rate = self.byte_rate() as u64;
        if rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(len as u64 * 1_000_000 / rate)
    }
}
