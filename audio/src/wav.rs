//! Canonical WAV container encoding.
//!
//! Writes the fixed 44-byte RIFF/WAVE header (PCM format code 1, single
//! `fmt ` chunk followed by one `data` chunk) that audio decoders accept
//! for raw PCM payloads. Parsing is intentionally limited to this canonical
//! layout.

use crate::PcmFormat;
use thiserror::Error;

/// Length of the canonical header: RIFF descriptor + `fmt ` + `data` chunk
/// headers.
pub const HEADER_LEN: usize = 44;

/// WAVE PCM format code.
const FORMAT_PCM: u16 = 1;

/// Error type for WAV parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WavError {
    #[error("not a RIFF/WAVE file")]
    NotWave,
    #[error("unsupported WAV layout: {0}")]
    Unsupported(String),
    #[error("truncated WAV data: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
}

/// Wraps raw PCM bytes in a canonical WAV container.
pub fn encode(pcm: &[u8], format: PcmFormat) -> Vec<u8> {
    let data_len = pcm.len() as u32;
    let mut out = Vec::with_capacity(HEADER_LEN + pcm.len());

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(HEADER_LEN as u32 + data_len - 8).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.sample_rate.to_le_bytes());
    out.extend_from_slice(&format.byte_rate().to_le_bytes());
    out.extend_from_slice(&format.block_align().to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);

    out
}

/// A parsed canonical WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub format: PcmFormat,
    /// Length of the `data` chunk in bytes.
    pub data_len: u32,
}

/// Parses the canonical 44-byte header produced by [`encode`].
pub fn parse_header(bytes: &[u8]) -> Result<WavHeader, WavError> {
    if bytes.len() < HEADER_LEN {
        return Err(WavError::Truncated {
            expected: HEADER_LEN,
            found: bytes.len(),
        });
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(WavError::NotWave);
    }
    if &bytes[12..16] != b"fmt " {
        return Err(WavError::Unsupported("first chunk is not fmt".into()));
    }
    let format_code = u16::from_le_bytes([bytes[20], bytes[21]]);
    if format_code != FORMAT_PCM {
        return Err(WavError::Unsupported(format!(
            "format code {format_code} is not PCM"
        )));
    }
    if &bytes[36..40] != b"data" {
        return Err(WavError::Unsupported("second chunk is not data".into()));
    }

    let channels = u16::from_le_bytes([bytes[22], bytes[23]]);
    let sample_rate = u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);
    let bits_per_sample = u16::from_le_bytes([bytes[34], bytes[35]]);
    let data_len = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]);

    Ok(WavHeader {
        format: PcmFormat::new(sample_rate, channels, bits_per_sample),
        data_len,
    })
}
