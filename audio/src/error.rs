//! Error types for the playback host.

use thiserror::Error;

/// Error type for audio host operations.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The audio output device could not be opened.
    #[error("audio output unavailable: {0}")]
    Output(String),

    /// The payload bytes could not be decoded into playable audio.
    #[error("decode error: {0}")]
    Decode(String),

    /// The host thread is gone; no further commands can be served.
    #[error("audio host thread died")]
    HostDied,
}
