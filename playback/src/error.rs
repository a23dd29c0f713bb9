//! Orchestrator error type and error-shortening policy.

use aloud_speech::{CloudError, redact_secret, truncate_chars};
use thiserror::Error;

/// Maximum characters of an unrecognized error surfaced in status.
const MAX_SHORT_ERROR_CHARS: usize = 60;

/// Error type for playback requests.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Empty text is a no-op; nothing was started.
    #[error("no text to speak")]
    EmptyText,

    /// The active surface had no usable selection.
    #[error("no selection (min 3 chars)")]
    SelectionTooShort,

    /// Cloud mode was requested explicitly but is not configured.
    #[error("{0} — configure cloud speech in settings")]
    CloudNotConfigured(String),

    /// Both cloud voices failed. The message is sanitized.
    #[error("cloud synthesis failed: {0}")]
    Synthesis(String),

    /// The native engine refused the utterance.
    #[error("local speech failed: {0}")]
    Native(String),

    /// The audio host could not be created or refused the payload.
    #[error("audio host failed: {0}")]
    Host(String),

    /// A newer request or a stop superseded this one.
    #[error("superseded by a newer request")]
    Interrupted,

    /// Settings could not be loaded or are invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The orchestrator task is gone.
    #[error("playback service unavailable")]
    Closed,
}

/// Condenses a cloud failure into the short status string: recognizable
/// patterns map to fixed codes, anything else is redacted and capped.
pub(crate) fn short_cloud_error(err: &CloudError, api_key: &str) -> String {
    match err {
        CloudError::Timeout(_) => "Timeout".to_string(),
        CloudError::Api { status, .. } if (400..=599).contains(status) => status.to_string(),
        CloudError::Network(_) => "Network error".to_string(),
        other => truncate_chars(
            &redact_secret(&other.to_string(), api_key),
            MAX_SHORT_ERROR_CHARS,
        ),
    }
}
