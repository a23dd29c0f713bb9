//! Remote (cloud) synthesis engine interface.

use async_trait::async_trait;
use thiserror::Error;

/// A synthesized audio payload, ready for a playback host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    /// Container bytes (e.g. a WAV file image).
    pub data: Vec<u8>,
    /// MIME type of `data` (e.g. `audio/wav`).
    pub mime_type: String,
}

impl AudioClip {
    /// Creates a clip from bytes and a MIME type.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }
}

/// Error type for cloud synthesis operations.
///
/// Variants map onto the failure taxonomy the orchestrator acts on:
/// configuration errors are recovered by falling back, network errors are
/// retried once via the secondary voice, protocol errors contribute to the
/// fallback path, and security errors are always fatal.
#[derive(Debug, Clone, Error)]
pub enum CloudError {
    /// Missing or unusable client configuration (empty key, empty text).
    #[error("cloud synthesis not configured: {0}")]
    Config(String),

    /// Endpoint validation failed; the request was never issued.
    #[error("endpoint rejected: {0}")]
    Security(String),

    /// The request exceeded its deadline and was cancelled.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Connectivity failure. The message is pre-redacted.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP response. The body is pre-redacted and capped.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// The response did not have the expected shape.
    #[error("malformed response: {0}")]
    Protocol(String),
}

impl CloudError {
    /// Returns true for timeout failures.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CloudError::Timeout(_))
    }

    /// Returns the HTTP status, for API-level failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            CloudError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if a different voice may still succeed.
    ///
    /// Security failures are excluded: a rejected endpoint stays rejected
    /// no matter which voice is requested.
    pub fn is_voice_retryable(&self) -> bool {
        !matches!(self, CloudError::Security(_))
    }
}

/// Interface for a remote generative speech engine.
///
/// Whole-utterance synthesis only: one call, one clip. The API key is
/// passed per call — callers read a fresh credential snapshot for every
/// request, so key edits apply immediately.
#[async_trait]
pub trait CloudEngine: Send + Sync {
    /// Synthesizes `text` with the named prebuilt voice.
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        api_key: &str,
    ) -> Result<AudioClip, CloudError>;
}
