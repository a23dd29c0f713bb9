//! Gemini Speech Generation API client.
//!
//! Synthesizes speech through the `generativeLanguage` REST endpoint
//! (<https://ai.google.dev/gemini-api/docs/speech-generation>) and only
//! ever talks to that one host. Raw PCM replies are repackaged into a WAV
//! container so any audio decoder can play them.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use aloud_geminispeech::Client;
//!
//! # async fn demo() -> Result<(), aloud_speech::CloudError> {
//! let client = Client::builder().build();
//! let clip = client.synthesize("Hello, world!", "Kore", "your-api-key").await?;
//! // clip.data holds a playable WAV image, clip.mime_type == "audio/wav"
//! # Ok(())
//! # }
//! ```
//!
//! # Failure taxonomy
//!
//! All operations return [`aloud_speech::CloudError`]: configuration
//! errors for missing key/text, a security error when the endpoint host
//! does not match the pinned API host (the request is then never issued),
//! timeout/network errors for transport failures, API errors carrying the
//! redacted response body for non-success statuses, and protocol errors
//! for malformed response shapes.

mod client;
mod tts;
pub mod voices;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL, DEFAULT_MODEL, EXPECTED_HOST,
    MAX_TEXT_CHARS};
pub use tts::{
    GenerateContentRequest, GenerationConfig, PrebuiltVoiceConfig, RequestContent,
    SpeechConfig, TextPart, VoiceConfig,
};

/// Result type alias for Gemini speech operations.
pub type Result<T> = std::result::Result<T, aloud_speech::CloudError>;
