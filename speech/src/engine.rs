//! Native (on-device) synthesis engine interface.

use crate::{SpeakOptions, VoiceInfo};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Error type for native engine operations.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// The engine executable/capability is missing.
    #[error("engine not available: {0}")]
    EngineNotAvailable(String),

    /// Synthesis could not be started.
    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),

    /// IO error (process spawning, pipes).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lifecycle events emitted for one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeEvent {
    /// Audio output has begun.
    Started,
    /// The utterance finished naturally.
    Ended,
    /// The utterance was stopped or interrupted before completion.
    Cancelled,
    /// Synthesis or playback failed.
    Error(String),
}

impl NativeEvent {
    /// Returns true if no further events follow this one.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, NativeEvent::Started)
    }
}

/// Interface for an on-device speech synthesis engine.
///
/// One utterance is in flight at a time; starting a new one implicitly
/// cancels the previous utterance.
#[async_trait]
pub trait NativeEngine: Send + Sync {
    /// Returns the engine name/identifier.
    fn name(&self) -> &str;

    /// Lists the voices installed on this system.
    async fn voices(&self) -> Result<Vec<VoiceInfo>, SpeechError>;

    /// Speaks `text`, returning the utterance's event stream.
    ///
    /// The stream yields at most one [`NativeEvent::Started`] followed by
    /// exactly one terminal event.
    async fn speak(
        &self,
        text: &str,
        opts: &SpeakOptions,
    ) -> Result<mpsc::Receiver<NativeEvent>, SpeechError>;

    /// Stops the current utterance, if any. Idempotent.
    async fn stop(&self);
}
