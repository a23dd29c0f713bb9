//! Playback status tracking.
//!
//! One [`PlaybackStatus`] exists per orchestrator and is mutated only by
//! its handlers; everything observers see is a clone of it. The store
//! itself carries no policy — a patch assigns exactly the fields it names.

use aloud_speech::Lang;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
}

impl PlaybackState {
    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Loading => "loading",
            PlaybackState::Playing => "playing",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of the current playback session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    /// Engine label (`Local`, `Cloud`, `Auto→Local`, `Auto→Cloud`).
    pub engine: Option<String>,
    pub lang: Option<Lang>,
    /// Voice label (e.g. `EN Puck`, `zh (system)`).
    pub voice: Option<String>,
    /// Short human-readable error from the last failed session.
    pub error: Option<String>,
}

/// A partial status update; only fields set on the patch are applied.
#[derive(Debug, Clone, Default)]
pub struct StatusPatch {
    pub state: Option<PlaybackState>,
    pub engine: Option<Option<String>>,
    pub lang: Option<Option<Lang>>,
    pub voice: Option<Option<String>>,
    pub error: Option<Option<String>>,
}

impl StatusPatch {
    /// A session is starting: loading state, language known, error cleared.
    pub fn loading(lang: Lang) -> Self {
        Self {
            state: Some(PlaybackState::Loading),
            lang: Some(Some(lang)),
            error: Some(None),
            ..Default::default()
        }
    }

    /// Audio output has begun.
    pub fn playing() -> Self {
        Self {
            state: Some(PlaybackState::Playing),
            ..Default::default()
        }
    }

    /// A session ended in failure.
    pub fn idle_with_error(error: impl Into<String>) -> Self {
        Self {
            state: Some(PlaybackState::Idle),
            error: Some(Some(error.into())),
            ..Default::default()
        }
    }

    /// Sets the engine label.
    pub fn engine(label: impl Into<String>) -> Self {
        Self {
            engine: Some(Some(label.into())),
            ..Default::default()
        }
    }

    /// Sets the voice label.
    pub fn voice(label: impl Into<String>) -> Self {
        Self {
            voice: Some(Some(label.into())),
            ..Default::default()
        }
    }

    /// Clears the voice label on this patch.
    pub fn clear_voice(mut self) -> Self {
        self.voice = Some(None);
        self
    }
}

/// Owner of the single process-wide status value.
#[derive(Debug, Default)]
pub struct StatusStore {
    status: PlaybackStatus,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the current status.
    pub fn get(&self) -> PlaybackStatus {
        self.status.clone()
    }

    /// Applies `patch`, overwriting only the fields it sets.
    pub fn patch(&mut self, patch: StatusPatch) {
        if let Some(state) = patch.state {
            self.status.state = state;
        }
        if let Some(engine) = patch.engine {
            self.status.engine = engine;
        }
        if let Some(lang) = patch.lang {
            self.status.lang = lang;
        }
        if let Some(voice) = patch.voice {
            self.status.voice = voice;
        }
        if let Some(error) = patch.error {
            self.status.error = error;
        }
    }

    /// Returns to idle with every other field cleared.
    pub fn reset(&mut self) {
        self.status = PlaybackStatus::default();
    }
}
