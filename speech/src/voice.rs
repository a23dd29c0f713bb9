//! Voice metadata and synthesis options.

use crate::Lang;
use serde::{Deserialize, Serialize};

/// An installed voice reported by a native engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Engine-specific voice identifier (e.g. `en-us`).
    pub id: String,
    /// Locale/language tag of the voice (e.g. `en-US`, `zh`).
    pub lang: String,
    /// Human-readable name, if the engine provides one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl VoiceInfo {
    /// Creates a voice record with an empty display name.
    pub fn new(id: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lang: lang.into(),
            name: String::new(),
        }
    }

    /// Returns true if this voice serves the given language.
    pub fn matches_lang(&self, lang: Lang) -> bool {
        self.lang.to_lowercase().starts_with(lang.voice_prefix())
    }
}

/// Options for a single utterance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeakOptions {
    /// Target language of the utterance.
    pub lang: Lang,
    /// Playback rate multiplier (1.0 = normal).
    pub rate: f32,
    /// Pitch multiplier (1.0 = normal).
    pub pitch: f32,
    /// Volume in `0.0..=1.0`.
    pub volume: f32,
}

impl SpeakOptions {
    /// Creates options for `lang` with neutral rate, pitch and volume.
    pub fn new(lang: Lang) -> Self {
        Self {
            lang,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}
