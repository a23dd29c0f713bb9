//! Playback settings.
//!
//! The orchestrator loads a fresh snapshot per request through
//! [`SettingsStore`], so edits take effect on the next utterance without
//! any reload machinery. The file-backed store keeps its YAML under
//! `~/.aloud/config.yaml`.

use std::path::{Path, PathBuf};

use aloud_speech::Lang;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::PlaybackError;

const CONFIG_DIR: &str = ".aloud";
const CONFIG_FILE: &str = "config.yaml";

/// Engine selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Prefer an installed local voice; fall back to cloud when configured.
    #[default]
    Auto,
    /// Always use the native engine.
    Local,
    /// Always use the cloud engine.
    Cloud,
}

impl PlaybackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackMode::Auto => "auto",
            PlaybackMode::Local => "local",
            PlaybackMode::Cloud => "cloud",
        }
    }
}

/// Primary/secondary cloud voice names for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicePair {
    pub primary: String,
    pub secondary: String,
}

impl VoicePair {
    fn new(primary: &str, secondary: &str) -> Self {
        Self {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
        }
    }
}

/// Cloud engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudSettings {
    pub enabled: bool,
    pub api_key: String,
    pub zh: VoicePair,
    pub en: VoicePair,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            zh: VoicePair::new("Kore", "Aoede"),
            en: VoicePair::new("Puck", "Charon"),
        }
    }
}

impl CloudSettings {
    /// Returns the voice pair configured for `lang`.
    pub fn voices_for(&self, lang: Lang) -> &VoicePair {
        match lang {
            Lang::Zh => &self.zh,
            Lang::En => &self.en,
        }
    }

    /// Returns true when the cloud engine can actually be called.
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.api_key.is_empty()
    }
}

/// One settings snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: PlaybackMode,
    pub default_lang: Lang,
    pub speed: f32,
    pub pitch: f32,
    pub volume: f32,
    pub cloud: CloudSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: PlaybackMode::Auto,
            default_lang: Lang::Zh,
            speed: 1.0,
            pitch: 1.0,
            volume: 1.0,
            cloud: CloudSettings::default(),
        }
    }
}

/// Source of settings snapshots. Implementations must return fresh state
/// on every call — the orchestrator never caches.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<Settings, PlaybackError>;
}

/// YAML-file-backed settings store.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    /// Uses an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The conventional location, `~/.aloud/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `settings` to the file, creating parent directories.
    pub fn save(&self, settings: &Settings) -> Result<(), PlaybackError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PlaybackError::Config(format!("create {parent:?}: {e}")))?;
        }
        let yaml = serde_yaml::to_string(settings)
            .map_err(|e| PlaybackError::Config(e.to_string()))?;
        std::fs::write(&self.path, yaml)
            .map_err(|e| PlaybackError::Config(format!("write {:?}: {e}", self.path)))
    }
}

#[async_trait]
impl SettingsStore for FileSettings {
    async fn load(&self) -> Result<Settings, PlaybackError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(yaml) => serde_yaml::from_str(&yaml)
                .map_err(|e| PlaybackError::Config(format!("parse {:?}: {e}", self.path))),
            // No file yet means defaults, not an error.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(PlaybackError::Config(format!("read {:?}: {e}", self.path))),
        }
    }
}
