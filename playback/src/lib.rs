//! Playback orchestration for aloud.
//!
//! The orchestrator receives play/stop requests from any number of
//! surfaces, classifies the text's language, picks a synthesis engine
//! (native vs. cloud, with per-language primary/secondary voice
//! fallback), routes cloud audio to the isolated playback host, and
//! tracks a single process-wide [`PlaybackStatus`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aloud_playback::{FileSettings, PlaybackBuilder, SurfaceId};
//!
//! # async fn demo(native: Arc<dyn aloud_speech::NativeEngine>,
//! #               cloud: Arc<dyn aloud_speech::CloudEngine>) {
//! let settings = FileSettings::new("/tmp/aloud.yaml");
//! let playback = PlaybackBuilder::new(Box::new(settings), native, cloud).spawn();
//!
//! let receipt = playback.play("Hello world", SurfaceId(1)).await.unwrap();
//! println!("spoken via {} engine", receipt.engine.as_str());
//! playback.stop().await.unwrap();
//! # }
//! ```

mod error;
mod host;
mod orchestrator;
mod settings;
mod status;
mod surface;

pub use error::PlaybackError;
pub use host::{AudioHost, HostFactory, RodioHostFactory};
pub use orchestrator::{
    EngineChoice, MIN_SELECTION_CHARS, PlayReceipt, PlaybackBuilder, PlaybackHandle,
};
pub use settings::{
    CloudSettings, FileSettings, PlaybackMode, Settings, SettingsStore, VoicePair,
};
pub use status::{PlaybackState, PlaybackStatus, StatusPatch, StatusStore};
pub use surface::{NoSelection, Selection, SelectionSource, SurfaceId, SurfaceNotice,
    SurfaceRegistry};

#[cfg(test)]
mod tests;
