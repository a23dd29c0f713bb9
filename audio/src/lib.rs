//! PCM/WAV handling and the isolated audio playback host.
//!
//! This crate provides:
//!
//! - [`PcmFormat`]: raw PCM stream parameters and byte math
//! - [`wav`]: canonical 44-byte WAV container encoding (and parsing, for
//!   consumers that need to look inside a container)
//! - [`PlayerHandle`]: a playback host confined to a dedicated OS thread,
//!   driven over channels and reporting lifecycle events back
//!
//! The playback host exists because `rodio::OutputStream` is `!Send` on
//! some platforms; confining it to one thread makes every caller naturally
//! `Send + Sync` without unsafe impls.

mod error;
mod pcm;
mod player;
pub mod wav;

pub use error::AudioError;
pub use pcm::PcmFormat;
pub use player::{HostRequest, PlayerEvent, PlayerHandle};
