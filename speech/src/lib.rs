//! Interfaces for speech playback.
//!
//! This crate provides the shared vocabulary for the aloud workspace:
//!
//! - [`Lang`] and [`detect_lang`]: lightweight zh/en language classification
//! - [`VoiceInfo`] and [`SpeakOptions`]: voice metadata and synthesis options
//! - [`NativeEngine`] and [`NativeEvent`]: on-device synthesis interface
//! - [`CloudEngine`], [`AudioClip`] and [`CloudError`]: remote synthesis interface
//! - [`redact_secret`]: secret scrubbing for surfaced error text
//!
//! # Example
//!
//! ```rust
//! use aloud_speech::{detect_lang, Lang};
//!
//! assert_eq!(detect_lang("The quick brown fox jumps over the lazy dog"), Some(Lang::En));
//! assert_eq!(detect_lang("今天天气很好，我们出去散步吧"), Some(Lang::Zh));
//! assert_eq!(detect_lang("123 456"), None);
//! ```

mod cloud;
mod engine;
mod lang;
mod util;
mod voice;

pub use cloud::*;
pub use engine::*;
pub use lang::*;
pub use util::*;
pub use voice::*;
