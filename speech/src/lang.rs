//! Lightweight zh/en language classification.
//!
//! Classifies a text sample from character-class ratios. Only the first
//! [`SAMPLE_CHARS`] characters are examined, so arbitrarily long inputs
//! stay cheap to classify.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of leading characters sampled by [`detect_lang`].
pub const SAMPLE_CHARS: usize = 1500;

/// CJK ratio above which a sample classifies as Chinese.
const CJK_THRESHOLD: f64 = 0.3;

/// Latin-letter ratio above which a sample classifies as English.
const LATIN_THRESHOLD: f64 = 0.4;

/// A playback language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Zh,
    En,
}

impl Lang {
    /// Returns the string representation of the language.
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::Zh => "zh",
            Lang::En => "en",
        }
    }

    /// Returns the locale prefix used to match installed voices.
    pub fn voice_prefix(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifies `text` as Chinese, English, or unknown (`None`).
///
/// Takes the first [`SAMPLE_CHARS`] characters, strips whitespace, digits,
/// and ASCII/CJK punctuation, and classifies what remains:
///
/// - empty remainder → `None`
/// - CJK fraction > 0.3 → `Some(Lang::Zh)`
/// - Latin-letter fraction > 0.4 → `Some(Lang::En)`
/// - otherwise → `None`
///
/// Deterministic, no side effects.
pub fn detect_lang(text: &str) -> Option<Lang> {
    let stripped: Vec<char> = text
        .chars()
        .take(SAMPLE_CHARS)
        .filter(|c| !is_stripped(*c))
        .collect();
    if stripped.is_empty() {
        return None;
    }

    let total = stripped.len() as f64;

    let cjk = stripped.iter().filter(|c| is_cjk(**c)).count() as f64;
    if cjk / total > CJK_THRESHOLD {
        return Some(Lang::Zh);
    }

    let latin = stripped.iter().filter(|c| c.is_ascii_alphabetic()).count() as f64;
    if latin / total > LATIN_THRESHOLD {
        return Some(Lang::En);
    }

    None
}

/// Returns true for characters in the CJK Unified Ideographs ranges
/// (base block, extension A, and compatibility ideographs).
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4e00}'..='\u{9fff}' | '\u{3400}'..='\u{4dbf}' | '\u{f900}'..='\u{faff}')
}

/// Characters excluded from the ratio computation: whitespace, digits, and
/// ASCII plus common CJK punctuation.
fn is_stripped(c: char) -> bool {
    if c.is_whitespace() || c.is_ascii_digit() || c.is_ascii_punctuation() {
        return true;
    }
    matches!(
        c,
        '，' | '。' | '；' | '：' | '！' | '？'
            | '\u{201c}' | '\u{201d}' | '\u{2018}' | '\u{2019}'
            | '（' | '）' | '【' | '】' | '《' | '》' | '、'
            | '\u{2014}' | '\u{2013}' | '\u{2026}' | '\u{00b7}'
    )
}
