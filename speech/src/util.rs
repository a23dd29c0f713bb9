//! Shared helpers.

/// Placeholder substituted for a redacted secret.
pub const REDACTED: &str = "[REDACTED]";

/// Removes every occurrence of `secret` from `text`.
///
/// Applied to any string that may cross the boundary to a UI surface or a
/// log line; the secret must never appear there, whole or in part.
pub fn redact_secret(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, REDACTED)
}

/// Truncates `text` to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
