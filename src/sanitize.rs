//! Input sanitization.
//!
//! Escape-on-write: every user-supplied string is cleaned once, at the
//! engine boundary, before it reaches storage. Stored and exported text is
//! therefore already display-safe. Cleaning is not applied twice; calling
//! [`clean_text`] on already-escaped text would escape the ampersands
//! again.

/// Trim and HTML-escape a user-supplied string.
pub fn clean_text(input: &str) -> String {
    input
        .trim()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Filter a user-supplied URL.
///
/// Script-capable schemes (`javascript:`, `data:`, `vbscript:`) are dropped
/// and become the empty string; anything else passes through trimmed.
pub fn clean_url(input: &str) -> String {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("data:") || lower.starts_with("vbscript:")
    {
        return String::new();
    }
    trimmed.to_string()
}

/// Clean every tag in place, dropping ones that end up empty.
pub fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| clean_text(&t))
        .filter(|t| !t.is_empty())
        .collect()
}
