//! Text normalization for raw HTML fragments.

use once_cell::sync::Lazy;
use regex::Regex;

/// Backslash hex-escape artifacts left over from email encoding, e.g. `\xe2\x80`.
static ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\\[xX]\w\w)+").expect("valid escape pattern"));

/// Clean a raw text fragment extracted from alert HTML.
///
/// If the fragment starts with `[`, everything up to and including the first
/// `]` is dropped (Scholar prefixes titles with tags like `[PDF]` or citation
/// markers like `[3]`). Hex-escape artifacts are stripped and surrounding
/// whitespace trimmed. Never fails; empty input yields empty output.
pub fn clean_text(raw: &str) -> String {
    let mut text = raw;
    if text.starts_with('[') {
        if let Some(end) = text.find(']') {
            text = &text[end + 1..];
        }
    }
    ESCAPE_RE.replace_all(text, "").trim().to_string()
}
