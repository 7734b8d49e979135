//! Paper model representing one paper mention from an alert email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::clean_text;

/// Status code for a record the reviewer has not yet decided on.
pub const STATUS_UNREVIEWED: i64 = 0;

/// Derive the identity key for a title: uppercased, with colons and
/// semicolons replaced by spaces and leading/trailing periods and
/// whitespace trimmed. Deterministic and pure; two records denote the
/// same paper iff their keys are equal.
pub fn identity_key(title: &str) -> String {
    title
        .trim_matches(|c: char| c == '.' || c == ' ')
        .replace([':', ';'], " ")
        .to_uppercase()
}

/// Identity equality predicate over two records.
pub fn same_identity(a: &Paper, b: &Paper) -> bool {
    a.idx == b.idx
}

/// A paper mention extracted from a scholarly alert email.
///
/// Identity is title-based only: the `idx` key is recomputed whenever the
/// title is set and is never written independently, so records from
/// different alerts (or different runs) that mention the same title
/// collapse to a single entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    /// Cleaned display title
    pub title: String,

    /// Identity key derived from the title
    idx: String,

    /// Cleaned authors line
    pub authors: String,

    /// Publication year, best-effort parse of the trailing
    /// comma-separated token of the raw authors line
    pub year: Option<i32>,

    /// Cleaned snippet/abstract text
    pub data: String,

    /// Source URL of the paper entry
    pub link: String,

    /// Subject of the alert email this record came from (provenance only)
    pub email_title: String,

    /// Enrichment summary, empty until filled by the reconciler
    #[serde(default)]
    pub tldr: String,

    /// Reviewer decision code; 0 = unreviewed
    #[serde(default)]
    pub status: i64,

    /// Set once, at parse time
    pub created_at: Option<DateTime<Utc>>,

    /// Set at parse time and refreshed on every enrichment attempt
    pub updated_at: Option<DateTime<Utc>>,
}

impl Paper {
    /// Create an empty record carrying only its provenance and link.
    pub fn new(email_title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            idx: String::new(),
            authors: String::new(),
            year: None,
            data: String::new(),
            link: link.into(),
            email_title: email_title.into(),
            tldr: String::new(),
            status: STATUS_UNREVIEWED,
            created_at: None,
            updated_at: None,
        }
    }

    /// Set the title, recomputing the identity key.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.idx = identity_key(&self.title);
    }

    /// Set the authors line from its raw HTML text: the display value is
    /// cleaned, and the year is parsed from the trailing comma-separated
    /// token of the raw string (`None` if that token is not a number).
    pub fn set_authors(&mut self, raw: &str) {
        self.authors = clean_text(raw);
        self.year = parse_year(raw);
    }

    /// The identity key. Empty until a title has been set.
    pub fn idx(&self) -> &str {
        &self.idx
    }

    pub fn is_unreviewed(&self) -> bool {
        self.status == STATUS_UNREVIEWED
    }

    pub fn has_tldr(&self) -> bool {
        !self.tldr.is_empty()
    }
}

impl std::fmt::Display for Paper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\nAuthors: {}\nEmail: {}",
            self.title, self.authors, self.email_title
        )
    }
}

/// Best-effort year parse from a raw authors line. The alert format puts
/// the year after the last comma ("A Author, B Author - Venue, 2024").
fn parse_year(raw: &str) -> Option<i32> {
    raw.replace(' ', "").rsplit(',').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key_derivation() {
        assert_eq!(identity_key("Attention Is All You Need"), "ATTENTION IS ALL YOU NEED");
        assert_eq!(identity_key("Title: subtitle; part"), "TITLE  SUBTITLE  PART");
        assert_eq!(identity_key(".Trailing dots. "), "TRAILING DOTS");
        assert_eq!(identity_key(""), "");
    }

    #[test]
    fn test_set_title_recomputes_idx() {
        let mut paper = Paper::new("alert", "http://example.com/1");
        paper.set_title("First Title");
        assert_eq!(paper.idx(), "FIRST TITLE");
        paper.set_title("Second: Title");
        assert_eq!(paper.idx(), "SECOND  TITLE");
    }

    #[test]
    fn test_same_identity_ignores_other_fields() {
        let mut a = Paper::new("alert one", "http://example.com/a");
        a.set_title("Shared Title");
        a.status = 1;
        let mut b = Paper::new("alert two", "http://example.com/b");
        b.set_title("shared title.");
        assert!(same_identity(&a, &b));

        let mut c = Paper::new("alert one", "http://example.com/a");
        c.set_title("Different Title");
        assert!(!same_identity(&a, &c));
    }

    #[test]
    fn test_set_authors_parses_year() {
        let mut paper = Paper::new("alert", "http://example.com/1");
        paper.set_authors("A Author, B Author - Journal of Things, 2023");
        assert_eq!(paper.authors, "A Author, B Author - Journal of Things, 2023");
        assert_eq!(paper.year, Some(2023));
    }

    #[test]
    fn test_set_authors_year_parse_failure_is_none() {
        let mut paper = Paper::new("alert", "http://example.com/1");
        paper.set_authors("A Author, B Author - Preprint");
        assert_eq!(paper.year, None);
    }

    #[test]
    fn test_set_authors_cleans_display_value() {
        let mut paper = Paper::new("alert", "http://example.com/1");
        paper.set_authors("  A Author, 2024  ");
        assert_eq!(paper.authors, "A Author, 2024");
        assert_eq!(paper.year, Some(2024));
    }

    #[test]
    fn test_new_record_is_unreviewed() {
        let paper = Paper::new("alert", "http://example.com/1");
        assert!(paper.is_unreviewed());
        assert!(!paper.has_tldr());
    }
}
