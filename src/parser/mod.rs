//! Google Scholar alert email parsing.
//!
//! An alert email lists each paper as an anchor carrying the
//! `gse_alrt_title` class inside an `<h3>` heading, followed by a sibling
//! element with the authors line and another with the snippet text.
//! Malformed entries are skipped individually so one broken entry never
//! aborts the rest of the email; a post-parse validation pass catches
//! wholesale format drift instead.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::models::Paper;
use crate::utils::{clean_text, now_utc};

/// CSS selector for the anchor marking a paper title in a Scholar alert.
const TITLE_SELECTOR: &str = "a.gse_alrt_title";

/// Errors surfaced by the alert parser.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The title selector failed to compile (programming error surfaced
    /// as a value to keep the parsing API total)
    #[error("invalid selector: {0}")]
    Selector(String),

    /// A parsed record failed the required-field validation pass. This is
    /// fatal for the batch: it signals that the upstream alert format has
    /// drifted, not that one entry was malformed.
    #[error("parsed record \"{title}\" has empty {field}; alert format may have changed")]
    Validation { title: String, field: &'static str },
}

/// Parse one alert email body into validated paper records.
///
/// Returns zero or more records; entries with missing structure are
/// skipped with a diagnostic. Fails only on post-parse validation,
/// which indicates the alert HTML no longer matches the expected format.
pub fn parse_alert(email_title: &str, html: &str) -> Result<Vec<Paper>, ParseError> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse(TITLE_SELECTOR).map_err(|e| ParseError::Selector(e.to_string()))?;

    let mut papers = Vec::new();
    for anchor in document.select(&selector) {
        if let Some(paper) = parse_entry(email_title, &anchor) {
            papers.push(paper);
        }
    }

    debug!(email_title, count = papers.len(), "parsed alert entries");
    check_valid_papers(&papers)?;
    Ok(papers)
}

/// Parse a single title anchor into a record; `None` skips the entry.
fn parse_entry(email_title: &str, anchor: &ElementRef) -> Option<Paper> {
    // The title anchor of a real paper entry sits inside an <h3> heading.
    let heading = anchor.parent().and_then(ElementRef::wrap)?;
    if heading.value().name() != "h3" {
        return None;
    }

    let link = match anchor.value().attr("href") {
        Some(href) if !href.is_empty() => href,
        _ => {
            warn!(email_title, "title anchor without href, skipping entry");
            return None;
        }
    };

    let mut siblings = heading.next_siblings().filter_map(ElementRef::wrap);
    let (authors_el, data_el) = match (siblings.next(), siblings.next()) {
        (Some(authors), Some(data)) => (authors, data),
        _ => {
            warn!(email_title, "entry missing authors or snippet sibling, skipping");
            return None;
        }
    };

    let title = clean_text(&anchor.text().collect::<String>());
    let authors_raw = authors_el.text().collect::<String>();
    let snippet = clean_text(&data_el.text().collect::<String>());

    if clean_text(&authors_raw).is_empty() || snippet.is_empty() {
        warn!(email_title, %title, "entry with empty authors or snippet, skipping");
        return None;
    }

    let mut paper = Paper::new(email_title, link);
    paper.set_title(title);
    paper.set_authors(&authors_raw);
    paper.data = snippet;
    let now = now_utc();
    paper.created_at = Some(now);
    paper.updated_at = Some(now);
    Some(paper)
}

/// Assert every record carries the fields the rest of the pipeline
/// depends on. Entries with degraded formatting are dropped during
/// parsing, so an invalid record here means the format itself changed.
pub fn check_valid_papers(papers: &[Paper]) -> Result<(), ParseError> {
    for paper in papers {
        let failed = if paper.idx().is_empty() {
            Some("idx")
        } else if paper.title.is_empty() {
            Some("title")
        } else if paper.link.is_empty() {
            Some("link")
        } else if paper.authors.is_empty() {
            Some("authors")
        } else if paper.data.is_empty() {
            Some("data")
        } else {
            None
        };

        if let Some(field) = failed {
            return Err(ParseError::Validation {
                title: paper.title.clone(),
                field,
            });
        }
    }
    Ok(())
}
