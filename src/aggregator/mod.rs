//! Identity-keyed aggregation of paper records.
//!
//! The aggregator holds an ordered set of distinct records (identity is
//! the title-derived `idx` key) and converts to and from the flat tabular
//! form used by the persisted store. Merging is first-seen-wins: records
//! loaded from the store keep their review status and enrichment state,
//! and freshly parsed duplicates are discarded.

use tracing::debug;

use crate::models::{same_identity, Paper};
use crate::utils::{parse_iso, to_iso};

/// Fixed column order of the persisted tabular form.
pub const COLUMNS: [&str; 11] = [
    "title",
    "authors",
    "email_title",
    "link",
    "tldr",
    "year",
    "idx",
    "data",
    "status",
    "created_at",
    "updated_at",
];

/// Errors raised when rebuilding records from tabular rows.
#[derive(Debug, thiserror::Error)]
pub enum TabularError {
    /// The persisted store is missing a required column. Fatal: the
    /// store schema no longer matches this version of the pipeline.
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
}

/// An ordered collection of distinct paper records.
#[derive(Debug, Clone, Default)]
pub struct PaperAggregator {
    papers: Vec<Paper>,
}

impl PaperAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    /// The records in insertion order.
    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    /// Mutable access for in-place enrichment. Titles must not be
    /// rewritten through this, or identity uniqueness could break.
    pub fn papers_mut(&mut self) -> &mut [Paper] {
        &mut self.papers
    }

    /// Append a record unless one with equal identity is already present.
    /// Returns whether the record was inserted.
    pub fn add(&mut self, paper: Paper) -> bool {
        if self.papers.iter().any(|p| same_identity(p, &paper)) {
            return false;
        }
        self.papers.push(paper);
        true
    }

    /// Remove the first record with equal identity, if any. Absent
    /// identity is a no-op, not an error.
    pub fn remove(&mut self, paper: &Paper) -> bool {
        match self.papers.iter().position(|p| same_identity(p, paper)) {
            Some(pos) => {
                self.papers.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Fold another aggregator's records in, in its iteration order.
    /// First-seen-wins: records already present are retained untouched.
    pub fn merge(&mut self, other: PaperAggregator) {
        for paper in other.papers {
            self.add(paper);
        }
    }

    /// Drop records without an authors line (malformed legacy entries).
    /// Returns the number of records removed.
    pub fn clean_missing_authors(&mut self) -> usize {
        let before = self.papers.len();
        self.papers.retain(|p| !p.authors.is_empty());
        let dropped = before - self.papers.len();
        if dropped > 0 {
            debug!(dropped, "dropped records with missing authors");
        }
        dropped
    }

    /// Export one row per record in [`COLUMNS`] order. Null year and
    /// timestamps serialize as empty strings, not numeric placeholders.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.papers
            .iter()
            .map(|p| {
                vec![
                    p.title.clone(),
                    p.authors.clone(),
                    p.email_title.clone(),
                    p.link.clone(),
                    p.tldr.clone(),
                    p.year.map(|y| y.to_string()).unwrap_or_default(),
                    p.idx().to_string(),
                    p.data.clone(),
                    p.status.to_string(),
                    p.created_at.as_ref().map(to_iso).unwrap_or_default(),
                    p.updated_at.as_ref().map(to_iso).unwrap_or_default(),
                ]
            })
            .collect()
    }

    /// Rebuild records from a tabular source. All required columns must
    /// be present; missing cells within a row default to empty. The
    /// identity key is rederived from the stored title, keeping the
    /// key-is-a-function-of-title invariant even for legacy rows.
    pub fn from_rows(header: &[String], rows: &[Vec<String>]) -> Result<Self, TabularError> {
        let mut indices = [0usize; COLUMNS.len()];
        for (slot, name) in indices.iter_mut().zip(COLUMNS) {
            *slot = header
                .iter()
                .position(|h| h == name)
                .ok_or(TabularError::MissingColumn(name))?;
        }
        let cell = |row: &[String], col: usize| -> String {
            row.get(indices[col]).cloned().unwrap_or_default()
        };

        let mut aggregator = Self::new();
        for row in rows {
            let mut paper = Paper::new(cell(row, 2), cell(row, 3));
            paper.set_title(cell(row, 0));
            paper.authors = cell(row, 1);
            paper.tldr = cell(row, 4);
            paper.year = cell(row, 5).trim().parse().ok();
            paper.data = cell(row, 7);
            paper.status = cell(row, 8).trim().parse().unwrap_or(0);
            paper.created_at = parse_iso(&cell(row, 9));
            paper.updated_at = parse_iso(&cell(row, 10));
            aggregator.papers.push(paper);
        }
        Ok(aggregator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::now_utc;

    fn paper(title: &str, email: &str) -> Paper {
        let mut p = Paper::new(email, format!("http://example.com/{}", title.len()));
        p.set_title(title);
        p.set_authors("A Author, B Author - Venue, 2022");
        p.data = "A snippet.".to_string();
        let now = now_utc();
        p.created_at = Some(now);
        p.updated_at = Some(now);
        p
    }

    #[test]
    fn test_add_deduplicates_by_identity() {
        let mut agg = PaperAggregator::new();
        assert!(agg.add(paper("Some Title", "alert one")));
        assert!(!agg.add(paper("some title.", "alert two")));
        assert_eq!(agg.len(), 1);
        assert_eq!(agg.papers()[0].email_title, "alert one");
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut agg = PaperAggregator::new();
        agg.add(paper("First", "a"));
        agg.add(paper("Second", "a"));
        agg.add(paper("Third", "a"));
        let titles: Vec<_> = agg.papers().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut agg = PaperAggregator::new();
        agg.add(paper("Present", "a"));
        assert!(!agg.remove(&paper("Absent", "a")));
        assert_eq!(agg.len(), 1);
        assert!(agg.remove(&paper("Present", "b")));
        assert!(agg.is_empty());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut agg = PaperAggregator::new();
        agg.add(paper("One", "a"));
        agg.add(paper("Two", "a"));
        let copy = agg.clone();
        agg.merge(copy);
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn test_merge_first_seen_wins() {
        let mut reviewed = paper("Shared Title", "old alert");
        reviewed.status = 1;
        reviewed.tldr = "x".to_string();

        let mut persisted = PaperAggregator::new();
        persisted.add(reviewed);

        let mut incoming = PaperAggregator::new();
        incoming.add(paper("Shared Title", "new alert"));
        incoming.add(paper("Brand New", "new alert"));

        persisted.merge(incoming);
        assert_eq!(persisted.len(), 2);
        let kept = &persisted.papers()[0];
        assert_eq!(kept.status, 1);
        assert_eq!(kept.tldr, "x");
        assert_eq!(kept.email_title, "old alert");
    }

    #[test]
    fn test_tabular_round_trip() {
        let mut agg = PaperAggregator::new();
        let mut enriched = paper("Enriched: Paper", "a");
        enriched.tldr = "Short summary".to_string();
        enriched.status = 2;
        agg.add(enriched);
        let mut no_year = paper("No Year", "b");
        no_year.year = None;
        agg.add(no_year);

        let header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
        let rows = agg.to_rows();
        let loaded = PaperAggregator::from_rows(&header, &rows).unwrap();

        assert_eq!(loaded.len(), agg.len());
        for (a, b) in agg.papers().iter().zip(loaded.papers()) {
            assert_eq!(a.idx(), b.idx());
            assert_eq!(a.status, b.status);
            assert_eq!(a.tldr, b.tldr);
            assert_eq!(a.year, b.year);
            assert_eq!(a.created_at, b.created_at);
            assert_eq!(a.updated_at, b.updated_at);
        }
    }

    #[test]
    fn test_null_year_serializes_as_empty() {
        let mut agg = PaperAggregator::new();
        let mut p = paper("No Year", "a");
        p.year = None;
        agg.add(p);
        let rows = agg.to_rows();
        assert_eq!(rows[0][5], "");
    }

    #[test]
    fn test_from_rows_missing_column_is_fatal() {
        let header: Vec<String> = COLUMNS
            .iter()
            .filter(|c| **c != "status")
            .map(|c| c.to_string())
            .collect();
        let err = PaperAggregator::from_rows(&header, &[]).unwrap_err();
        match err {
            TabularError::MissingColumn(name) => assert_eq!(name, "status"),
        }
    }

    #[test]
    fn test_from_rows_empty_status_defaults_to_zero() {
        let header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
        let mut row = vec![String::new(); COLUMNS.len()];
        row[0] = "A Title".to_string();
        let loaded = PaperAggregator::from_rows(&header, &[row]).unwrap();
        assert_eq!(loaded.papers()[0].status, 0);
        assert_eq!(loaded.papers()[0].year, None);
    }

    #[test]
    fn test_clean_missing_authors() {
        let mut agg = PaperAggregator::new();
        agg.add(paper("Kept", "a"));
        let mut orphan = paper("Orphan", "a");
        orphan.authors = String::new();
        agg.add(orphan);
        assert_eq!(agg.clean_missing_authors(), 1);
        assert_eq!(agg.len(), 1);
        assert_eq!(agg.papers()[0].title, "Kept");
    }
}
