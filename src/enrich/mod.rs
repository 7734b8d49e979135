//! TLDR enrichment of persisted records.
//!
//! The reconciler selects records eligible for enrichment, queries an
//! external search-by-title source one record at a time, and applies
//! partial, timestamped updates: a hit fills `tldr`, any other outcome
//! leaves it untouched, and `updated_at` is refreshed after every attempt
//! so a future run can tell when a record was last tried. Requests are
//! paced to a fixed wall-time budget, not an adaptive backoff.

mod semantic;

pub mod mock;

pub use semantic::SemanticScholarClient;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use indicatif::ProgressBar;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::{EligibilityPolicy, EnrichmentConfig};
use crate::models::Paper;
use crate::utils::now_utc;

/// Errors from the enrichment source.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// Network or HTTP transport error
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape
    #[error("parse error: {0}")]
    Parse(String),
}

/// Result of one title lookup: the top match's TLDR text, if it has one.
/// `None` is a miss, not an error; the record stays retryable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TldrLookup {
    pub tldr: Option<String>,
}

/// A search-by-title source of TLDR summaries.
#[async_trait]
pub trait TldrSource: Send + Sync {
    async fn lookup(&self, title: &str) -> Result<TldrLookup, EnrichError>;
}

/// Counts from one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    /// Records selected by the eligibility policy
    pub selected: usize,
    /// Lookups that produced a TLDR
    pub filled: usize,
    /// Lookups that completed without a TLDR
    pub missed: usize,
    /// Lookups that failed outright (network, parse)
    pub failed: usize,
}

static QUERY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9 ]+").expect("valid query pattern"));

/// Reduce a title to the character set the search endpoint matches well:
/// runs of anything outside `[A-Za-z0-9 ]` collapse to a single space.
pub fn normalize_query(title: &str) -> String {
    QUERY_RE.replace_all(title.trim(), " ").into_owned()
}

/// Idempotent, rate-limited TLDR reconciler.
pub struct Enricher<S: TldrSource> {
    source: S,
    config: EnrichmentConfig,
}

impl<S: TldrSource> Enricher<S> {
    pub fn new(source: S, config: EnrichmentConfig) -> Self {
        Self { source, config }
    }

    /// Whether a record should be queried this pass.
    fn is_eligible(&self, paper: &Paper, now: DateTime<Utc>) -> bool {
        if paper.has_tldr() || !paper.is_unreviewed() {
            return false;
        }
        match self.config.policy {
            EligibilityPolicy::Unreviewed => true,
            EligibilityPolicy::FreshnessWindow => {
                let created_recently = paper
                    .created_at
                    .map(|t| now - t < ChronoDuration::days(self.config.created_within_days))
                    .unwrap_or(false);
                let cooled_down = paper
                    .updated_at
                    .map(|t| now - t > ChronoDuration::days(self.config.cooldown_days))
                    .unwrap_or(true);
                created_recently && cooled_down
            }
        }
    }

    /// Run one enrichment pass over the records, in stable order.
    ///
    /// Each attempt refreshes the record's `updated_at`, success or miss.
    /// Lookup failures are logged and treated as misses; they never abort
    /// the pass. Requests are spaced by sleeping the residual of the
    /// configured per-request budget (no sleep after the last request).
    pub async fn enrich(&self, papers: &mut [Paper]) -> EnrichSummary {
        let now = now_utc();
        let eligible: Vec<usize> = papers
            .iter()
            .enumerate()
            .filter(|(_, p)| self.is_eligible(p, now))
            .map(|(i, _)| i)
            .collect();

        info!(count = eligible.len(), "querying TLDR for eligible records");

        let interval = Duration::from_secs_f32(self.config.min_request_interval_secs);
        let bar = ProgressBar::new(eligible.len() as u64);
        let total = eligible.len();
        let mut summary = EnrichSummary {
            selected: total,
            ..EnrichSummary::default()
        };

        for (pos, i) in eligible.into_iter().enumerate() {
            let started = Instant::now();
            let query = normalize_query(&papers[i].title);

            match self.source.lookup(&query).await {
                Ok(TldrLookup { tldr: Some(text) }) => {
                    debug!(title = %papers[i].title, "TLDR found");
                    papers[i].tldr = text;
                    summary.filled += 1;
                }
                Ok(TldrLookup { tldr: None }) => {
                    debug!(title = %papers[i].title, "no TLDR for record");
                    summary.missed += 1;
                }
                Err(err) => {
                    warn!(
                        title = %papers[i].title,
                        error = %err,
                        "TLDR lookup failed, leaving record for a later run"
                    );
                    summary.failed += 1;
                }
            }
            papers[i].updated_at = Some(now_utc());
            bar.inc(1);

            if pos + 1 < total {
                let elapsed = started.elapsed();
                if elapsed < interval {
                    sleep(interval - elapsed).await;
                }
            }
        }

        bar.finish_and_clear();
        info!(
            filled = summary.filled,
            missed = summary.missed,
            failed = summary.failed,
            "enrichment pass complete"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockTldrSource;
    use super::*;
    use crate::config::EligibilityPolicy;

    fn paper(title: &str, status: i64, tldr: &str) -> Paper {
        let mut p = Paper::new("alert", "http://example.com/1");
        p.set_title(title);
        p.set_authors("A Author, 2024");
        p.data = "Snippet.".to_string();
        p.status = status;
        p.tldr = tldr.to_string();
        let now = now_utc();
        p.created_at = Some(now);
        p.updated_at = Some(now);
        p
    }

    fn enricher(source: MockTldrSource) -> Enricher<MockTldrSource> {
        let config = EnrichmentConfig {
            min_request_interval_secs: 0.0,
            ..EnrichmentConfig::default()
        };
        Enricher::new(source, config)
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("Graphs: A Survey!"), "Graphs  A Survey ");
        assert_eq!(normalize_query("  plain title  "), "plain title");
        assert_eq!(normalize_query("self-attention"), "self attention");
    }

    #[test]
    fn test_eligibility_requires_empty_tldr_and_unreviewed() {
        let e = enricher(MockTldrSource::new());
        let now = now_utc();
        assert!(e.is_eligible(&paper("A", 0, ""), now));
        assert!(!e.is_eligible(&paper("B", 1, ""), now));
        assert!(!e.is_eligible(&paper("C", 0, "summary"), now));
        assert!(!e.is_eligible(&paper("D", 1, "summary"), now));
    }

    #[test]
    fn test_freshness_window_policy() {
        let config = EnrichmentConfig {
            policy: EligibilityPolicy::FreshnessWindow,
            ..EnrichmentConfig::default()
        };
        let e = Enricher::new(MockTldrSource::new(), config);
        let now = now_utc();

        // Created recently, last attempted long ago: eligible
        let mut fresh = paper("A", 0, "");
        fresh.created_at = Some(now - ChronoDuration::days(3));
        fresh.updated_at = Some(now - ChronoDuration::days(10));
        assert!(e.is_eligible(&fresh, now));

        // Too old
        let mut stale = paper("B", 0, "");
        stale.created_at = Some(now - ChronoDuration::days(30));
        stale.updated_at = Some(now - ChronoDuration::days(10));
        assert!(!e.is_eligible(&stale, now));

        // Attempted too recently
        let mut cooling = paper("C", 0, "");
        cooling.created_at = Some(now - ChronoDuration::days(3));
        cooling.updated_at = Some(now - ChronoDuration::days(1));
        assert!(!e.is_eligible(&cooling, now));
    }

    #[tokio::test]
    async fn test_hit_fills_tldr_and_refreshes_updated_at() {
        let source = MockTldrSource::new();
        source.push_tldr("A crisp summary");
        let e = enricher(source);

        let mut papers = vec![paper("Needs Summary", 0, "")];
        papers[0].updated_at = Some(now_utc() - ChronoDuration::days(1));
        let before = papers[0].updated_at.unwrap();
        let summary = e.enrich(&mut papers).await;

        assert_eq!(summary.filled, 1);
        assert_eq!(papers[0].tldr, "A crisp summary");
        assert!(papers[0].updated_at.unwrap() > before);
        assert!(papers[0].created_at.unwrap() <= papers[0].updated_at.unwrap());
    }

    #[tokio::test]
    async fn test_miss_leaves_tldr_but_advances_updated_at() {
        let source = MockTldrSource::new();
        source.push_miss();
        let e = enricher(source);

        let mut papers = vec![paper("Unknown Paper", 0, "")];
        papers[0].updated_at = Some(now_utc() - ChronoDuration::days(1));
        let before = papers[0].updated_at.unwrap();
        let summary = e.enrich(&mut papers).await;

        assert_eq!(summary.missed, 1);
        assert!(papers[0].tldr.is_empty());
        assert!(papers[0].updated_at.unwrap() > before);
    }

    #[tokio::test]
    async fn test_lookup_failure_does_not_abort_pass() {
        let source = MockTldrSource::new();
        source.push_error(EnrichError::Network("connection reset".into()));
        source.push_tldr("Second summary");
        let e = enricher(source);

        let mut papers = vec![paper("First", 0, ""), paper("Second", 0, "")];
        let summary = e.enrich(&mut papers).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.filled, 1);
        assert!(papers[0].tldr.is_empty());
        assert_eq!(papers[1].tldr, "Second summary");
        assert!(papers[0].updated_at.unwrap() > papers[0].created_at.unwrap());
    }

    #[tokio::test]
    async fn test_reviewed_records_are_never_queried() {
        let source = MockTldrSource::new();
        source.push_tldr("should not be used");
        let e = enricher(source);

        let mut papers = vec![paper("Already Reviewed", 1, "")];
        let summary = e.enrich(&mut papers).await;

        assert_eq!(summary.selected, 0);
        assert!(papers[0].tldr.is_empty());
        assert!(e.source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_queries_use_normalized_titles() {
        let source = MockTldrSource::new();
        source.push_miss();
        let e = enricher(source);

        let mut papers = vec![paper("Graphs: A Survey?", 0, "")];
        e.enrich(&mut papers).await;

        assert_eq!(e.source.calls(), vec!["Graphs  A Survey ".to_string()]);
    }

    #[tokio::test]
    async fn test_pacing_spaces_requests() {
        let source = MockTldrSource::new();
        source.push_miss();
        source.push_miss();
        source.push_miss();
        let config = EnrichmentConfig {
            min_request_interval_secs: 0.2,
            ..EnrichmentConfig::default()
        };
        let e = Enricher::new(source, config);

        let mut papers = vec![paper("One", 0, ""), paper("Two", 0, ""), paper("Three", 0, "")];
        let started = std::time::Instant::now();
        e.enrich(&mut papers).await;

        // Two inter-request gaps; no sleep after the final request.
        assert!(started.elapsed() >= Duration::from_millis(400));
    }
}
