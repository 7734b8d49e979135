//! Configuration management.
//!
//! Configuration is an explicit value passed into the components that
//! need it; nothing is read at module-load time. A missing or malformed
//! config file is a reported startup error.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// TLDR enrichment settings
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// File locations for the persisted store and archive log
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_keys: ApiKeys::default(),
            enrichment: EnrichmentConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Semantic Scholar API key (optional, for higher rate limits)
    #[serde(default)]
    pub semantic_scholar: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            semantic_scholar: std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok(),
        }
    }
}

/// Which persisted records are eligible for a TLDR lookup. Both variants
/// require an empty `tldr` and unreviewed status; the windowed variant
/// additionally bounds how old a record may be and enforces a re-query
/// cool-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityPolicy {
    /// Any unreviewed record without a summary
    Unreviewed,
    /// Unreviewed records created recently and not attempted lately
    FreshnessWindow,
}

/// TLDR enrichment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Eligibility policy for selecting records to enrich
    #[serde(default = "default_policy")]
    pub policy: EligibilityPolicy,

    /// Freshness window: only enrich records created within this many days
    #[serde(default = "default_created_within_days")]
    pub created_within_days: i64,

    /// Freshness window: skip records attempted within this many days
    #[serde(default = "default_cooldown_days")]
    pub cooldown_days: i64,

    /// Minimum wall-time spacing between requests, in seconds
    #[serde(default = "default_request_interval")]
    pub min_request_interval_secs: f32,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            created_within_days: default_created_within_days(),
            cooldown_days: default_cooldown_days(),
            min_request_interval_secs: default_request_interval(),
        }
    }
}

fn default_policy() -> EligibilityPolicy {
    EligibilityPolicy::Unreviewed
}

fn default_created_within_days() -> i64 {
    14
}

fn default_cooldown_days() -> i64 {
    7
}

fn default_request_interval() -> f32 {
    1.0
}

/// File locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Persisted record store (CSV)
    #[serde(default = "default_store_path")]
    pub store: PathBuf,

    /// Append-only archive log (TSV)
    #[serde(default = "default_archive_path")]
    pub archive: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            store: default_store_path(),
            archive: default_archive_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./papers.csv")
}

fn default_archive_path() -> PathBuf {
    PathBuf::from("./archive.tsv")
}

/// Load configuration from a file, with `SCHOLAR_DIGEST_*` environment
/// variables layered on top.
pub fn load_config(path: &PathBuf) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(config::Environment::with_prefix("SCHOLAR_DIGEST").separator("__"))
        .build()?;

    settings.try_deserialize()
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Config {
    Config::default()
}
