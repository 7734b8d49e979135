//! # Scholar Digest
//!
//! Deduplicates scholarly paper alert emails into a persisted tabular
//! store and enriches the records with TLDR summaries.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Paper, identity keys)
//! - [`parser`]: HTML alert email parsing
//! - [`aggregator`]: First-seen-wins merge and tabular conversion
//! - [`store`]: CSV persistence and the append-only archive log
//! - [`enrich`]: Rate-limited TLDR enrichment via Semantic Scholar
//! - [`config`]: Configuration management
//! - [`utils`]: Text cleanup and timestamp helpers

pub mod aggregator;
pub mod config;
pub mod enrich;
pub mod models;
pub mod parser;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use aggregator::PaperAggregator;
pub use models::Paper;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
