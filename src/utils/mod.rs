//! Utility functions shared across the pipeline.
//!
//! - [`clean_text`]: normalize raw HTML text fragments (bracket tags,
//!   escape artifacts, whitespace)
//! - [`now_utc`] / [`to_iso`] / [`parse_iso`]: canonical UTC timestamps
//!   for the persisted store

mod clean;
mod time;

pub use clean::clean_text;
pub use time::{now_utc, parse_iso, to_iso};
