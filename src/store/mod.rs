//! Persistence for the aggregated record set.
//!
//! The store is a CSV file with the fixed 11-column schema; it is
//! authoritative at load time and overwritten at end of run. A second
//! concurrent run is not guarded against and risks lost updates. The
//! archive is a separate append-only TSV log, one line per record per
//! run, kept for historical analysis and never rewritten.

mod archive;

pub use archive::append_archive;

use std::path::Path;
use tracing::info;

use crate::aggregator::{PaperAggregator, TabularError, COLUMNS};

/// Errors from reading or writing the persisted store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The store's columns no longer match the expected schema
    #[error(transparent)]
    Tabular(#[from] TabularError),
}

/// Load the persisted record set. A missing file is a first run and
/// yields an empty aggregator; a present file with a mismatched schema
/// is fatal.
pub fn load_store(path: &Path) -> Result<PaperAggregator, StoreError> {
    if !path.exists() {
        info!(path = %path.display(), "no persisted store, starting empty");
        return Ok(PaperAggregator::new());
    }

    let mut reader = csv::Reader::from_path(path)?;
    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }

    let aggregator = PaperAggregator::from_rows(&header, &rows)?;
    info!(path = %path.display(), count = aggregator.len(), "loaded persisted store");
    Ok(aggregator)
}

/// Overwrite the persisted store with the current record set.
pub fn save_store(path: &Path, aggregator: &PaperAggregator) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(COLUMNS)?;
    for row in aggregator.to_rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    info!(path = %path.display(), count = aggregator.len(), "saved persisted store");
    Ok(())
}
