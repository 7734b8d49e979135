//! Append-only archive log.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use tracing::info;

use crate::models::Paper;

/// Append one `title\tauthors\tstatus` line per record to the archive
/// log, creating the file (and parent directories) on first use.
/// Returns the number of lines written.
pub fn append_archive(path: &Path, papers: &[Paper]) -> io::Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for paper in papers {
        writeln!(file, "{}\t{}\t{}", paper.title, paper.authors, paper.status)?;
    }
    file.flush()?;

    info!(path = %path.display(), count = papers.len(), "appended to archive log");
    Ok(papers.len())
}
