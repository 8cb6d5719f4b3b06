//! Incremental CSV persistence.
//!
//! Two files per collector:
//! - the collection log, created with a header on first write and only ever
//!   appended to afterwards
//! - the latest snapshot, overwritten with header + rows every cycle
//!
//! An existing log's header is never re-read or rewritten. A log created by
//! a build with a different column layout keeps its old header and the
//! appended rows follow the current layout; `inspect_log` reports that
//! mismatch, nothing here reconciles it.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use thiserror::Error;

use super::frame::rows_to_dataframe;
use crate::normalize::FlattenedRow;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one persist call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Nothing to write; neither file was touched.
    Empty,
    Written {
        rows: usize,
        /// Whether this call created the log file.
        log_created: bool,
    },
}

/// Writer for the collection log and the latest snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    log_path: PathBuf,
    latest_path: PathBuf,
}

impl SnapshotWriter {
    pub fn new(log_path: impl Into<PathBuf>, latest_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            latest_path: latest_path.into(),
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn latest_path(&self) -> &Path {
        &self.latest_path
    }

    /// Append a batch to the log and replace the latest snapshot with it.
    ///
    /// The log is written first; if that fails the snapshot is left as is.
    pub fn persist(&self, rows: &[FlattenedRow]) -> Result<WriteOutcome, WriteError> {
        if rows.is_empty() {
            return Ok(WriteOutcome::Empty);
        }

        let mut df = rows_to_dataframe(rows)?;

        let log_created = !self.log_path.exists();
        if log_created {
            ensure_parent(&self.log_path)?;
            write_csv(File::create(&self.log_path)?, &mut df, true)?;
        } else {
            let file = OpenOptions::new().append(true).open(&self.log_path)?;
            write_csv(file, &mut df, false)?;
        }

        ensure_parent(&self.latest_path)?;
        write_csv(File::create(&self.latest_path)?, &mut df, true)?;

        Ok(WriteOutcome::Written {
            rows: rows.len(),
            log_created,
        })
    }
}

/// Append rows to `log_path` and overwrite `latest_path` with them.
pub fn persist(
    rows: &[FlattenedRow],
    log_path: &Path,
    latest_path: &Path,
) -> Result<WriteOutcome, WriteError> {
    SnapshotWriter::new(log_path, latest_path).persist(rows)
}

fn ensure_parent(path: &Path) -> Result<(), WriteError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn write_csv(file: File, df: &mut DataFrame, header: bool) -> Result<(), WriteError> {
    CsvWriter::new(file).include_header(header).finish(df)?;
    Ok(())
}
