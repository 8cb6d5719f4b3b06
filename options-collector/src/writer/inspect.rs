//! Collection log inspection.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use polars::prelude::*;

use super::csv_log::WriteError;
use crate::normalize::column_names;

/// Summary of a collection log on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSummary {
    /// Header columns as found in the file.
    pub header: Vec<String>,
    /// Whether the header equals the current row schema.
    pub header_matches: bool,
    /// Data lines after the header.
    pub rows: usize,
    /// Distinct collection timestamps; only computed for a matching header.
    pub cycles: Option<usize>,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
}

impl LogSummary {
    /// Columns expected by the current schema but missing from the header.
    pub fn missing_columns(&self) -> Vec<String> {
        column_names()
            .into_iter()
            .filter(|c| !self.header.contains(c))
            .collect()
    }
}

/// Read a collection log and summarize it.
pub fn inspect_log(path: &Path) -> Result<LogSummary, WriteError> {
    if !path.exists() {
        return Err(WriteError::FileNotFound(path.display().to_string()));
    }

    let mut lines = BufReader::new(File::open(path)?).lines();
    let header: Vec<String> = match lines.next() {
        Some(line) => line?.split(',').map(|s| s.trim().to_string()).collect(),
        None => Vec::new(),
    };
    let mut rows = 0;
    for line in lines {
        if !line?.is_empty() {
            rows += 1;
        }
    }

    let header_matches = header == column_names();
    let mut summary = LogSummary {
        header,
        header_matches,
        rows,
        cycles: None,
        first_timestamp: None,
        last_timestamp: None,
    };

    if !header_matches || rows == 0 {
        return Ok(summary);
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let timestamps: BTreeSet<String> = df
        .column("timestamp")?
        .as_materialized_series()
        .str()?
        .into_iter()
        .flatten()
        .map(|s| s.to_string())
        .collect();

    summary.cycles = Some(timestamps.len());
    summary.first_timestamp = timestamps.first().cloned();
    summary.last_timestamp = timestamps.last().cloned();
    Ok(summary)
}
