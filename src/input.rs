// file: src/input.rs
// description: CSV input adapter producing the raw ordered dataset
// reference: https://docs.rs/csv

use crate::error::Result;
use std::path::Path;
use tracing::{debug, info};

/// One input row: ordered (column name, raw cell value) pairs, exactly as
/// they appeared in the source file.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub cells: Vec<(String, String)>,
}

/// Already-parsed tabular input. The pipeline core treats this as the
/// interface boundary to the ingestion collaborator.
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawDataset {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read a CSV file into a `RawDataset`, preserving row and column order.
/// Short rows are padded with blank cells; extra cells beyond the header
/// are dropped.
pub fn read_csv(path: &Path) -> Result<RawDataset> {
    info!("Reading CSV input from {}", path.display());

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(RawRow { cells });
    }

    debug!(
        "Read {} rows with {} columns from {}",
        rows.len(),
        headers.len(),
        path.display()
    );

    Ok(RawDataset { headers, rows })
}
