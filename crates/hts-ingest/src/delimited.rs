//! Delimiter-autodetecting reader for csv/txt exports.

use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use hts_model::{Cell, CellMatrix};

use crate::error::IngestError;

const CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Picks the delimiter whose per-line count is largest and most consistent
/// over the first non-empty lines. Defaults to comma for single-column
/// files.
pub fn detect_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(20)
        .collect();
    let mut best = b',';
    let mut best_score = 0usize;
    for candidate in CANDIDATES {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| line.bytes().filter(|b| *b == candidate).count())
            .collect();
        let present = counts.iter().filter(|c| **c > 0).count();
        let total: usize = counts.iter().sum();
        // Consistency first: a delimiter seen on every probed line beats a
        // larger raw count confined to a few lines.
        let score = present * 1000 + total.min(999);
        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }
    best
}

/// Reads a delimited text file into a cell matrix, coercing numeric-looking
/// fields to numbers.
pub fn read_delimited(path: &Path) -> Result<CellMatrix, IngestError> {
    let bytes = fs::read(path).map_err(|source| IngestError::io(path, source))?;
    if bytes.contains(&0) {
        // Binary content; let a spreadsheet engine have it instead.
        return Err(IngestError::NotTabular {
            path: path.to_path_buf(),
        });
    }
    let text = String::from_utf8_lossy(&bytes);
    let delimiter = detect_delimiter(&text);
    debug!(path = %path.display(), delimiter = %(delimiter as char), "reading delimited file");

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|_| IngestError::NotTabular {
            path: path.to_path_buf(),
        })?;
        let row: Vec<Cell> = record.iter().map(parse_cell).collect();
        rows.push(row);
    }
    Ok(CellMatrix::new(rows))
}

fn parse_cell(raw: &str) -> Cell {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(number) => Cell::Number(number),
        Err(_) => Cell::Text(trimmed.to_string()),
    }
}
