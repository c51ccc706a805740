//! Engine dispatch: extension hint chooses the first engine, the rest are
//! fallbacks.

use std::path::Path;

use calamine::{Data, Range, Xls, Xlsx, open_workbook};
use tracing::{debug, warn};

use hts_model::{Cell, CellMatrix};

use crate::delimited::read_delimited;
use crate::error::IngestError;

/// Engine that actually produced the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Delimited,
    Xlsx,
    Xls,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Delimited => "delimited",
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
        };
        f.write_str(name)
    }
}

/// Uniform output of the tabular reader.
#[derive(Debug, Clone)]
pub struct TabularSource {
    pub matrix: CellMatrix,
    /// Worksheet the cells came from, for spreadsheet engines.
    pub worksheet: Option<String>,
    pub engine: EngineKind,
}

/// Reads a file into a cell matrix, trying engines in an order derived from
/// the extension hint. A preferred engine, when given, is tried before the
/// hint-derived order. All engines rejecting yields `NotTabular`.
pub fn read_tabular(
    path: &Path,
    extension_hint: &str,
    worksheet: Option<&str>,
    preferred: Option<EngineKind>,
) -> Result<TabularSource, IngestError> {
    let order = engine_order(extension_hint, preferred);
    let mut unknown_worksheet = None;
    for engine in order {
        match try_engine(path, engine, worksheet) {
            Ok(source) => {
                debug!(path = %path.display(), engine = %engine, "tabular read succeeded");
                return Ok(source);
            }
            Err(error @ IngestError::UnknownWorksheet { .. }) => {
                // The container opened but the requested sheet is absent;
                // remember this over a generic NotTabular.
                unknown_worksheet = Some(error);
            }
            Err(error) => {
                debug!(path = %path.display(), engine = %engine, error = %error, "engine rejected file");
            }
        }
    }
    if let Some(error) = unknown_worksheet {
        return Err(error);
    }
    warn!(path = %path.display(), "every engine rejected the file");
    Err(IngestError::NotTabular {
        path: path.to_path_buf(),
    })
}

fn engine_order(extension_hint: &str, preferred: Option<EngineKind>) -> Vec<EngineKind> {
    let mut order = match extension_hint.to_ascii_lowercase().as_str() {
        "csv" | "txt" => vec![EngineKind::Delimited],
        "xlsx" | "xlsm" => vec![EngineKind::Xlsx, EngineKind::Xls, EngineKind::Delimited],
        "xls" => vec![EngineKind::Xls, EngineKind::Xlsx, EngineKind::Delimited],
        _ => vec![EngineKind::Delimited, EngineKind::Xlsx, EngineKind::Xls],
    };
    if let Some(engine) = preferred {
        order.retain(|e| *e != engine);
        order.insert(0, engine);
    }
    order
}

fn try_engine(
    path: &Path,
    engine: EngineKind,
    worksheet: Option<&str>,
) -> Result<TabularSource, IngestError> {
    match engine {
        EngineKind::Delimited => Ok(TabularSource {
            matrix: read_delimited(path)?,
            worksheet: None,
            engine,
        }),
        EngineKind::Xlsx => {
            let mut workbook: Xlsx<_> =
                open_workbook(path).map_err(|_| IngestError::NotTabular {
                    path: path.to_path_buf(),
                })?;
            read_spreadsheet(path, &mut workbook, worksheet, engine)
        }
        EngineKind::Xls => {
            let mut workbook: Xls<_> =
                open_workbook(path).map_err(|_| IngestError::NotTabular {
                    path: path.to_path_buf(),
                })?;
            read_spreadsheet(path, &mut workbook, worksheet, engine)
        }
    }
}

fn read_spreadsheet<R>(
    path: &Path,
    workbook: &mut R,
    worksheet: Option<&str>,
    engine: EngineKind,
) -> Result<TabularSource, IngestError>
where
    R: calamine::Reader<std::io::BufReader<std::fs::File>>,
{
    let names = workbook.sheet_names();
    let resolved = match worksheet {
        Some(requested) => {
            if !names.iter().any(|n| n == requested) {
                return Err(IngestError::UnknownWorksheet {
                    path: path.to_path_buf(),
                    name: requested.to_string(),
                });
            }
            requested.to_string()
        }
        None => names.first().cloned().ok_or_else(|| IngestError::NotTabular {
            path: path.to_path_buf(),
        })?,
    };
    let range = workbook
        .worksheet_range(&resolved)
        .map_err(|_| IngestError::NotTabular {
            path: path.to_path_buf(),
        })?;
    Ok(TabularSource {
        matrix: range_to_matrix(&range),
        worksheet: Some(resolved),
        engine,
    })
}

fn range_to_matrix(range: &Range<Data>) -> CellMatrix {
    let rows = range
        .rows()
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect();
    CellMatrix::new(rows)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.trim().to_string())
            }
        }
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}
