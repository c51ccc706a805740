//! Tabular reader: turns a file path plus an extension hint into a uniform
//! cell matrix, trying multiple engines for spreadsheet formats.
//!
//! Misnamed extensions are common in instrument exports, so every path
//! falls through the remaining engines before the reader gives up with
//! [`IngestError::NotTabular`].

pub mod delimited;
pub mod error;
pub mod reader;
pub mod workbook;

pub use delimited::{detect_delimiter, read_delimited};
pub use error::IngestError;
pub use reader::{EngineKind, TabularSource, read_tabular};
pub use workbook::{Worksheet, worksheet_names};
