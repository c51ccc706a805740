use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every engine rejected the file.
    #[error("not a tabular file: {path}")]
    NotTabular { path: PathBuf },

    #[error("worksheet {name} not found in {path}")]
    UnknownWorksheet { path: PathBuf, name: String },

    #[error("workbook manifest in {path} is malformed: {message}")]
    MalformedWorkbook { path: PathBuf, message: String },
}

impl IngestError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
