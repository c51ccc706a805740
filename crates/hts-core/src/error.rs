use std::path::PathBuf;

use thiserror::Error;

/// Pipeline-level failures. Per-plate occurrences are captured on the
/// plate result; only transfer-file problems abort the run.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Ingest(#[from] hts_ingest::IngestError),

    #[error(transparent)]
    Parse(#[from] hts_parse::ParseError),

    #[error(transparent)]
    Model(#[from] hts_model::ModelError),

    #[error("no raw data file assigned to plate {destination}")]
    MissingRawFile { destination: String },

    #[error("{}: raw file yielded no datasets", path.display())]
    NoDatasets { path: PathBuf },

    #[error("{}: no dataset named {dataset}", path.display())]
    DatasetNotFound { dataset: String, path: PathBuf },

    #[error("dataset {dataset:?} has no usable {column} column")]
    MissingSeriesColumn { dataset: String, column: String },
}
