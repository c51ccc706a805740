use thiserror::Error;

use hts_model::ModelError;

#[derive(Debug, Error)]
pub enum ParseError {
    /// The verification keyword was not found where the rule set expects it.
    #[error("verification failed: keyword {keyword:?} not found")]
    VerificationFailed { keyword: String },

    #[error("anchor keyword {keyword:?} not found")]
    KeywordNotFound { keyword: String },

    #[error("anchor out of bounds at ({row}, {column})")]
    AnchorOutOfBounds { row: i64, column: i64 },

    /// A labelled grid's label band does not match the canonical row
    /// letters / column numbers.
    #[error("grid misaligned: {message}")]
    GridMisaligned { message: String },

    #[error("required transfer column missing: {name}")]
    MissingColumn { name: String },

    #[error("rule set names {expected} datasets, file yields {found}")]
    NameCardinality { expected: usize, found: usize },

    #[error(transparent)]
    Model(#[from] ModelError),
}
