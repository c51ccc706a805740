use thiserror::Error;

/// Errors from the shared data model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid well coordinate: {well}")]
    InvalidWell { well: String },

    #[error("well index {index} out of range for a {format}-well plate")]
    IndexOutOfRange { index: usize, format: u16 },

    #[error("plate format mismatch: expected {expected}, got {actual}")]
    PlateFormatMismatch { expected: u16, actual: u16 },

    #[error("unsupported plate size: {wells} wells (expected 96, 384 or 1536)")]
    UnsupportedPlateSize { wells: usize },
}
