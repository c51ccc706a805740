//! Events the pipeline pushes to its host, one per phase and plate.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::result::{AssayCategory, RefClass, ReferenceStats};

/// Append-only event stream observed by hosts (UI, batch driver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum PipelineEvent {
    PlateStarted {
        index: usize,
        destination: String,
    },
    RawDataRead {
        destination: String,
        file: PathBuf,
    },
    SamplesExtracted {
        destination: String,
        count: usize,
    },
    ReferencesComputed {
        destination: String,
        stats: ReferenceStats,
    },
    /// Emitted once per absent reference class.
    ReferencesMissing {
        destination: String,
        class: RefClass,
    },
    PlateProcessed {
        destination: String,
        category: AssayCategory,
    },
    PlateFailed {
        destination: String,
        reason: String,
    },
    RunCancelled,
    RunComplete {
        count: usize,
    },
}
