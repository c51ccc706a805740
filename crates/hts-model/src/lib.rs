//! Shared data model for the plate-assay workbench.
//!
//! Everything downstream of the readers speaks in these types: well
//! coordinates and plate formats, dense cell matrices, per-well layouts,
//! transfer records, reference statistics, and the per-plate result
//! containers the pipeline aggregates.

pub mod cell;
pub mod error;
pub mod event;
pub mod layout;
pub mod plate;
pub mod result;
pub mod transfer;

pub use cell::{Cell, CellMatrix};
pub use error::ModelError;
pub use event::PipelineEvent;
pub use layout::{ClassifiedPlate, PlateLayout, SampleMeta, WellAssignment, WellRole};
pub use plate::{PlateFormat, Quadrant, format_well, index_to_well, is_well, parse_well,
    rotate180, row_labels, well_list, well_to_index, well_z};
pub use result::{
    AssayCategory, DoseResponseSample, KineticFit, LogisticFit, MeltCurve, PlateNote,
    PlateResult, PlateStatus, Processed, RefClass, ReferenceStats, RunOutcome,
    SingleDoseSample,
};
pub use transfer::Transfer;
