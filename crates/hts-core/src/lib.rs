//! Plate-processing core: layout resolution, reference statistics, the
//! category-specific assay reducers, and the pipeline that drives them
//! plate by plate.

pub mod error;
pub mod pipeline;
pub mod process;
pub mod readings;
pub mod resolve;
pub mod stats;

pub use error::CoreError;
pub use pipeline::{RunRequest, run};
pub use process::{FOUR_PL, KineticOptions, ThermalOptions};
pub use readings::{Series, endpoint_readings, series_readings};
pub use resolve::resolve_layout;
pub use stats::reference_stats;
