//! Category-specific assay reducers.

pub mod dose_response;
pub mod kinetic;
pub mod single_dose;
pub mod thermal;

pub use dose_response::FOUR_PL;
pub use kinetic::KineticOptions;
pub use thermal::ThermalOptions;

use hts_model::ReferenceStats;

/// Normalization scale `(solvent mean, control - solvent span)`. `None`
/// when either class is absent or the span is zero; callers fall back to
/// raw readings.
pub(crate) fn normalization(stats: &ReferenceStats) -> Option<(f64, f64)> {
    let solvent = stats.solvent_mean?;
    let control = stats.control_mean?;
    let span = control - solvent;
    (span != 0.0).then_some((solvent, span))
}
