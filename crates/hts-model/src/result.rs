//! Per-plate result containers and the run-level aggregate.

use serde::{Deserialize, Serialize};

use crate::layout::ClassifiedPlate;

/// Assay category selecting the downstream reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssayCategory {
    SingleDose,
    DoseResponse,
    ThermalShift,
    KineticRate,
}

impl std::fmt::Display for AssayCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SingleDose => "single-dose",
            Self::DoseResponse => "dose-response",
            Self::ThermalShift => "thermal-shift",
            Self::KineticRate => "kinetic-rate",
        };
        f.write_str(name)
    }
}

/// Reference-well class used for normalization and plate quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefClass {
    Solvent,
    Buffer,
    Control,
}

impl std::fmt::Display for RefClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Solvent => "solvent",
            Self::Buffer => "buffer",
            Self::Control => "control",
        };
        f.write_str(name)
    }
}

/// Per-plate reference statistics. Any class with no member wells leaves
/// its fields `None`, and Z' is `None` whenever an input it needs is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStats {
    pub solvent_mean: Option<f64>,
    pub solvent_sd: Option<f64>,
    pub buffer_mean: Option<f64>,
    pub buffer_sd: Option<f64>,
    pub control_mean: Option<f64>,
    pub control_sd: Option<f64>,
    pub z_prime: Option<f64>,
    pub z_prime_robust: Option<f64>,
}

/// Four-parameter logistic fit with 95% confidence bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticFit {
    pub top: f64,
    pub bottom: f64,
    pub ic50: f64,
    pub hill: f64,
    pub top_ci: (f64, f64),
    pub bottom_ci: (f64, f64),
    pub ic50_ci: (f64, f64),
    pub hill_ci: (f64, f64),
    pub r_square: f64,
}

/// Single-dose reduction for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleDoseSample {
    pub sample_id: String,
    pub concentration: Option<f64>,
    pub readings: Vec<f64>,
    pub normalized: Vec<f64>,
    pub mean: f64,
    /// Replicate SD; `None` for singleton samples.
    pub sd: Option<f64>,
}

/// Dose-response reduction for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseResponseSample {
    pub sample_id: String,
    /// Unique concentrations, ascending.
    pub concentrations: Vec<f64>,
    /// Raw replicate readings per concentration.
    pub readings: Vec<Vec<f64>>,
    /// Normalized replicate readings per concentration.
    pub normalized: Vec<Vec<f64>>,
    /// Replicate mean per concentration.
    pub mean_value: Vec<f64>,
    /// Replicate SD per concentration; `None` when all groups are singletons.
    pub error: Option<Vec<f64>>,
    /// `None` when the fit failed to converge.
    pub fit: Option<LogisticFit>,
}

/// Melt-curve reduction for one well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeltCurve {
    pub well: String,
    pub temperatures: Vec<f64>,
    pub fluorescence: Vec<f64>,
    /// Discrete first derivative of the smoothed curve.
    pub derivative: Vec<f64>,
    /// Temperature at the derivative maximum inside the search window.
    pub tm: Option<f64>,
}

/// Linear-rate reduction for one well of a time course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticFit {
    pub well: String,
    pub times: Vec<f64>,
    pub signal: Vec<f64>,
    pub slope: Option<f64>,
    pub intercept: Option<f64>,
    pub r_square: Option<f64>,
    /// Inclusive start and exclusive end indices of the fitted window.
    pub window: (usize, usize),
}

/// Category-specific processed block of one plate result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "data")]
pub enum Processed {
    SingleDose(Vec<SingleDoseSample>),
    DoseResponse(Vec<DoseResponseSample>),
    ThermalShift(Vec<MeltCurve>),
    KineticRate(Vec<KineticFit>),
}

/// Informational notes attached to a plate result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "note")]
pub enum PlateNote {
    InsufficientReferences { class: RefClass },
    FitFailed { sample: String },
    /// The raw file yielded more datasets than the run consumed.
    UnusedDatasets { names: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlateStatus {
    Processed,
    Failed,
    Cancelled,
}

/// Everything the pipeline produced for one destination plate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateResult {
    pub destination: String,
    pub category: AssayCategory,
    pub status: PlateStatus,
    pub plate: Option<ClassifiedPlate>,
    pub stats: Option<ReferenceStats>,
    pub processed: Option<Processed>,
    #[serde(default)]
    pub notes: Vec<PlateNote>,
    /// Failure reason when `status == Failed`.
    #[serde(default)]
    pub error: Option<String>,
}

impl PlateResult {
    pub fn failed(destination: &str, category: AssayCategory, reason: String) -> Self {
        Self {
            destination: destination.to_string(),
            category,
            status: PlateStatus::Failed,
            plate: None,
            stats: None,
            processed: None,
            notes: Vec::new(),
            error: Some(reason),
        }
    }

    pub fn cancelled(destination: &str, category: AssayCategory) -> Self {
        Self {
            destination: destination.to_string(),
            category,
            status: PlateStatus::Cancelled,
            plate: None,
            stats: None,
            processed: None,
            notes: Vec::new(),
            error: None,
        }
    }
}

/// Ordered run aggregate; plates appear in transfer-file destination order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOutcome {
    pub plates: Vec<PlateResult>,
    pub cancelled: bool,
}

impl RunOutcome {
    pub fn failed_count(&self) -> usize {
        self.plates
            .iter()
            .filter(|p| p.status == PlateStatus::Failed)
            .count()
    }

    pub fn processed_count(&self) -> usize {
        self.plates
            .iter()
            .filter(|p| p.status == PlateStatus::Processed)
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}
