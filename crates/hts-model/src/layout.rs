//! User-declared plate layouts and the per-well classification the
//! resolver derives from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::plate::PlateFormat;

/// Role of one well on a destination plate.
///
/// `Control`, `Buffer` and `Reference` come only from the user layout;
/// `Sample` and `Solvent` may also be inferred from transfer records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "name")]
pub enum WellRole {
    Sample,
    Control,
    Solvent,
    Buffer,
    Reference(String),
    Empty,
}

/// Per-sample metadata declared alongside the layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleMeta {
    /// Declared concentration series, ascending.
    #[serde(default)]
    pub concentrations: Vec<f64>,
    /// Numerical protein/target identifier, when registered.
    #[serde(default)]
    pub protein_id: Option<u64>,
    /// Explicit replicate group; defaults to (sample, concentration).
    #[serde(default)]
    pub replicate_group: Option<String>,
}

/// User-declared layout for one destination plate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateLayout {
    pub format: PlateFormat,
    /// Explicit roles by well index; unlisted wells are inferred.
    #[serde(default)]
    pub roles: BTreeMap<usize, WellRole>,
    /// Declared concentration by well index (overrides transfer-derived).
    #[serde(default)]
    pub concentrations: BTreeMap<usize, f64>,
    #[serde(default)]
    pub samples: BTreeMap<String, SampleMeta>,
}

impl PlateLayout {
    pub fn empty(format: PlateFormat) -> Self {
        Self {
            format,
            roles: BTreeMap::new(),
            concentrations: BTreeMap::new(),
            samples: BTreeMap::new(),
        }
    }
}

/// Resolved classification of one well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellAssignment {
    pub role: WellRole,
    pub sample_id: Option<String>,
    pub concentration: Option<f64>,
    /// Total transferred volume into the well.
    pub volume: Option<f64>,
    pub solvent: Option<String>,
}

impl WellAssignment {
    pub fn empty() -> Self {
        Self {
            role: WellRole::Empty,
            sample_id: None,
            concentration: None,
            volume: None,
            solvent: None,
        }
    }
}

/// One destination plate with every well classified, in index order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedPlate {
    pub destination: String,
    pub format: PlateFormat,
    pub wells: Vec<WellAssignment>,
}

impl ClassifiedPlate {
    /// Indices of wells carrying the given role.
    pub fn wells_with_role(&self, role: &WellRole) -> Vec<usize> {
        self.wells
            .iter()
            .enumerate()
            .filter(|(_, w)| &w.role == role)
            .map(|(i, _)| i)
            .collect()
    }

    /// Replicate groups: equal (sample id, concentration) within the plate.
    pub fn replicate_groups(&self) -> BTreeMap<(String, Option<u64>), Vec<usize>> {
        let mut groups: BTreeMap<(String, Option<u64>), Vec<usize>> = BTreeMap::new();
        for (index, well) in self.wells.iter().enumerate() {
            if well.role != WellRole::Sample {
                continue;
            }
            let Some(sample) = &well.sample_id else {
                continue;
            };
            let key = (sample.clone(), well.concentration.map(f64::to_bits));
            groups.entry(key).or_default().push(index);
        }
        groups
    }
}
