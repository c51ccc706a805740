//! Acoustic-dispenser transfer records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One droplet transfer from the dispenser log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub destination_plate: String,
    pub destination_well: String,
    pub source_plate: Option<String>,
    pub source_well: Option<String>,
    /// Blank for solvent-only (backfill) transfers.
    pub sample_id: Option<String>,
    /// Transferred volume in the unit the rule set declares.
    pub volume: Option<f64>,
    pub solvent: Option<String>,
    /// True when the row carried no sample but did carry solvent.
    #[serde(default)]
    pub solvent_only: bool,
    /// Reason from the transfer file's exceptions block, when flagged.
    #[serde(default)]
    pub exception_reason: Option<String>,
    /// Vendor columns preserved verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Transfer {
    pub fn is_exception(&self) -> bool {
        self.exception_reason.is_some()
    }

    pub fn has_sample(&self) -> bool {
        self.sample_id.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}
