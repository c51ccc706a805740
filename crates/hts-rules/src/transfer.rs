//! Transfer-file rule sets: table anchoring, column mapping, exceptions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hts_model::PlateFormat;

use crate::error::RuleSetError;
use crate::raw::{Engine, FileType, Verification};

/// Canonical transfer-file column names the parser maps dialect labels to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalColumn {
    SourcePlate,
    SourceWell,
    DestPlate,
    DestWell,
    SampleId,
    Volume,
    Solvent,
}

impl CanonicalColumn {
    pub const ALL: [Self; 7] = [
        Self::SourcePlate,
        Self::SourceWell,
        Self::DestPlate,
        Self::DestWell,
        Self::SampleId,
        Self::Volume,
        Self::Solvent,
    ];

    /// Columns the parser cannot proceed without.
    pub fn is_required(self) -> bool {
        !matches!(self, Self::Solvent)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourcePlate => "SourcePlate",
            Self::SourceWell => "SourceWell",
            Self::DestPlate => "DestPlate",
            Self::DestWell => "DestWell",
            Self::SampleId => "SampleID",
            Self::Volume => "Volume",
            Self::Solvent => "Solvent",
        }
    }
}

/// Binding of one canonical column to a dialect-specific header label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnBinding {
    /// Header text as it appears in the source file.
    pub label: String,
    /// False leaves the column unmapped for this dialect.
    #[serde(default = "default_true")]
    pub mapped: bool,
}

fn default_true() -> bool {
    true
}

/// How the transfer table's first data row is found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TableAnchor {
    /// Row containing `keyword` is the header row.
    Keyword {
        keyword: String,
        #[serde(default)]
        exact: bool,
    },
    /// Fixed header-row coordinates.
    Coordinates { row: usize },
}

/// How the transfer table ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TableStop {
    /// First row containing `keyword` terminates the table (exclusive).
    Keyword { keyword: String },
    /// Fixed last row (exclusive).
    Coordinates { row: usize },
    /// First fully empty row terminates the table.
    EmptyLine,
}

/// How the exceptions block further down the same file is located.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionRules {
    /// Keyword anchoring the exceptions header row.
    pub keyword: String,
    /// Header label of the column holding the exception reason.
    pub reason_label: String,
    #[serde(default)]
    pub stop: Option<TableStop>,
}

/// Volume unit the dialect records transfers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeUnit {
    Microliter,
    Nanoliter,
}

/// Complete description of one transfer-file dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRuleSet {
    pub name: String,
    pub extension: String,
    pub file_type: FileType,
    #[serde(default)]
    pub engine: Option<Engine>,
    #[serde(default)]
    pub worksheet: Option<String>,
    pub destination_plate_format: PlateFormat,
    #[serde(default)]
    pub verification: Verification,
    pub start: TableAnchor,
    pub stop: TableStop,
    #[serde(default)]
    pub catch_solvent_only_transfers: bool,
    pub volume_unit: VolumeUnit,
    /// Canonical column name to dialect header binding; bundled rule sets
    /// receive theirs from `transfer_mapping.json` at load time.
    #[serde(default)]
    pub columns: BTreeMap<CanonicalColumn, ColumnBinding>,
    #[serde(default)]
    pub exceptions: Option<ExceptionRules>,
}

impl TransferRuleSet {
    pub fn validate(&self) -> Result<(), RuleSetError> {
        if self.verification.enabled && self.verification.keyword.is_empty() {
            return Err(RuleSetError::invalid(
                &self.name,
                "verification enabled with an empty keyword",
            ));
        }
        if let TableAnchor::Keyword { keyword, .. } = &self.start
            && keyword.is_empty()
        {
            return Err(RuleSetError::invalid(&self.name, "start keyword is empty"));
        }
        for column in CanonicalColumn::ALL {
            if !column.is_required() {
                continue;
            }
            let mapped = self
                .columns
                .get(&column)
                .is_some_and(|binding| binding.mapped && !binding.label.is_empty());
            if !mapped {
                return Err(RuleSetError::invalid(
                    &self.name,
                    format!("required column {} is not mapped", column.as_str()),
                ));
            }
        }
        if let Some(exceptions) = &self.exceptions
            && exceptions.keyword.is_empty()
        {
            return Err(RuleSetError::invalid(
                &self.name,
                "exceptions block keyword is empty",
            ));
        }
        Ok(())
    }

    /// Dialect header label for a canonical column, when mapped.
    pub fn label_for(&self, column: CanonicalColumn) -> Option<&str> {
        self.columns
            .get(&column)
            .filter(|binding| binding.mapped)
            .map(|binding| binding.label.as_str())
    }
}
