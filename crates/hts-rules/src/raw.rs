//! Raw-data rule sets: verification, dataset anchoring, separation, naming.

use serde::{Deserialize, Serialize};

use hts_model::PlateFormat;

use crate::error::RuleSetError;

/// File container the dialect arrives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Xls,
    Xlsx,
}

/// Parser engine to try first; the reader falls through the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Delimited,
    Xlsx,
    Xls,
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
        };
        f.write_str(name)
    }
}

/// Scan direction for keyword searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Down,
    Right,
}

/// Pre-parse check that the file really is the expected instrument export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub keyword: String,
    /// Fixed row to scan, or `None` to scan every row.
    #[serde(default)]
    pub row: Option<usize>,
    /// Fixed column to scan, or `None` to scan every column.
    #[serde(default)]
    pub column: Option<usize>,
    #[serde(default = "default_axis")]
    pub axis: Axis,
    #[serde(default)]
    pub exact: bool,
}

fn default_axis() -> Axis {
    Axis::Down
}

impl Default for Verification {
    fn default() -> Self {
        Self {
            enabled: false,
            keyword: String::new(),
            row: None,
            column: None,
            axis: Axis::Down,
            exact: false,
        }
    }
}

/// Whether datasets are plate-shaped grids or per-sample tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetShape {
    Plate,
    Sample,
}

impl std::fmt::Display for DatasetShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Plate => "plate",
            Self::Sample => "sample",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridOrTable {
    Grid,
    Table,
}

/// How the top-left corner of the first dataset is found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum DatasetAnchor {
    /// Locate `keyword`, then add `offset` (rows, columns; may be negative).
    Keyword {
        keyword: String,
        #[serde(default)]
        exact: bool,
        #[serde(default)]
        row: Option<usize>,
        #[serde(default)]
        column: Option<usize>,
        #[serde(default)]
        offset: (i64, i64),
    },
    /// Fixed top-left coordinates.
    Coordinates { row: usize, column: usize },
}

/// How the next dataset is reached once the previous one is sliced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DatasetSeparator {
    /// Re-run the main anchor search past the previous dataset.
    SameAsMain,
    /// Skip one empty row/column along the dataset axis.
    EmptyLine,
    /// Search for a keyword in the anchor's row/column, then offset.
    Keyword {
        keyword: String,
        #[serde(default)]
        column: Option<usize>,
        #[serde(default)]
        offset: (i64, i64),
    },
    /// Advance a fixed distance from the previous top-left.
    SetDistance { rows: i64, columns: i64 },
}

/// Where dataset names come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DatasetNaming {
    /// Taken from the discovered header cells.
    FromFile,
    /// Supplied by the rule set; cardinality must match discovery.
    Supplied { names: Vec<String> },
}

/// Multi-dataset state-machine parameters, shared between datasets and
/// sub-datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRules {
    #[serde(default)]
    pub multiple: bool,
    /// Expected count; `-1` means determine dynamically.
    pub count: i64,
    #[serde(default = "default_axis")]
    pub axis: Axis,
    pub anchor: DatasetAnchor,
    pub separator: DatasetSeparator,
}

impl DatasetRules {
    fn validate(&self, name: &str, scope: &str) -> Result<(), RuleSetError> {
        if !self.multiple && self.count != 1 {
            return Err(RuleSetError::invalid(
                name,
                format!("{scope}: count must be 1 when multiple is false"),
            ));
        }
        if self.count == 0 || self.count < -1 {
            return Err(RuleSetError::invalid(
                name,
                format!("{scope}: count must be positive or -1"),
            ));
        }
        if let DatasetSeparator::Keyword { keyword, .. } = &self.separator
            && keyword.is_empty()
        {
            return Err(RuleSetError::invalid(
                name,
                format!("{scope}: separator keyword is empty"),
            ));
        }
        Ok(())
    }
}

/// Complete description of one instrument raw-data dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRuleSet {
    pub name: String,
    pub extension: String,
    pub file_type: FileType,
    #[serde(default)]
    pub engine: Option<Engine>,
    #[serde(default)]
    pub worksheet: Option<String>,
    #[serde(default)]
    pub verification: Verification,
    pub shape: DatasetShape,
    pub assay_plate_format: PlateFormat,
    pub grid_or_table: GridOrTable,
    #[serde(default)]
    pub grid_labels_included: bool,
    pub datasets: DatasetRules,
    /// `None` disables sub-dataset extraction.
    #[serde(default)]
    pub sub_datasets: Option<DatasetRules>,
    pub naming: DatasetNaming,
}

impl RawRuleSet {
    /// Structural validation; called by every loader before the rule set
    /// reaches a parser.
    pub fn validate(&self) -> Result<(), RuleSetError> {
        if self.verification.enabled && self.verification.keyword.is_empty() {
            return Err(RuleSetError::invalid(
                &self.name,
                "verification enabled with an empty keyword",
            ));
        }
        if let DatasetAnchor::Keyword { keyword, .. } = &self.datasets.anchor
            && keyword.is_empty()
        {
            return Err(RuleSetError::invalid(
                &self.name,
                "dataset anchor keyword is empty",
            ));
        }
        self.datasets.validate(&self.name, "datasets")?;
        if let Some(sub) = &self.sub_datasets {
            sub.validate(&self.name, "sub_datasets")?;
        }
        if let DatasetNaming::Supplied { names } = &self.naming {
            if names.is_empty() {
                return Err(RuleSetError::invalid(
                    &self.name,
                    "supplied dataset names are empty",
                ));
            }
            if self.datasets.count > 0 && names.len() != self.datasets.count as usize {
                return Err(RuleSetError::invalid(
                    &self.name,
                    format!(
                        "supplied {} dataset names for count {}",
                        names.len(),
                        self.datasets.count
                    ),
                ));
            }
        }
        Ok(())
    }
}
