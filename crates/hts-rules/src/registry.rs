//! Bundled dialect rule sets and name-or-path resolution.
//!
//! Six raw-data dialects and two transfer dialects ship with the
//! workbench; the transfer column bindings live in a separate
//! `transfer_mapping.json` document merged in at load time.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::RuleSetError;
use crate::raw::RawRuleSet;
use crate::transfer::{CanonicalColumn, ColumnBinding, TransferRuleSet};

const RAW_ASSETS: [&str; 6] = [
    include_str!("../assets/rulesets/plate_reader_grid.json"),
    include_str!("../assets/rulesets/plate_reader_list.json"),
    include_str!("../assets/rulesets/plate_reader_timecourse.json"),
    include_str!("../assets/rulesets/thermal_cycler_96.json"),
    include_str!("../assets/rulesets/thermal_cycler_384.json"),
    include_str!("../assets/rulesets/qpcr_384.json"),
];

const TRANSFER_ASSETS: [&str; 2] = [
    include_str!("../assets/rulesets/acoustic_csv.json"),
    include_str!("../assets/rulesets/acoustic_xlsx.json"),
];

const TRANSFER_MAPPING: &str = include_str!("../assets/transfer_mapping.json");

type TransferMapping = BTreeMap<String, BTreeMap<CanonicalColumn, ColumnBinding>>;

/// All bundled raw-data rule sets, validated.
pub fn builtin_raw_rule_sets() -> Result<Vec<RawRuleSet>, RuleSetError> {
    RAW_ASSETS
        .iter()
        .map(|text| parse_raw("builtin", text))
        .collect()
}

/// All bundled transfer rule sets with their column bindings merged in.
pub fn builtin_transfer_rule_sets() -> Result<Vec<TransferRuleSet>, RuleSetError> {
    let mapping: TransferMapping =
        serde_json::from_str(TRANSFER_MAPPING).map_err(|source| RuleSetError::Json {
            name: "transfer_mapping".to_string(),
            source,
        })?;
    TRANSFER_ASSETS
        .iter()
        .map(|text| {
            let mut rule_set = parse_transfer_unchecked("builtin", text)?;
            apply_mapping(&mut rule_set, &mapping)?;
            rule_set.validate()?;
            Ok(rule_set)
        })
        .collect()
}

fn apply_mapping(
    rule_set: &mut TransferRuleSet,
    mapping: &TransferMapping,
) -> Result<(), RuleSetError> {
    let Some(columns) = mapping.get(&rule_set.name) else {
        return Err(RuleSetError::invalid(
            &rule_set.name,
            "no entry in transfer_mapping",
        ));
    };
    rule_set.columns = columns.clone();
    Ok(())
}

/// Loads and validates a raw rule set from a JSON file.
pub fn load_raw_rule_set(path: &Path) -> Result<RawRuleSet, RuleSetError> {
    let text = fs::read_to_string(path).map_err(|source| RuleSetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_raw(&path.display().to_string(), &text)
}

/// Loads and validates a transfer rule set from a JSON file. The file must
/// carry its own column bindings; the bundled mapping is not consulted.
pub fn load_transfer_rule_set(path: &Path) -> Result<TransferRuleSet, RuleSetError> {
    let text = fs::read_to_string(path).map_err(|source| RuleSetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rule_set = parse_transfer_unchecked(&path.display().to_string(), &text)?;
    rule_set.validate()?;
    Ok(rule_set)
}

/// Resolves a builtin name first, then a filesystem path.
pub fn resolve_raw_rule_set(name_or_path: &str) -> Result<RawRuleSet, RuleSetError> {
    if let Some(found) = builtin_raw_rule_sets()?
        .into_iter()
        .find(|rs| rs.name == name_or_path)
    {
        debug!(name = %name_or_path, "resolved builtin raw rule set");
        return Ok(found);
    }
    let path = Path::new(name_or_path);
    if path.exists() {
        return load_raw_rule_set(path);
    }
    Err(RuleSetError::UnknownRuleSet {
        name: name_or_path.to_string(),
    })
}

/// Resolves a builtin name first, then a filesystem path.
pub fn resolve_transfer_rule_set(name_or_path: &str) -> Result<TransferRuleSet, RuleSetError> {
    if let Some(found) = builtin_transfer_rule_sets()?
        .into_iter()
        .find(|rs| rs.name == name_or_path)
    {
        debug!(name = %name_or_path, "resolved builtin transfer rule set");
        return Ok(found);
    }
    let path = Path::new(name_or_path);
    if path.exists() {
        return load_transfer_rule_set(path);
    }
    Err(RuleSetError::UnknownRuleSet {
        name: name_or_path.to_string(),
    })
}

fn parse_raw(name: &str, text: &str) -> Result<RawRuleSet, RuleSetError> {
    let rule_set: RawRuleSet =
        serde_json::from_str(text).map_err(|source| RuleSetError::Json {
            name: name.to_string(),
            source,
        })?;
    rule_set.validate()?;
    Ok(rule_set)
}

fn parse_transfer_unchecked(name: &str, text: &str) -> Result<TransferRuleSet, RuleSetError> {
    serde_json::from_str(text).map_err(|source| RuleSetError::Json {
        name: name.to_string(),
        source,
    })
}
