//! Bundled rule sets load, validate, and resolve by name or path.

use std::fs;

use hts_rules::{
    CanonicalColumn, DatasetSeparator, RuleSetError, builtin_raw_rule_sets,
    builtin_transfer_rule_sets, load_raw_rule_set, resolve_raw_rule_set,
    resolve_transfer_rule_set,
};

#[test]
fn builtin_raw_rule_sets_validate() {
    let rule_sets = builtin_raw_rule_sets().expect("builtin raw rule sets");
    assert_eq!(rule_sets.len(), 6);
    let names: Vec<&str> = rule_sets.iter().map(|rs| rs.name.as_str()).collect();
    assert!(names.contains(&"plate_reader_grid"));
    assert!(names.contains(&"qpcr_384"));
}

#[test]
fn builtin_transfer_rule_sets_carry_column_bindings() {
    let rule_sets = builtin_transfer_rule_sets().expect("builtin transfer rule sets");
    assert_eq!(rule_sets.len(), 2);
    for rule_set in &rule_sets {
        for column in CanonicalColumn::ALL {
            if column.is_required() {
                assert!(
                    rule_set.label_for(column).is_some(),
                    "{}: {} unbound",
                    rule_set.name,
                    column.as_str()
                );
            }
        }
    }
}

#[test]
fn resolves_builtin_by_name() {
    let rule_set = resolve_raw_rule_set("plate_reader_grid").expect("resolve");
    assert!(rule_set.grid_labels_included);
    let transfer = resolve_transfer_rule_set("acoustic_csv").expect("resolve");
    assert!(transfer.catch_solvent_only_transfers);
}

#[test]
fn unknown_name_is_typed() {
    let error = resolve_raw_rule_set("no_such_dialect").expect_err("should fail");
    assert!(matches!(error, RuleSetError::UnknownRuleSet { .. }));
}

#[test]
fn invalid_count_rejected_at_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.json");
    let mut rule_set = resolve_raw_rule_set("plate_reader_grid").expect("resolve");
    rule_set.datasets.multiple = false;
    rule_set.datasets.count = 3;
    rule_set.datasets.separator = DatasetSeparator::SameAsMain;
    fs::write(&path, serde_json::to_string(&rule_set).expect("serialize")).expect("write");

    let error = load_raw_rule_set(&path).expect_err("should reject");
    assert!(matches!(error, RuleSetError::InvalidRuleSet { .. }));
}

#[test]
fn supplied_name_cardinality_checked() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad_names.json");
    let mut rule_set = resolve_raw_rule_set("plate_reader_grid").expect("resolve");
    rule_set.datasets.multiple = true;
    rule_set.datasets.count = 2;
    // Still only one supplied name.
    fs::write(&path, serde_json::to_string(&rule_set).expect("serialize")).expect("write");

    let error = load_raw_rule_set(&path).expect_err("should reject");
    assert!(matches!(error, RuleSetError::InvalidRuleSet { .. }));
}
