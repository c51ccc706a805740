//! Rule sets: declarative descriptions of how to locate and slice datasets
//! inside instrument raw files and acoustic-dispenser transfer logs.
//!
//! Rule sets are immutable serde records loaded once per run. Structural
//! misconfigurations surface as [`RuleSetError::InvalidRuleSet`] at load
//! time rather than as index errors deep inside the parsers.

pub mod error;
pub mod raw;
pub mod registry;
pub mod transfer;

pub use error::RuleSetError;
pub use raw::{
    Axis, DatasetAnchor, DatasetNaming, DatasetRules, DatasetSeparator, DatasetShape, Engine,
    FileType, GridOrTable, RawRuleSet, Verification,
};
pub use registry::{builtin_raw_rule_sets, builtin_transfer_rule_sets, load_raw_rule_set,
    load_transfer_rule_set, resolve_raw_rule_set, resolve_transfer_rule_set};
pub use transfer::{
    CanonicalColumn, ColumnBinding, ExceptionRules, TableAnchor, TableStop, TransferRuleSet,
    VolumeUnit,
};
