//! Rule-driven parsers.
//!
//! A rule set plus a cell matrix yields either named datasets (raw
//! instrument data) or a list of transfer records (dispenser logs). No
//! instrument format is hard-coded; the rule set drives everything.

pub mod anchor;
pub mod error;
pub mod raw;
pub mod transfer;

pub use error::ParseError;
pub use raw::{Dataset, DatasetKind, parse_raw};
pub use transfer::parse_transfers;
