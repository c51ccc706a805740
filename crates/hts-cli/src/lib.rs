//! Command-line workbench for batch plate-assay processing.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
