//! CLI argument definitions for the plate-assay workbench.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use hts_model::AssayCategory;

#[derive(Parser)]
#[command(
    name = "hts-workbench",
    version,
    about = "Plate-assay processing workbench",
    long_about = "Process biochemical microtiter-plate assays in batch.\n\n\
                  Reads an acoustic-dispenser transfer file plus per-plate raw\n\
                  instrument exports, classifies every well, computes reference\n\
                  statistics and runs the category-specific reducer."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Process every destination plate referenced by a transfer file.
    Run(RunArgs),

    /// List the bundled raw-data and transfer rule sets.
    Rulesets,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Acoustic-dispenser transfer file.
    #[arg(value_name = "TRANSFER_FILE")]
    pub transfer_file: PathBuf,

    /// Directory holding one raw data file per destination plate,
    /// named after the plate label.
    #[arg(long = "raw-dir", value_name = "DIR")]
    pub raw_dir: PathBuf,

    /// Raw-data rule set: bundled name or path to a JSON file.
    #[arg(long = "raw-rules", value_name = "NAME_OR_PATH")]
    pub raw_rules: String,

    /// Transfer rule set: bundled name or path to a JSON file.
    #[arg(
        long = "transfer-rules",
        value_name = "NAME_OR_PATH",
        default_value = "acoustic_csv"
    )]
    pub transfer_rules: String,

    /// Assay category selecting the downstream reducer.
    #[arg(long = "category", value_enum, default_value = "single-dose")]
    pub category: CategoryArg,

    /// Dataset to process when the rule set extracts several from one
    /// file (defaults to the first).
    #[arg(long = "dataset", value_name = "NAME")]
    pub dataset: Option<String>,

    /// Plate layout JSON mapping destination labels to layouts.
    #[arg(long = "layout", value_name = "PATH")]
    pub layout: Option<PathBuf>,

    /// Write the full run outcome as JSON.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Moving-average width for melt-curve smoothing.
    #[arg(long = "smoothing-window", value_name = "N", default_value_t = 3)]
    pub smoothing_window: usize,

    /// Fixed kinetic fit window as START:END point indices
    /// (auto-detected when omitted).
    #[arg(long = "fit-window", value_name = "START:END", value_parser = parse_window)]
    pub fit_window: Option<(usize, usize)>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    SingleDose,
    DoseResponse,
    ThermalShift,
    KineticRate,
}

impl From<CategoryArg> for AssayCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::SingleDose => Self::SingleDose,
            CategoryArg::DoseResponse => Self::DoseResponse,
            CategoryArg::ThermalShift => Self::ThermalShift,
            CategoryArg::KineticRate => Self::KineticRate,
        }
    }
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn parse_window(value: &str) -> Result<(usize, usize), String> {
    let (start, end) = value
        .split_once(':')
        .ok_or_else(|| "expected START:END".to_string())?;
    let start: usize = start
        .trim()
        .parse()
        .map_err(|_| "start is not a number".to_string())?;
    let end: usize = end
        .trim()
        .parse()
        .map_err(|_| "end is not a number".to_string())?;
    if end <= start {
        return Err("end must be greater than start".to_string());
    }
    Ok((start, end))
}
