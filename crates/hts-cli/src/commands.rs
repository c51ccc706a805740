use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::{Context, Result};
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use hts_core::{KineticOptions, RunRequest, ThermalOptions};
use hts_model::{PipelineEvent, PlateLayout, RunOutcome};
use hts_rules::{
    builtin_raw_rule_sets, builtin_transfer_rule_sets, resolve_raw_rule_set,
    resolve_transfer_rule_set,
};

use crate::cli::RunArgs;
use crate::summary::apply_table_style;

pub fn run_rulesets() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Name", "Kind", "File type", "Shape", "Plate format"]);
    apply_table_style(&mut table);
    for rules in builtin_raw_rule_sets().context("load bundled raw rule sets")? {
        table.add_row(vec![
            rules.name.clone(),
            "raw".to_string(),
            rules.file_type.to_string(),
            rules.shape.to_string(),
            rules.assay_plate_format.to_string(),
        ]);
    }
    for rules in builtin_transfer_rule_sets().context("load bundled transfer rule sets")? {
        table.add_row(vec![
            rules.name.clone(),
            "transfer".to_string(),
            rules.file_type.to_string(),
            "-".to_string(),
            rules.destination_plate_format.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_pipeline(args: &RunArgs, cancel: &AtomicBool) -> Result<RunOutcome> {
    let transfer_rules = resolve_transfer_rule_set(&args.transfer_rules)?;
    let raw_rules = resolve_raw_rule_set(&args.raw_rules)?;
    let layouts = load_layouts(args.layout.as_deref())?;
    let raw_files = assign_raw_files(&args.raw_dir)?;
    info!(
        raw_files = raw_files.len(),
        layouts = layouts.len(),
        "run inputs resolved"
    );

    let request = RunRequest {
        transfer_file: args.transfer_file.clone(),
        transfer_rules,
        raw_rules,
        category: args.category.into(),
        dataset: args.dataset.clone(),
        raw_files,
        layouts,
        thermal: ThermalOptions {
            smoothing_window: args.smoothing_window,
            search: None,
        },
        kinetic: KineticOptions {
            window: args.fit_window,
            ..KineticOptions::default()
        },
    };

    let progress = ProgressBar::new_spinner().with_style(ProgressStyle::default_spinner());
    progress.enable_steady_tick(Duration::from_millis(100));
    let outcome = hts_core::run(&request, cancel, |event| {
        if let PipelineEvent::PlateFailed {
            destination,
            reason,
        } = &event
        {
            progress.println(format!("{destination}: {reason}"));
        }
        if let Some(message) = describe(&event) {
            progress.set_message(message);
        }
    })?;
    progress.finish_and_clear();

    if let Some(path) = &args.output {
        let file = File::create(path)
            .with_context(|| format!("create output file {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &outcome)
            .context("write run outcome")?;
    }
    Ok(outcome)
}

fn describe(event: &PipelineEvent) -> Option<String> {
    match event {
        PipelineEvent::PlateStarted { index, destination } => {
            Some(format!("plate {} ({destination})", index + 1))
        }
        PipelineEvent::RawDataRead { destination, .. } => {
            Some(format!("{destination}: raw data read"))
        }
        PipelineEvent::SamplesExtracted { destination, count } => {
            Some(format!("{destination}: {count} sample wells"))
        }
        PipelineEvent::PlateProcessed {
            destination,
            category,
        } => Some(format!("{destination}: {category} processed")),
        _ => None,
    }
}

pub fn load_layouts(path: Option<&Path>) -> Result<BTreeMap<String, PlateLayout>> {
    let Some(path) = path else {
        return Ok(BTreeMap::new());
    };
    let file =
        File::open(path).with_context(|| format!("open layout file {}", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("parse layout file {}", path.display()))
}

/// One raw file per destination plate, keyed by file stem.
pub fn assign_raw_files(dir: &Path) -> Result<BTreeMap<String, std::path::PathBuf>> {
    let mut files = BTreeMap::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read raw directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        files.insert(stem.to_string(), path.clone());
    }
    Ok(files)
}
