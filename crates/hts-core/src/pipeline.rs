//! Plate-by-plate pipeline driver.
//!
//! Transfer-file problems abort the run before the plate loop; everything
//! after that is captured per plate. Cancellation is cooperative: the
//! flag is checked before each plate and between parser stages, and the
//! remaining plates are marked `Cancelled`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use hts_model::{
    AssayCategory, PipelineEvent, PlateLayout, PlateNote, PlateResult, PlateStatus, Processed,
    RunOutcome, Transfer,
};
use hts_ingest::EngineKind;
use hts_rules::{Engine, RawRuleSet, TransferRuleSet};

use crate::error::CoreError;
use crate::process::{KineticOptions, ThermalOptions, dose_response, kinetic, single_dose, thermal};
use crate::readings::{endpoint_readings, series_readings};
use crate::resolve::resolve_layout;
use crate::stats::reference_stats;

/// Everything one run needs, resolved up front by the host.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub transfer_file: PathBuf,
    pub transfer_rules: TransferRuleSet,
    pub raw_rules: RawRuleSet,
    pub category: AssayCategory,
    /// Dataset to process when the raw rule set yields several; `None`
    /// takes the first and notes the rest on the plate result.
    pub dataset: Option<String>,
    /// Raw data file per destination plate label.
    pub raw_files: BTreeMap<String, PathBuf>,
    /// User-declared layout per destination; absent plates get an empty
    /// layout over the transfer rule set's plate format.
    pub layouts: BTreeMap<String, PlateLayout>,
    pub thermal: ThermalOptions,
    pub kinetic: KineticOptions,
}

/// Runs the pipeline, pushing one event per phase and plate.
pub fn run(
    request: &RunRequest,
    cancel: &AtomicBool,
    mut on_event: impl FnMut(PipelineEvent),
) -> Result<RunOutcome, CoreError> {
    let source = hts_ingest::read_tabular(
        &request.transfer_file,
        &request.transfer_rules.extension,
        request.transfer_rules.worksheet.as_deref(),
        engine_kind(request.transfer_rules.engine),
    )?;
    let transfers = hts_parse::parse_transfers(&source.matrix, &request.transfer_rules)?;
    let destinations = destination_order(&transfers);
    info!(
        transfers = transfers.len(),
        plates = destinations.len(),
        "transfer file parsed"
    );

    let mut outcome = RunOutcome::default();
    for (index, destination) in destinations.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            return Ok(cancel_rest(outcome, &destinations[index..], request, &mut on_event));
        }
        on_event(PipelineEvent::PlateStarted {
            index,
            destination: destination.clone(),
        });
        match process_plate(request, destination, &transfers, cancel, &mut on_event) {
            Ok(Some(result)) => {
                on_event(PipelineEvent::PlateProcessed {
                    destination: destination.clone(),
                    category: result.category,
                });
                outcome.plates.push(result);
            }
            Ok(None) => {
                return Ok(cancel_rest(outcome, &destinations[index..], request, &mut on_event));
            }
            Err(error) => {
                warn!(destination, %error, "plate failed");
                on_event(PipelineEvent::PlateFailed {
                    destination: destination.clone(),
                    reason: error.to_string(),
                });
                outcome
                    .plates
                    .push(PlateResult::failed(destination, request.category, error.to_string()));
            }
        }
    }
    on_event(PipelineEvent::RunComplete {
        count: outcome.plates.len(),
    });
    Ok(outcome)
}

/// Marks the given plates `Cancelled` and closes the run.
fn cancel_rest(
    mut outcome: RunOutcome,
    remaining: &[String],
    request: &RunRequest,
    on_event: &mut impl FnMut(PipelineEvent),
) -> RunOutcome {
    outcome.cancelled = true;
    for destination in remaining {
        outcome
            .plates
            .push(PlateResult::cancelled(destination, request.category));
    }
    on_event(PipelineEvent::RunCancelled);
    outcome
}

/// Rule-set engine preference in the reader's vocabulary.
fn engine_kind(engine: Option<Engine>) -> Option<EngineKind> {
    engine.map(|e| match e {
        Engine::Delimited => EngineKind::Delimited,
        Engine::Xlsx => EngineKind::Xlsx,
        Engine::Xls => EngineKind::Xls,
    })
}

/// Destination plates in transfer-file first-appearance order.
fn destination_order(transfers: &[Transfer]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    for transfer in transfers {
        if transfer.destination_plate.is_empty() {
            continue;
        }
        if !order.contains(&transfer.destination_plate) {
            order.push(transfer.destination_plate.clone());
        }
    }
    order
}

/// One plate end to end. `Ok(None)` means cancellation was observed
/// between stages.
fn process_plate(
    request: &RunRequest,
    destination: &str,
    transfers: &[Transfer],
    cancel: &AtomicBool,
    on_event: &mut impl FnMut(PipelineEvent),
) -> Result<Option<PlateResult>, CoreError> {
    let raw_file = request
        .raw_files
        .get(destination)
        .ok_or_else(|| CoreError::MissingRawFile {
            destination: destination.to_string(),
        })?;
    let source = hts_ingest::read_tabular(
        raw_file,
        &request.raw_rules.extension,
        request.raw_rules.worksheet.as_deref(),
        engine_kind(request.raw_rules.engine),
    )?;
    on_event(PipelineEvent::RawDataRead {
        destination: destination.to_string(),
        file: raw_file.clone(),
    });
    let datasets = hts_parse::parse_raw(&source.matrix, &request.raw_rules)?;
    let mut dataset_notes = Vec::new();
    let dataset = match &request.dataset {
        Some(name) => datasets
            .iter()
            .find(|d| d.name == *name)
            .ok_or_else(|| CoreError::DatasetNotFound {
                dataset: name.clone(),
                path: raw_file.clone(),
            })?,
        None => {
            let first = datasets.first().ok_or_else(|| CoreError::NoDatasets {
                path: raw_file.clone(),
            })?;
            if datasets.len() > 1 {
                let names: Vec<String> =
                    datasets[1..].iter().map(|d| d.name.clone()).collect();
                warn!(destination, ?names, "raw file has unselected datasets");
                dataset_notes.push(PlateNote::UnusedDatasets { names });
            }
            first
        }
    };
    if cancel.load(Ordering::Relaxed) {
        return Ok(None);
    }

    let layout = request
        .layouts
        .get(destination)
        .cloned()
        .unwrap_or_else(|| PlateLayout::empty(request.transfer_rules.destination_plate_format));
    let plate = resolve_layout(destination, transfers, &layout)?;
    let sample_count = plate.wells.iter().filter(|w| w.sample_id.is_some()).count();
    on_event(PipelineEvent::SamplesExtracted {
        destination: destination.to_string(),
        count: sample_count,
    });
    if cancel.load(Ordering::Relaxed) {
        return Ok(None);
    }

    let mut notes = dataset_notes;
    let (stats, processed) = match request.category {
        AssayCategory::SingleDose | AssayCategory::DoseResponse => {
            let readings = endpoint_readings(dataset, plate.format)?;
            let (stats, stat_notes) = reference_stats(&plate, &readings);
            on_event(PipelineEvent::ReferencesComputed {
                destination: destination.to_string(),
                stats: stats.clone(),
            });
            for note in &stat_notes {
                if let PlateNote::InsufficientReferences { class } = note {
                    on_event(PipelineEvent::ReferencesMissing {
                        destination: destination.to_string(),
                        class: *class,
                    });
                }
            }
            notes.extend(stat_notes);
            let processed = if request.category == AssayCategory::SingleDose {
                Processed::SingleDose(single_dose::process(&plate, &readings, &stats))
            } else {
                let (samples, fit_notes) = dose_response::process(&plate, &readings, &stats);
                notes.extend(fit_notes);
                Processed::DoseResponse(samples)
            };
            (Some(stats), processed)
        }
        AssayCategory::ThermalShift => {
            let series = series_readings(dataset, plate.format, &["temp"])?;
            let curves = thermal::process(&series, plate.format, &request.thermal)?;
            (None, Processed::ThermalShift(curves))
        }
        AssayCategory::KineticRate => {
            let series = series_readings(dataset, plate.format, &["time"])?;
            let fits = kinetic::process(&series, plate.format, &request.kinetic)?;
            (None, Processed::KineticRate(fits))
        }
    };

    Ok(Some(PlateResult {
        destination: destination.to_string(),
        category: request.category,
        status: PlateStatus::Processed,
        plate: Some(plate),
        stats,
        processed: Some(processed),
        notes,
        error: None,
    }))
}
