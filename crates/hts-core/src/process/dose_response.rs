//! Endpoint dose-response reducer: per-sample concentration grouping,
//! normalization, and a four-parameter logistic fit.

use std::collections::BTreeMap;

use tracing::warn;

use hts_model::{
    ClassifiedPlate, DoseResponseSample, LogisticFit, PlateNote, ReferenceStats, WellRole,
};

use crate::process::normalization;
use crate::stats::{mean, sd};

/// Four-parameter logistic in the fitter's closed vocabulary; for x > 0
/// `exp(Hill*ln(x/IC50))` equals `(x/IC50)^Hill` exactly.
pub const FOUR_PL: &str = "Bottom + (Top - Bottom)/(1 + exp(Hill*ln(x/IC50)))";

const PARAMETERS: [&str; 4] = ["Top", "Bottom", "IC50", "Hill"];

pub fn process(
    plate: &ClassifiedPlate,
    readings: &[Option<f64>],
    stats: &ReferenceStats,
) -> (Vec<DoseResponseSample>, Vec<PlateNote>) {
    let scale = normalization(stats);
    let mut notes = Vec::new();
    let mut samples = Vec::new();

    for (sample_id, by_concentration) in group_by_concentration(plate, readings) {
        let mut pairs: Vec<(f64, Vec<f64>)> = by_concentration
            .into_iter()
            .map(|(bits, raw)| (f64::from_bits(bits), raw))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let concentrations: Vec<f64> = pairs.iter().map(|(c, _)| *c).collect();
        let raw: Vec<Vec<f64>> = pairs.into_iter().map(|(_, r)| r).collect();
        let normalized: Vec<Vec<f64>> = raw
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|&r| scale.map_or(r, |(solvent, span)| (r - solvent) / span))
                    .collect()
            })
            .collect();
        let mean_value: Vec<f64> = normalized
            .iter()
            .map(|group| mean(group).unwrap_or(f64::NAN))
            .collect();
        let sds: Vec<Option<f64>> = normalized.iter().map(|group| sd(group)).collect();
        let error = sds
            .iter()
            .any(Option::is_some)
            .then(|| sds.iter().map(|s| s.unwrap_or(0.0)).collect());

        let fit = fit_logistic(&concentrations, &normalized, &mean_value);
        if fit.is_none() {
            notes.push(PlateNote::FitFailed {
                sample: sample_id.clone(),
            });
        }
        samples.push(DoseResponseSample {
            sample_id,
            concentrations,
            readings: raw,
            normalized,
            mean_value,
            error,
            fit,
        });
    }
    (samples, notes)
}

type ConcentrationGroups = BTreeMap<String, BTreeMap<u64, Vec<f64>>>;

/// Sample wells with a reading and a known concentration, grouped by
/// sample id then concentration.
fn group_by_concentration(plate: &ClassifiedPlate, readings: &[Option<f64>]) -> ConcentrationGroups {
    let mut groups: ConcentrationGroups = BTreeMap::new();
    for (index, well) in plate.wells.iter().enumerate() {
        if well.role != WellRole::Sample {
            continue;
        }
        let (Some(sample), Some(concentration), Some(reading)) = (
            well.sample_id.as_ref(),
            well.concentration,
            readings.get(index).copied().flatten(),
        ) else {
            continue;
        };
        groups
            .entry(sample.clone())
            .or_default()
            .entry(concentration.to_bits())
            .or_default()
            .push(reading);
    }
    groups
}

fn fit_logistic(
    concentrations: &[f64],
    normalized: &[Vec<f64>],
    mean_value: &[f64],
) -> Option<LogisticFit> {
    // Flatten replicates into (x, y) observations.
    let mut x = Vec::new();
    let mut y = Vec::new();
    for (c, group) in concentrations.iter().zip(normalized) {
        for &value in group {
            x.push(*c);
            y.push(value);
        }
    }
    if x.len() < PARAMETERS.len() || concentrations.iter().any(|&c| c <= 0.0) {
        return None;
    }

    let top = mean_value.iter().copied().fold(f64::MIN, f64::max);
    let bottom = mean_value.iter().copied().fold(f64::MAX, f64::min);
    let log_center =
        concentrations.iter().map(|c| c.log10()).sum::<f64>() / concentrations.len() as f64;
    let initial = [top, bottom, 10f64.powf(log_center), 1.0];

    let names: Vec<String> = PARAMETERS.iter().map(|p| p.to_string()).collect();
    let result = match hts_fit::fit(FOUR_PL, &names, "x", &x, &y, &initial) {
        Ok(result) => result,
        Err(error) => {
            warn!(%error, "logistic fit failed");
            return None;
        }
    };

    let fitted = hts_fit::evaluate(FOUR_PL, &result.parameters, &names, "x", concentrations).ok()?;
    let r_square = hts_fit::r_square(mean_value, &fitted);
    let ci = |index: usize| {
        let p = result.parameters[index];
        let half = 1.96 * result.standard_error(index).unwrap_or(0.0);
        (p - half, p + half)
    };
    Some(LogisticFit {
        top: result.parameters[0],
        bottom: result.parameters[1],
        ic50: result.parameters[2],
        hill: result.parameters[3],
        top_ci: ci(0),
        bottom_ci: ci(1),
        ic50_ci: ci(2),
        hill_ci: ci(3),
        r_square,
    })
}
