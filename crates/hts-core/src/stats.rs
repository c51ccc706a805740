//! Per-plate reference statistics: class means, standard deviations, and
//! the Z' screening-window coefficients.

use hts_model::{ClassifiedPlate, PlateNote, RefClass, ReferenceStats, WellRole};

/// Computes reference statistics from the classified wells and endpoint
/// readings. A class with no member wells leaves its fields `None` and
/// yields an [`PlateNote::InsufficientReferences`] note; Z' is `None`
/// whenever any input it needs is.
pub fn reference_stats(
    plate: &ClassifiedPlate,
    readings: &[Option<f64>],
) -> (ReferenceStats, Vec<PlateNote>) {
    let solvent = class_values(plate, readings, &WellRole::Solvent);
    let buffer = class_values(plate, readings, &WellRole::Buffer);
    let control = class_values(plate, readings, &WellRole::Control);

    let mut notes = Vec::new();
    for (class, values) in [
        (RefClass::Solvent, &solvent),
        (RefClass::Buffer, &buffer),
        (RefClass::Control, &control),
    ] {
        if values.is_empty() {
            notes.push(PlateNote::InsufficientReferences { class });
        }
    }

    let stats = ReferenceStats {
        solvent_mean: mean(&solvent),
        solvent_sd: sd(&solvent),
        buffer_mean: mean(&buffer),
        buffer_sd: sd(&buffer),
        control_mean: mean(&control),
        control_sd: sd(&control),
        z_prime: z_prime(&control, &solvent),
        z_prime_robust: z_prime_robust(&control, &solvent),
    };
    (stats, notes)
}

fn class_values(plate: &ClassifiedPlate, readings: &[Option<f64>], role: &WellRole) -> Vec<f64> {
    plate
        .wells_with_role(role)
        .into_iter()
        .filter_map(|index| readings.get(index).copied().flatten())
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation; `None` below two values.
pub(crate) fn sd(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median absolute deviation scaled to estimate the SD of a normal
/// distribution.
fn mad(values: &[f64]) -> Option<f64> {
    let med = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    median(&deviations).map(|m| m * 1.4826)
}

/// `Z' = 1 - 3(SD_control + SD_solvent) / |mean_control - mean_solvent|`.
/// The denominator takes the absolute value, so sign-flipped plates still
/// report a window; zero separation yields `None`.
fn z_prime(control: &[f64], solvent: &[f64]) -> Option<f64> {
    window(mean(control)?, sd(control)?, mean(solvent)?, sd(solvent)?)
}

fn z_prime_robust(control: &[f64], solvent: &[f64]) -> Option<f64> {
    window(
        median(control)?,
        mad(control)?,
        median(solvent)?,
        mad(solvent)?,
    )
}

fn window(center_c: f64, spread_c: f64, center_s: f64, spread_s: f64) -> Option<f64> {
    let separation = (center_c - center_s).abs();
    if separation == 0.0 {
        return None;
    }
    Some(1.0 - 3.0 * (spread_c + spread_s) / separation)
}
