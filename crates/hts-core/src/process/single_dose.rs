//! Endpoint single-dose reducer: normalize to the control/solvent scale
//! and aggregate replicates.

use hts_model::{ClassifiedPlate, ReferenceStats, SingleDoseSample};

use crate::process::normalization;
use crate::stats::{mean, sd};

pub fn process(
    plate: &ClassifiedPlate,
    readings: &[Option<f64>],
    stats: &ReferenceStats,
) -> Vec<SingleDoseSample> {
    let scale = normalization(stats);
    let mut samples = Vec::new();
    for ((sample_id, concentration_bits), indices) in plate.replicate_groups() {
        let raw: Vec<f64> = indices
            .iter()
            .filter_map(|&i| readings.get(i).copied().flatten())
            .collect();
        if raw.is_empty() {
            continue;
        }
        let normalized: Vec<f64> = raw
            .iter()
            .map(|&r| scale.map_or(r, |(solvent, span)| (r - solvent) / span))
            .collect();
        let Some(group_mean) = mean(&normalized) else {
            continue;
        };
        samples.push(SingleDoseSample {
            sample_id,
            concentration: concentration_bits.map(f64::from_bits),
            readings: raw,
            mean: group_mean,
            sd: sd(&normalized),
            normalized,
        });
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use hts_model::{PlateFormat, WellAssignment, WellRole};

    fn plate_with_sample(indices: &[usize]) -> ClassifiedPlate {
        let mut wells = vec![WellAssignment::empty(); 96];
        for &i in indices {
            wells[i] = WellAssignment {
                role: WellRole::Sample,
                sample_id: Some("CMPD-1".to_string()),
                concentration: Some(1e-6),
                volume: None,
                solvent: None,
            };
        }
        ClassifiedPlate {
            destination: "DEST1".to_string(),
            format: PlateFormat::F96,
            wells,
        }
    }

    #[test]
    fn normalizes_against_the_reference_window() {
        let stats = ReferenceStats {
            solvent_mean: Some(1000.0),
            control_mean: Some(10000.0),
            ..ReferenceStats::default()
        };
        let mut readings = vec![None; 96];
        readings[1] = Some(5500.0);
        let samples = process(&plate_with_sample(&[1]), &readings, &stats);
        assert_eq!(samples.len(), 1);
        assert!((samples[0].normalized[0] - 0.5).abs() < 1e-12);
        assert_eq!(samples[0].sd, None);
    }

    #[test]
    fn raw_fallback_without_references() {
        let mut readings = vec![None; 96];
        readings[1] = Some(5500.0);
        readings[2] = Some(4500.0);
        let samples = process(&plate_with_sample(&[1, 2]), &readings, &ReferenceStats::default());
        assert_eq!(samples[0].normalized, vec![5500.0, 4500.0]);
        assert!((samples[0].mean - 5000.0).abs() < 1e-12);
        assert!(samples[0].sd.is_some());
    }
}
