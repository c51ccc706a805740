//! Thermal-shift reducer: smooth each melt curve, differentiate, and read
//! Tm off the derivative maximum.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hts_model::{MeltCurve, PlateFormat, index_to_well};

use crate::error::CoreError;
use crate::readings::Series;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalOptions {
    /// Simple moving-average width applied before differentiation.
    pub smoothing_window: usize,
    /// Temperature window the derivative maximum is searched in; `None`
    /// searches the whole curve.
    pub search: Option<(f64, f64)>,
}

impl Default for ThermalOptions {
    fn default() -> Self {
        Self {
            smoothing_window: 3,
            search: None,
        }
    }
}

pub fn process(
    series: &BTreeMap<usize, Series>,
    format: PlateFormat,
    options: &ThermalOptions,
) -> Result<Vec<MeltCurve>, CoreError> {
    let mut curves = Vec::with_capacity(series.len());
    for (&index, well_series) in series {
        let well = index_to_well(index, format)?;
        curves.push(melt_curve(well, well_series, options));
    }
    Ok(curves)
}

fn melt_curve(well: String, series: &Series, options: &ThermalOptions) -> MeltCurve {
    let smoothed = moving_average(&series.y, options.smoothing_window.max(1));
    let mut derivative = Vec::new();
    if series.x.len() >= 2 {
        for i in 0..series.x.len() - 1 {
            let dx = series.x[i + 1] - series.x[i];
            let slope = if dx == 0.0 {
                0.0
            } else {
                (smoothed[i + 1] - smoothed[i]) / dx
            };
            derivative.push(slope);
        }
    }

    // Each derivative value sits at the midpoint of its interval.
    let mut tm = None;
    let mut best = f64::NEG_INFINITY;
    for (i, &d) in derivative.iter().enumerate() {
        let midpoint = (series.x[i] + series.x[i + 1]) / 2.0;
        if let Some((low, high)) = options.search
            && (midpoint < low || midpoint > high)
        {
            continue;
        }
        if d > best {
            best = d;
            tm = Some(midpoint);
        }
    }

    MeltCurve {
        well,
        temperatures: series.x.clone(),
        fluorescence: series.y.clone(),
        derivative,
        tm,
    }
}

/// Centered moving average; the window shrinks at the edges.
fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let half = window / 2;
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(values.len());
            values[start..end].iter().sum::<f64>() / (end - start) as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sigmoid_series(tm: f64) -> Series {
        let x: Vec<f64> = (25..=95).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|t| 1.0 / (1.0 + (-(t - tm) / 2.0).exp())).collect();
        Series { x, y }
    }

    #[test]
    fn tm_sits_at_the_inflection() {
        let curve = melt_curve("A01".to_string(), &sigmoid_series(60.0), &ThermalOptions::default());
        let tm = curve.tm.expect("derivative maximum found");
        assert!((tm - 60.0).abs() <= 0.5, "tm {tm}");
    }

    #[test]
    fn search_window_can_exclude_the_maximum() {
        let options = ThermalOptions {
            search: Some((80.0, 95.0)),
            ..ThermalOptions::default()
        };
        let curve = melt_curve("A01".to_string(), &sigmoid_series(60.0), &options);
        // The true inflection is outside the window; the reported maximum
        // must come from inside it.
        assert!(curve.tm.is_some_and(|tm| tm >= 80.0));
    }

    #[test]
    fn short_curves_yield_no_tm() {
        let series = Series {
            x: vec![25.0],
            y: vec![0.5],
        };
        let curve = melt_curve("A01".to_string(), &series, &ThermalOptions::default());
        assert!(curve.derivative.is_empty());
        assert_eq!(curve.tm, None);
    }
}
