//! Kinetic-rate reducer: least-squares line over a linear sub-range of
//! each well's time course.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hts_model::{KineticFit, PlateFormat, index_to_well};

use crate::error::CoreError;
use crate::readings::Series;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticOptions {
    /// Fixed fit window (start inclusive, end exclusive); `None` selects
    /// the window by sliding-window R-squared maximization.
    pub window: Option<(usize, usize)>,
    /// Smallest window length the auto-detection will consider.
    pub min_window: usize,
}

impl Default for KineticOptions {
    fn default() -> Self {
        Self {
            window: None,
            min_window: 5,
        }
    }
}

pub fn process(
    series: &BTreeMap<usize, Series>,
    format: PlateFormat,
    options: &KineticOptions,
) -> Result<Vec<KineticFit>, CoreError> {
    let mut fits = Vec::with_capacity(series.len());
    for (&index, well_series) in series {
        let well = index_to_well(index, format)?;
        fits.push(rate_fit(well, well_series, options));
    }
    Ok(fits)
}

fn rate_fit(well: String, series: &Series, options: &KineticOptions) -> KineticFit {
    let n = series.x.len();
    let window = match options.window {
        // Clamp to the series; a reversed window degenerates to empty and
        // falls through linear_fit's None path.
        Some((start, end)) => {
            let end = end.min(n);
            (start.min(end), end)
        }
        None => best_window(&series.x, &series.y, options.min_window),
    };
    let line = linear_fit(
        &series.x[window.0..window.1],
        &series.y[window.0..window.1],
    );
    KineticFit {
        well,
        times: series.x.clone(),
        signal: series.y.clone(),
        slope: line.map(|l| l.0),
        intercept: line.map(|l| l.1),
        r_square: line.map(|l| l.2),
        window,
    }
}

/// Window maximizing the linear-fit R-squared; ties go to the longer
/// window. Series shorter than the minimum fall back to the full range.
fn best_window(x: &[f64], y: &[f64], min_window: usize) -> (usize, usize) {
    let n = x.len();
    let min_length = min_window.max(2);
    if n <= min_length {
        return (0, n);
    }
    let mut best = (0, n);
    let mut best_r2 = f64::NEG_INFINITY;
    for length in min_length..=n {
        for start in 0..=(n - length) {
            let end = start + length;
            if let Some((_, _, r2)) = linear_fit(&x[start..end], &y[start..end])
                && r2 >= best_r2
            {
                best_r2 = r2;
                best = (start, end);
            }
        }
    }
    best
}

/// Ordinary least squares `(slope, intercept, r_square)`; `None` for
/// degenerate input (fewer than two points or zero time spread).
fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64, f64)> {
    if x.len() < 2 || x.len() != y.len() {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let sxx: f64 = x.iter().map(|v| (v - mean_x).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = x.iter().zip(y).map(|(vx, vy)| (vx - mean_x) * (vy - mean_y)).sum();
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let ss_tot: f64 = y.iter().map(|v| (v - mean_y).powi(2)).sum();
    let ss_res: f64 = x
        .iter()
        .zip(y)
        .map(|(vx, vy)| (vy - (slope * vx + intercept)).powi(2))
        .sum();
    let r_square = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };
    Some((slope, intercept, r_square))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line_recovers_slope_and_intercept() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|t| 3.0 * t + 2.0).collect();
        let fit = rate_fit("A01".to_string(), &Series { x, y }, &KineticOptions::default());
        assert!((fit.slope.unwrap() - 3.0).abs() < 1e-12);
        assert!((fit.intercept.unwrap() - 2.0).abs() < 1e-12);
        assert!((fit.r_square.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn auto_window_avoids_the_plateau() {
        // Linear ramp for 10 points, then flat.
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|&t| if t < 10.0 { 2.0 * t } else { 18.0 })
            .collect();
        let fit = rate_fit("A01".to_string(), &Series { x, y }, &KineticOptions::default());
        let (start, end) = fit.window;
        assert!(end <= 10 || start >= 9, "window {start}..{end}");
        assert!(fit.r_square.unwrap() > 0.999);
    }

    #[test]
    fn explicit_window_is_clamped_and_used() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|t| t * 2.0).collect();
        let options = KineticOptions {
            window: Some((2, 50)),
            ..KineticOptions::default()
        };
        let fit = rate_fit("A01".to_string(), &Series { x, y }, &options);
        assert_eq!(fit.window, (2, 10));
    }

    #[test]
    fn reversed_window_yields_nulls_instead_of_panicking() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|t| t * 2.0).collect();
        let options = KineticOptions {
            window: Some((5, 2)),
            ..KineticOptions::default()
        };
        let fit = rate_fit("A01".to_string(), &Series { x, y }, &options);
        assert_eq!(fit.window, (2, 2));
        assert_eq!(fit.slope, None);
        assert_eq!(fit.r_square, None);
    }

    #[test]
    fn degenerate_series_reports_nulls() {
        let series = Series {
            x: vec![1.0],
            y: vec![5.0],
        };
        let fit = rate_fit("A01".to_string(), &series, &KineticOptions::default());
        assert_eq!(fit.slope, None);
        assert_eq!(fit.r_square, None);
    }
}
