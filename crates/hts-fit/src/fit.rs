//! Non-linear least squares by Levenberg-Marquardt with a numeric
//! Jacobian. The model is any closure over (parameters, x); the symbolic
//! frontend and the native reducers share this core.

use nalgebra::{DMatrix, DVector};
use tracing::trace;

use crate::error::FitError;

const MAX_ITERATIONS: usize = 200;
const LAMBDA_INITIAL: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e12;
const RELATIVE_TOLERANCE: f64 = 1e-12;

/// Best-fit parameters with their covariance matrix.
#[derive(Debug, Clone)]
pub struct FitResult {
    pub parameters: Vec<f64>,
    /// `sigma^2 * (J^T J)^-1`, row-major.
    pub covariance: Vec<Vec<f64>>,
    pub residual_sum_squares: f64,
    pub iterations: usize,
}

impl FitResult {
    /// Standard error of one parameter, from the covariance diagonal.
    pub fn standard_error(&self, index: usize) -> Option<f64> {
        let variance = *self.covariance.get(index)?.get(index)?;
        if variance.is_finite() && variance >= 0.0 {
            Some(variance.sqrt())
        } else {
            None
        }
    }
}

/// Coefficient of determination of `fitted` against `observed`.
pub fn r_square(observed: &[f64], fitted: &[f64]) -> f64 {
    let n = observed.len();
    if n == 0 || n != fitted.len() {
        return f64::NAN;
    }
    let mean = observed.iter().sum::<f64>() / n as f64;
    let ss_total: f64 = observed.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_residual: f64 = observed
        .iter()
        .zip(fitted)
        .map(|(y, f)| (y - f).powi(2))
        .sum();
    if ss_total == 0.0 {
        return if ss_residual == 0.0 { 1.0 } else { f64::NAN };
    }
    1.0 - ss_residual / ss_total
}

/// Fits `model` to (x, y) starting from `initial`.
pub fn curve_fit<M>(model: M, initial: &[f64], x: &[f64], y: &[f64]) -> Result<FitResult, FitError>
where
    M: Fn(&[f64], f64) -> f64,
{
    let n = x.len();
    let p = initial.len();
    if n < p || n != y.len() {
        return Err(FitError::InsufficientData {
            points: n.min(y.len()),
            parameters: p,
        });
    }

    let mut beta = initial.to_vec();
    let mut ss = sum_squares(&model, &beta, x, y);
    if !ss.is_finite() {
        return Err(FitError::FitFailed {
            message: "model not finite at the initial guess".to_string(),
        });
    }

    let mut lambda = LAMBDA_INITIAL;
    let mut iterations = 0;
    for iteration in 0..MAX_ITERATIONS {
        iterations = iteration + 1;
        let jacobian = numeric_jacobian(&model, &beta, x);
        let residuals = DVector::from_iterator(
            n,
            x.iter().zip(y).map(|(&xi, &yi)| yi - model(&beta, xi)),
        );
        let jt = jacobian.transpose();
        let normal = &jt * &jacobian;
        let gradient = &jt * &residuals;

        let mut stepped = false;
        while lambda <= LAMBDA_MAX {
            let mut damped = normal.clone();
            for i in 0..p {
                // Marquardt scaling keeps the step sane across parameter
                // magnitudes spanning orders of magnitude (IC50 vs Hill).
                let diagonal = normal[(i, i)].max(f64::MIN_POSITIVE);
                damped[(i, i)] = normal[(i, i)] + lambda * diagonal;
            }
            let Some(delta) = damped.lu().solve(&gradient) else {
                lambda *= 4.0;
                continue;
            };
            let candidate: Vec<f64> =
                beta.iter().zip(delta.iter()).map(|(b, d)| b + d).collect();
            let ss_candidate = sum_squares(&model, &candidate, x, y);
            if ss_candidate.is_finite() && ss_candidate < ss {
                let improvement = (ss - ss_candidate) / ss.max(f64::MIN_POSITIVE);
                beta = candidate;
                ss = ss_candidate;
                lambda = (lambda * 0.5).max(1e-12);
                stepped = true;
                if improvement < RELATIVE_TOLERANCE || delta.norm() < RELATIVE_TOLERANCE {
                    return finish(&model, beta, ss, x, iterations);
                }
                break;
            }
            lambda *= 4.0;
        }
        if !stepped {
            // No downhill step found at any damping; treat as converged if
            // we ever improved, otherwise the surface is hostile.
            if iteration == 0 {
                return Err(FitError::FitFailed {
                    message: "no downhill step from the initial guess".to_string(),
                });
            }
            break;
        }
        trace!(iteration, ss, lambda, "levenberg-marquardt step");
    }

    finish(&model, beta, ss, x, iterations)
}

fn finish<M>(
    model: &M,
    beta: Vec<f64>,
    ss: f64,
    x: &[f64],
    iterations: usize,
) -> Result<FitResult, FitError>
where
    M: Fn(&[f64], f64) -> f64,
{
    if beta.iter().any(|b| !b.is_finite()) {
        return Err(FitError::FitFailed {
            message: "parameters diverged".to_string(),
        });
    }
    let n = x.len();
    let p = beta.len();
    let jacobian = numeric_jacobian(model, &beta, x);
    let normal = jacobian.transpose() * &jacobian;
    let sigma2 = if n > p { ss / (n - p) as f64 } else { ss };
    let covariance = match normal.try_inverse() {
        Some(inverse) => {
            let scaled = inverse * sigma2;
            (0..p)
                .map(|i| (0..p).map(|j| scaled[(i, j)]).collect())
                .collect()
        }
        None => vec![vec![f64::NAN; p]; p],
    };
    Ok(FitResult {
        parameters: beta,
        covariance,
        residual_sum_squares: ss,
        iterations,
    })
}

fn sum_squares<M>(model: &M, beta: &[f64], x: &[f64], y: &[f64]) -> f64
where
    M: Fn(&[f64], f64) -> f64,
{
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let r = yi - model(beta, xi);
            r * r
        })
        .sum()
}

fn numeric_jacobian<M>(model: &M, beta: &[f64], x: &[f64]) -> DMatrix<f64>
where
    M: Fn(&[f64], f64) -> f64,
{
    let n = x.len();
    let p = beta.len();
    let mut jacobian = DMatrix::zeros(n, p);
    let mut perturbed = beta.to_vec();
    for j in 0..p {
        let h = (beta[j].abs().max(1.0)) * 1e-7;
        perturbed[j] = beta[j] + h;
        for (i, &xi) in x.iter().enumerate() {
            let forward = model(&perturbed, xi);
            let base = model(beta, xi);
            jacobian[(i, j)] = (forward - base) / h;
        }
        perturbed[j] = beta[j];
    }
    jacobian
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_a_line_exactly() {
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|xi| 3.0 * xi - 2.0).collect();
        let result = curve_fit(
            |p, xi| p[0] * xi + p[1],
            &[1.0, 0.0],
            &x,
            &y,
        )
        .expect("fit");
        assert!((result.parameters[0] - 3.0).abs() < 1e-6);
        assert!((result.parameters[1] + 2.0).abs() < 1e-6);
        assert!(result.residual_sum_squares < 1e-10);
    }

    #[test]
    fn recovers_an_exponential_decay() {
        let x: Vec<f64> = (0..30).map(|i| f64::from(i) * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|xi| 5.0 * (-1.3 * xi).exp()).collect();
        let result = curve_fit(
            |p, xi| p[0] * (-p[1] * xi).exp(),
            &[1.0, 1.0],
            &x,
            &y,
        )
        .expect("fit");
        assert!((result.parameters[0] - 5.0).abs() < 1e-4);
        assert!((result.parameters[1] - 1.3).abs() < 1e-4);
    }

    #[test]
    fn more_parameters_than_points_is_typed() {
        let error = curve_fit(|p, xi| p[0] * xi, &[1.0, 2.0, 3.0], &[1.0], &[1.0])
            .expect_err("should fail");
        assert!(matches!(error, FitError::InsufficientData { .. }));
    }

    #[test]
    fn r_square_of_perfect_fit_is_one() {
        let y = [1.0, 2.0, 3.0];
        assert!((r_square(&y, &y) - 1.0).abs() < 1e-12);
    }
}
