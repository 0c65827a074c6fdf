//! Multi-exponential extrapolator
//!
//! Gantree: L4_Extrapolation → MultiExponentialExtrapolator
//!
//! Model `shift + Σ aᵢ·exp(−rᵢ·x)` with decay rates `rᵢ ≥ 0`, fitted by
//! weighted Levenberg-Marquardt. Coefficients are ordered
//! `[shift, a₁, r₁, a₂, r₂, …]`. The value at zero is `shift + Σ aᵢ`.
//!
//! Fits with more than one term are ill-conditioned; expect large std
//! errors on noisy data.

use crate::extrapolator::{Extrapolator, ReckoningResult};
use crate::regression::{covariance, whiten, RegressionData, RegressionFit};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use zne_core::numeric::{LM_INITIAL_DAMPING, LM_MAX_ITERATIONS, LM_TOLERANCE};
use zne_core::{ZneError, ZneResult};

/// Damping bounds for the Levenberg-Marquardt loop
const MIN_DAMPING: f64 = 1e-15;
const MAX_DAMPING: f64 = 1e15;

/// Sum of decaying exponentials plus a constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiExponentialExtrapolator {
    num_terms: usize,
}

impl MultiExponentialExtrapolator {
    /// Create with at least one exponential term
    pub fn new(num_terms: usize) -> ZneResult<Self> {
        if num_terms < 1 {
            return Err(ZneError::InvalidConfiguration(
                "number of exponential terms must be at least 1".into(),
            ));
        }
        Ok(Self { num_terms })
    }

    /// One term
    pub fn mono() -> Self {
        Self { num_terms: 1 }
    }

    /// Two terms
    pub fn bi() -> Self {
        Self { num_terms: 2 }
    }

    /// Alias of [`MultiExponentialExtrapolator::mono`]
    pub fn exponential() -> Self {
        Self::mono()
    }

    /// Number of exponential terms
    pub fn num_terms(&self) -> usize {
        self.num_terms
    }

    fn num_params(&self) -> usize {
        2 * self.num_terms + 1
    }

    /// Evaluate the model
    pub fn model(x: f64, coefficients: &[f64]) -> f64 {
        let shift = coefficients.first().copied().unwrap_or(0.0);
        shift
            + coefficients
                .get(1..)
                .unwrap_or(&[])
                .chunks_exact(2)
                .map(|p| p[0] * (-p[1] * x).exp())
                .sum::<f64>()
    }

    fn jacobian(x: &[f64], coefficients: &[f64]) -> DMatrix<f64> {
        DMatrix::from_fn(x.len(), coefficients.len(), |i, j| {
            if j == 0 {
                return 1.0;
            }
            let term = (j - 1) / 2;
            let amplitude = coefficients[1 + 2 * term];
            let rate = coefficients[2 + 2 * term];
            let decay = (-rate * x[i]).exp();
            if j % 2 == 1 {
                decay
            } else {
                -amplitude * x[i] * decay
            }
        })
    }

    fn cost(data: &RegressionData, sigma: &[f64], coefficients: &[f64]) -> f64 {
        data.x
            .iter()
            .zip(&data.y)
            .zip(sigma)
            .map(|((&x, &y), s)| ((y - Self::model(x, coefficients)) / s).powi(2))
            .sum()
    }

    /// Fit coefficients to validated data
    ///
    /// Starts from `[1, 1/2, 1/4, …]` and projects rates onto `r ≥ 0`
    /// after every step.
    pub fn fit(&self, data: &RegressionData) -> ZneResult<RegressionFit> {
        let (sigma, weighting) = data.effective_sigma();
        let mut params: Vec<f64> = (0..self.num_params()).map(|i| 0.5f64.powi(i as i32)).collect();
        let mut cost = Self::cost(data, &sigma, &params);
        let mut damping = LM_INITIAL_DAMPING;
        let mut converged = false;
        let mut iterations = 0;

        while iterations < LM_MAX_ITERATIONS {
            iterations += 1;

            let residuals: Vec<f64> = data
                .x
                .iter()
                .zip(&data.y)
                .map(|(&x, &y)| y - Self::model(x, &params))
                .collect();
            let (jw, rw) = whiten(&Self::jacobian(&data.x, &params), &residuals, &sigma);
            let jtj = jw.transpose() * &jw;
            let gradient = jw.transpose() * rw;

            let mut improved = false;
            while damping < MAX_DAMPING {
                let mut system = jtj.clone();
                for k in 0..system.nrows() {
                    system[(k, k)] += damping * jtj[(k, k)].max(MIN_DAMPING);
                }
                let step = match system.lu().solve(&gradient) {
                    Some(step) => step,
                    None => {
                        damping *= 10.0;
                        continue;
                    }
                };

                let candidate = self.project(&params, &step);
                let candidate_cost = Self::cost(data, &sigma, &candidate);
                if candidate_cost.is_finite() && candidate_cost <= cost {
                    let relative = (cost - candidate_cost) / cost.max(f64::MIN_POSITIVE);
                    params = candidate;
                    cost = candidate_cost;
                    damping = (damping / 10.0).max(MIN_DAMPING);
                    improved = true;
                    converged = relative < LM_TOLERANCE || cost == 0.0;
                    break;
                }
                damping *= 10.0;
            }

            if !improved {
                // No downhill step at any damping: stationary point
                converged = true;
            }
            if converged {
                break;
            }
        }

        if params.iter().any(|p| !p.is_finite()) {
            return Err(ZneError::FitFailed(format!(
                "{}-term exponential fit diverged",
                self.num_terms
            )));
        }
        if !converged {
            log::warn!(
                "exponential fit did not converge in {} iterations, cost {:.3e}",
                LM_MAX_ITERATIONS,
                cost
            );
        }
        log::debug!(
            "exponential fit: {} iterations, cost {:.3e}, params {:?}",
            iterations,
            cost,
            params
        );

        let residuals = vec![0.0; data.len()];
        let (jw, _) = whiten(&Self::jacobian(&data.x, &params), &residuals, &sigma);
        let cov = covariance(&jw)?;
        let predicted: Vec<f64> = data.x.iter().map(|&x| Self::model(x, &params)).collect();
        let beta = DVector::from_vec(params);

        Ok(RegressionFit::new(&beta, &cov, &data.y, &predicted, &sigma, weighting))
    }

    fn project(&self, params: &[f64], step: &DVector<f64>) -> Vec<f64> {
        params
            .iter()
            .zip(step.iter())
            .enumerate()
            .map(|(j, (p, d))| {
                let next = p + d;
                // Rates sit at even positions after the shift
                if j > 0 && j % 2 == 0 {
                    next.max(0.0)
                } else {
                    next
                }
            })
            .collect()
    }

    fn value_gradient(&self) -> Vec<f64> {
        (0..self.num_params())
            .map(|j| if j == 0 || j % 2 == 1 { 1.0 } else { 0.0 })
            .collect()
    }

    fn constant_fit(&self, data: &RegressionData, constant: f64) -> RegressionFit {
        let (sigma, weighting) = data.effective_sigma();
        let precision: f64 = sigma.iter().map(|s| 1.0 / (s * s)).sum();

        let p = self.num_params();
        let mut cov = DMatrix::zeros(p, p);
        cov[(0, 0)] = 1.0 / precision;
        let mut beta = DVector::zeros(p);
        beta[0] = constant;

        RegressionFit::new(&beta, &cov, &data.y, &data.y, &sigma, weighting)
    }
}

impl Default for MultiExponentialExtrapolator {
    fn default() -> Self {
        Self::mono()
    }
}

impl Extrapolator for MultiExponentialExtrapolator {
    fn name(&self) -> &str {
        match self.num_terms {
            1 => "MonoExponentialExtrapolator",
            2 => "BiExponentialExtrapolator",
            _ => "MultiExponentialExtrapolator",
        }
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({ "num_terms": self.num_terms })
    }

    fn min_points(&self) -> usize {
        self.num_params()
    }

    fn extrapolate_zero(&self, data: &RegressionData) -> ZneResult<ReckoningResult> {
        let fit = match data.constant_y() {
            // Rates are unidentifiable on a flat profile
            Some(constant) => self.constant_fit(data, constant),
            None => self.fit(data)?,
        };

        let gradient = self.value_gradient();
        let value: f64 = fit
            .coefficients
            .iter()
            .zip(&gradient)
            .map(|(c, g)| c * g)
            .sum();

        Ok(ReckoningResult {
            value,
            std_error: fit.propagate(&gradient),
            metadata: fit.to_metadata(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
