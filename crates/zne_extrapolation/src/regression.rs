//! Weighted least-squares machinery
//!
//! Gantree: L4_Extrapolation → Regression
//!
//! Absolute-sigma weighting `W = diag(1/σ²)`; parameter covariance is
//! `(JᵀWJ)⁻¹` with `J` the model Jacobian at the solution.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use zne_core::numeric::is_zero_sigma;
use zne_core::{ZneError, ZneResult};

/// Singular values below this fraction of the largest are dropped
const PSEUDO_INVERSE_EPS: f64 = 1e-12;

// ============================================================================
// Regression Data
// ============================================================================

/// Validated regression input
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionData {
    /// Independent variable (noise factors)
    pub x: Vec<f64>,

    /// Dependent variable (expectation values)
    pub y: Vec<f64>,

    /// Std errors of `x`
    pub sigma_x: Vec<f64>,

    /// Std errors of `y`
    pub sigma_y: Vec<f64>,
}

impl RegressionData {
    /// Number of points
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Check if there are no points
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Returns the common value if every `y` is identical
    pub fn constant_y(&self) -> Option<f64> {
        let first = *self.y.first()?;
        self.y.iter().all(|&v| v == first).then_some(first)
    }

    /// Std errors used as fit weights
    ///
    /// Falls back to unit weights for every point when any `sigma_y` is
    /// zero relative to its value.
    pub fn effective_sigma(&self) -> (Vec<f64>, Weighting) {
        let degenerate = self
            .sigma_y
            .iter()
            .zip(&self.y)
            .any(|(&s, &v)| is_zero_sigma(s, v));

        if degenerate {
            log::debug!("zero std error in input, falling back to unit weights");
            (vec![1.0; self.len()], Weighting::Unit)
        } else {
            (self.sigma_y.clone(), Weighting::SigmaY)
        }
    }
}

/// Weights applied in a fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// `1/σ_y²`
    SigmaY,

    /// All ones
    Unit,
}

// ============================================================================
// Regression Fit
// ============================================================================

/// Outcome of one regression
/// Gantree: RegressionFit // coefficients, covariance, residuals, R², χ²ᵣ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionFit {
    /// Fitted coefficients
    pub coefficients: Vec<f64>,

    /// `sqrt(diag(Σ))`
    pub std_errors: Vec<f64>,

    /// Parameter covariance `Σ`, row-major
    pub covariance: Vec<Vec<f64>>,

    /// `y − model(x)`
    pub residuals: Vec<f64>,

    /// Coefficient of determination
    pub r_squared: f64,

    /// `χ² / (n − p)`, absent without degrees of freedom
    pub reduced_chi_squared: Option<f64>,

    /// Weights used
    pub weighting: Weighting,
}

impl RegressionFit {
    /// Assemble fit statistics
    pub fn new(
        coefficients: &DVector<f64>,
        covariance: &DMatrix<f64>,
        y: &[f64],
        predicted: &[f64],
        sigma: &[f64],
        weighting: Weighting,
    ) -> Self {
        let residuals: Vec<f64> = y.iter().zip(predicted).map(|(a, b)| a - b).collect();
        let dof = y.len().saturating_sub(coefficients.len());
        let chi_squared: f64 = residuals
            .iter()
            .zip(sigma)
            .map(|(r, s)| (r / s).powi(2))
            .sum();

        Self {
            coefficients: coefficients.iter().copied().collect(),
            std_errors: covariance.diagonal().iter().map(|v| v.max(0.0).sqrt()).collect(),
            covariance: covariance
                .row_iter()
                .map(|row| row.iter().copied().collect())
                .collect(),
            r_squared: r_squared(y, &residuals),
            residuals,
            reduced_chi_squared: (dof > 0).then(|| chi_squared / dof as f64),
            weighting,
        }
    }

    /// Std error of `gradient · coefficients`, `sqrt(gᵀ Σ g)`
    pub fn propagate(&self, gradient: &[f64]) -> f64 {
        let mut variance = 0.0;
        for (i, gi) in gradient.iter().enumerate() {
            for (j, gj) in gradient.iter().enumerate() {
                variance += gi * self.covariance[i][j] * gj;
            }
        }
        variance.max(0.0).sqrt()
    }

    /// Fit fields as result metadata
    pub fn to_metadata(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("coefficients".into(), serde_json::json!(self.coefficients));
        map.insert("std_errors".into(), serde_json::json!(self.std_errors));
        map.insert("covariance_matrix".into(), serde_json::json!(self.covariance));
        map.insert("residuals".into(), serde_json::json!(self.residuals));
        map.insert("R2".into(), serde_json::json!(self.r_squared));
        map.insert(
            "reduced_chi_squared".into(),
            serde_json::json!(self.reduced_chi_squared),
        );
        map.insert("weighting".into(), serde_json::json!(self.weighting));
        map
    }
}

/// `1 − RSS/TSS`, defined as 1 for a perfect fit of constant data
pub fn r_squared(y: &[f64], residuals: &[f64]) -> f64 {
    let mean = y.iter().sum::<f64>() / y.len() as f64;
    let tss: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let rss: f64 = residuals.iter().map(|r| r * r).sum();
    if tss == 0.0 {
        if rss == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - rss / tss
    }
}

// ============================================================================
// Linear Solver
// ============================================================================

/// Scale design rows and targets by `1/σ`
pub fn whiten(design: &DMatrix<f64>, y: &[f64], sigma: &[f64]) -> (DMatrix<f64>, DVector<f64>) {
    let mut jw = design.clone();
    for (mut row, s) in jw.row_iter_mut().zip(sigma) {
        row /= *s;
    }
    let yw = DVector::from_iterator(y.len(), y.iter().zip(sigma).map(|(v, s)| v / s));
    (jw, yw)
}

/// `(JwᵀJw)⁻¹`, pseudo-inverse when singular
pub fn covariance(jw: &DMatrix<f64>) -> ZneResult<DMatrix<f64>> {
    let normal = jw.transpose() * jw;
    if let Some(inverse) = normal.clone().try_inverse() {
        if inverse.iter().all(|v| v.is_finite()) {
            return Ok(inverse);
        }
    }
    log::warn!("normal matrix is singular, covariance from pseudo-inverse");
    normal
        .pseudo_inverse(PSEUDO_INVERSE_EPS)
        .map_err(|e| ZneError::FitFailed(e.to_string()))
}

/// Weighted linear least squares `min ‖W^½ (y − Dβ)‖²`
///
/// Returns `(β, Σ)`.
/// Gantree: weighted_least_squares(D, y, σ) -> Result<(β, Σ)>
pub fn weighted_least_squares(
    design: &DMatrix<f64>,
    y: &[f64],
    sigma: &[f64],
) -> ZneResult<(DVector<f64>, DMatrix<f64>)> {
    let (jw, yw) = whiten(design, y, sigma);
    let cov = covariance(&jw)?;
    let beta = &cov * (jw.transpose() * yw);

    if beta.iter().any(|v| !v.is_finite()) {
        return Err(ZneError::FitFailed("non-finite regression coefficients".into()));
    }
    Ok((beta, cov))
}

// ============================================================================
// Tests
// ============================================================================
