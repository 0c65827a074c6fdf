//! Polynomial extrapolator
//!
//! Gantree: L4_Extrapolation → PolynomialExtrapolator
//!
//! Weighted linear least squares on `Σ cᵢ xⁱ`; the zero-noise value is the
//! intercept `c₀` with std error `sqrt(Σ₀₀)`.

use crate::extrapolator::{Extrapolator, ReckoningResult};
use crate::regression::{weighted_least_squares, RegressionData, RegressionFit};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use zne_core::{ZneError, ZneResult};

/// Polynomial regression of fixed degree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolynomialExtrapolator {
    degree: usize,
}

impl PolynomialExtrapolator {
    /// Create for a degree of at least one
    pub fn new(degree: usize) -> ZneResult<Self> {
        if degree < 1 {
            return Err(ZneError::InvalidConfiguration(
                "polynomial degree must be at least 1".into(),
            ));
        }
        Ok(Self { degree })
    }

    /// Degree 1
    pub fn linear() -> Self {
        Self { degree: 1 }
    }

    /// Degree 2
    pub fn quadratic() -> Self {
        Self { degree: 2 }
    }

    /// Degree 3
    pub fn cubic() -> Self {
        Self { degree: 3 }
    }

    /// Degree 4
    pub fn quartic() -> Self {
        Self { degree: 4 }
    }

    /// Polynomial degree
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Evaluate `Σ cᵢ xⁱ`
    pub fn model(x: f64, coefficients: &[f64]) -> f64 {
        coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    fn design(&self, x: &[f64]) -> DMatrix<f64> {
        DMatrix::from_fn(x.len(), self.degree + 1, |i, j| x[i].powi(j as i32))
    }

    /// Fit coefficients to validated data
    pub fn fit(&self, data: &RegressionData) -> ZneResult<RegressionFit> {
        let (sigma, weighting) = data.effective_sigma();
        let (beta, cov) = weighted_least_squares(&self.design(&data.x), &data.y, &sigma)?;

        let coefficients: Vec<f64> = beta.iter().copied().collect();
        let predicted: Vec<f64> = data
            .x
            .iter()
            .map(|&x| Self::model(x, &coefficients))
            .collect();

        Ok(RegressionFit::new(&beta, &cov, &data.y, &predicted, &sigma, weighting))
    }
}

impl Default for PolynomialExtrapolator {
    fn default() -> Self {
        Self::linear()
    }
}

impl Extrapolator for PolynomialExtrapolator {
    fn name(&self) -> &str {
        match self.degree {
            1 => "LinearExtrapolator",
            2 => "QuadraticExtrapolator",
            3 => "CubicExtrapolator",
            4 => "QuarticExtrapolator",
            _ => "PolynomialExtrapolator",
        }
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({ "degree": self.degree })
    }

    fn min_points(&self) -> usize {
        self.degree + 1
    }

    fn extrapolate_zero(&self, data: &RegressionData) -> ZneResult<ReckoningResult> {
        let mut fit = self.fit(data)?;

        if let Some(constant) = data.constant_y() {
            fit.coefficients = vec![0.0; self.degree + 1];
            fit.coefficients[0] = constant;
            fit.residuals = vec![0.0; data.len()];
            fit.r_squared = 1.0;
            fit.reduced_chi_squared = fit.reduced_chi_squared.map(|_| 0.0);
        }

        let mut gradient = vec![0.0; self.degree + 1];
        gradient[0] = 1.0;

        log::debug!(
            "{}: fitted {:?} on {} points",
            self.name(),
            fit.coefficients,
            data.len()
        );

        Ok(ReckoningResult {
            value: fit.coefficients[0],
            std_error: fit.propagate(&gradient),
            metadata: fit.to_metadata(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const X: [f64; 3] = [1.0, 3.0, 5.0];
    const Y: [f64; 3] = [0.894531, 0.822266, 0.759766];

    #[test]
    fn test_linear_ols() {
        // Closed form: slope = Σ(x−x̄)(y−ȳ) / Σ(x−x̄)²
        let x_mean = X.iter().sum::<f64>() / 3.0;
        let y_mean = Y.iter().sum::<f64>() / 3.0;
        let sxy: f64 = X.iter().zip(&Y).map(|(x, y)| (x - x_mean) * (y - y_mean)).sum();
        let sxx: f64 = X.iter().map(|x| (x - x_mean).powi(2)).sum();
        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;

        let result = PolynomialExtrapolator::linear()
            .extrapolate(&X, &Y, None, None)
            .unwrap();
        assert_relative_eq!(result.value, intercept, epsilon = 1e-10);

        // Unit sigma: var(c₀) = Σx² / (n·Sxx)
        let sum_x2: f64 = X.iter().map(|x| x * x).sum();
        assert_relative_eq!(
            result.std_error,
            (sum_x2 / (3.0 * sxx)).sqrt(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_quadratic_interpolates() {
        // Lagrange polynomial through three points, evaluated at 0
        let lagrange: f64 = (0..3)
            .map(|i| {
                let weight: f64 = (0..3)
                    .filter(|&j| j != i)
                    .map(|j| (0.0 - X[j]) / (X[i] - X[j]))
                    .product();
                weight * Y[i]
            })
            .sum();

        let result = PolynomialExtrapolator::quadratic()
            .extrapolate(&X, &Y, None, Some(&[0.01, 0.01, 0.01]))
            .unwrap();
        assert_relative_eq!(result.value, lagrange, epsilon = 1e-9);
        assert!(result.metadata["reduced_chi_squared"].is_null());
        for r in result.metadata["residuals"].as_array().unwrap() {
            assert!(r.as_f64().unwrap().abs() < 1e-9);
        }
    }

    #[test]
    fn test_metadata_keys() {
        let result = PolynomialExtrapolator::linear()
            .extrapolate(&X, &Y, None, Some(&[0.01, 0.02, 0.03]))
            .unwrap();
        for key in [
            "coefficients",
            "std_errors",
            "covariance_matrix",
            "residuals",
            "R2",
            "reduced_chi_squared",
        ] {
            assert!(result.metadata.contains_key(key), "missing {}", key);
        }
        assert_eq!(result.metadata["weighting"], "sigma_y");
    }

    #[test]
    fn test_constant_y_exact() {
        let result = PolynomialExtrapolator::quadratic()
            .extrapolate(&[1.0, 2.0, 3.0, 4.0], &[0.37; 4], None, Some(&[0.1; 4]))
            .unwrap();
        assert_eq!(result.value, 0.37);
        assert!(result.std_error > 0.0);
    }

    #[test]
    fn test_zero_sigma_falls_back() {
        let result = PolynomialExtrapolator::linear()
            .extrapolate(&X, &Y, None, Some(&[0.0, 0.01, 0.01]))
            .unwrap();
        let unweighted = PolynomialExtrapolator::linear()
            .extrapolate(&X, &Y, None, None)
            .unwrap();
        assert_relative_eq!(result.value, unweighted.value, epsilon = 1e-12);
        assert_eq!(result.metadata["weighting"], "unit");
    }

    #[test]
    fn test_insufficient_points() {
        let err = PolynomialExtrapolator::cubic()
            .extrapolate(&X, &Y, None, None)
            .unwrap_err();
        assert!(matches!(err, ZneError::InsufficientData { got: 3, needed: 4 }));
    }

    #[test]
    fn test_names_and_degree() {
        assert!(PolynomialExtrapolator::new(0).is_err());
        assert_eq!(PolynomialExtrapolator::quartic().name(), "QuarticExtrapolator");
        assert_eq!(PolynomialExtrapolator::new(6).unwrap().name(), "PolynomialExtrapolator");
        assert_eq!(PolynomialExtrapolator::cubic().min_points(), 4);
    }

    #[test]
    fn test_model_horner() {
        assert_relative_eq!(PolynomialExtrapolator::model(2.0, &[1.0, -1.0, 0.5]), 1.0);
    }
}
