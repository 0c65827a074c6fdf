//! Extrapolator trait and input validation
//!
//! Gantree: L4_Extrapolation → Extrapolator

use crate::regression::RegressionData;
use serde::{Deserialize, Serialize};
use std::fmt;
use zne_core::numeric::X_VARIANCE_EPS;
use zne_core::{ZneError, ZneResult};

// ============================================================================
// Reckoning Result
// ============================================================================

/// Zero-noise estimate
/// Gantree: ReckoningResult // value, std_error, metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReckoningResult {
    /// Model value at zero noise
    pub value: f64,

    /// Propagated std error of `value`
    pub std_error: f64,

    /// Fit details
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl fmt::Display for ReckoningResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} ± {:.6}", self.value, self.std_error)
    }
}

// ============================================================================
// Trait
// ============================================================================

/// Zero-noise extrapolation model
/// Gantree: Extrapolator // trait
pub trait Extrapolator: Send + Sync + fmt::Debug {
    /// Model name
    fn name(&self) -> &str;

    /// Model options, reported in result metadata
    fn options(&self) -> serde_json::Value;

    /// Minimum number of distinct `x` values for a fit
    fn min_points(&self) -> usize;

    /// Fit validated data and evaluate at zero
    fn extrapolate_zero(&self, data: &RegressionData) -> ZneResult<ReckoningResult>;

    /// Validate and default the inputs
    fn validate(
        &self,
        x: &[f64],
        y: &[f64],
        sigma_x: Option<&[f64]>,
        sigma_y: Option<&[f64]>,
    ) -> ZneResult<RegressionData> {
        validate_data(self.min_points(), x, y, sigma_x, sigma_y)
    }

    /// Extrapolate `y(x)` to `x = 0`
    ///
    /// Missing `sigma_x` defaults to zeros, missing `sigma_y` to ones.
    /// Gantree: extrapolate(x, y, σx, σy) -> Result<ReckoningResult>
    fn extrapolate(
        &self,
        x: &[f64],
        y: &[f64],
        sigma_x: Option<&[f64]>,
        sigma_y: Option<&[f64]>,
    ) -> ZneResult<ReckoningResult> {
        let data = self.validate(x, y, sigma_x, sigma_y)?;
        self.extrapolate_zero(&data)
    }
}

/// Shared input validation
///
/// Checks, in order: equal lengths, finite values and non-negative std
/// errors, `len ≥ min_points`, non-zero variance of `x`, and at least
/// `min_points` distinct `x` values.
pub fn validate_data(
    min_points: usize,
    x: &[f64],
    y: &[f64],
    sigma_x: Option<&[f64]>,
    sigma_y: Option<&[f64]>,
) -> ZneResult<RegressionData> {
    let sigma_x = sigma_x.map_or_else(|| vec![0.0; x.len()], <[f64]>::to_vec);
    let sigma_y = sigma_y.map_or_else(|| vec![1.0; y.len()], <[f64]>::to_vec);

    let n = x.len();
    if y.len() != n || sigma_x.len() != n || sigma_y.len() != n {
        return Err(ZneError::DimensionMismatch {
            x: n,
            y: y.len(),
            sigma_x: sigma_x.len(),
            sigma_y: sigma_y.len(),
        });
    }

    let columns = [
        ("x", x),
        ("y", y),
        ("sigma_x", sigma_x.as_slice()),
        ("sigma_y", sigma_y.as_slice()),
    ];
    for (label, values) in columns {
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ZneError::InvalidData(format!("{} contains {}", label, bad)));
        }
    }
    for (label, values) in &columns[2..] {
        if let Some(bad) = values.iter().find(|&&v| v < 0.0) {
            return Err(ZneError::InvalidData(format!(
                "{} contains negative std error {}",
                label, bad
            )));
        }
    }

    if n < min_points {
        return Err(ZneError::InsufficientData {
            got: n,
            needed: min_points,
        });
    }

    let mean = x.iter().sum::<f64>() / n as f64;
    let variance = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    if variance <= X_VARIANCE_EPS {
        return Err(ZneError::DegenerateInput(format!(
            "all {} x values are equal to {}",
            n, mean
        )));
    }

    let distinct = count_distinct(x);
    if distinct < min_points {
        return Err(ZneError::InsufficientData {
            got: distinct,
            needed: min_points,
        });
    }

    Ok(RegressionData {
        x: x.to_vec(),
        y: y.to_vec(),
        sigma_x,
        sigma_y,
    })
}

fn count_distinct(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let data = validate_data(2, &[1.0, 3.0], &[0.5, 0.4], None, None).unwrap();
        assert_eq!(data.sigma_x, vec![0.0, 0.0]);
        assert_eq!(data.sigma_y, vec![1.0, 1.0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = validate_data(2, &[1.0, 3.0], &[0.5], None, None).unwrap_err();
        assert!(matches!(err, ZneError::DimensionMismatch { x: 2, y: 1, .. }));

        let err = validate_data(2, &[1.0, 3.0], &[0.5, 0.4], None, Some(&[0.1])).unwrap_err();
        assert!(matches!(err, ZneError::DimensionMismatch { sigma_y: 1, .. }));
    }

    #[test]
    fn test_non_finite() {
        let err = validate_data(2, &[1.0, f64::NAN], &[0.5, 0.4], None, None).unwrap_err();
        assert!(matches!(err, ZneError::InvalidData(_)));

        let err =
            validate_data(2, &[1.0, 3.0], &[0.5, 0.4], None, Some(&[0.1, -0.1])).unwrap_err();
        assert!(matches!(err, ZneError::InvalidData(_)));
    }

    #[test]
    fn test_too_few_points() {
        let err = validate_data(3, &[1.0, 3.0], &[0.5, 0.4], None, None).unwrap_err();
        assert!(matches!(err, ZneError::InsufficientData { got: 2, needed: 3 }));
    }

    #[test]
    fn test_degenerate_x() {
        let err = validate_data(2, &[2.0, 2.0, 2.0], &[0.5, 0.4, 0.3], None, None).unwrap_err();
        assert!(matches!(err, ZneError::DegenerateInput(_)));
    }

    #[test]
    fn test_too_few_distinct() {
        let err = validate_data(3, &[1.0, 1.0, 3.0], &[0.5, 0.5, 0.4], None, None).unwrap_err();
        assert!(matches!(err, ZneError::InsufficientData { got: 2, needed: 3 }));
    }
}
