//! Core types for ZNE
//!
//! Gantree: L0_Foundation → CoreTypes
//!
//! Type aliases and small validated value types shared across crates.

use crate::error::{ZneError, ZneResult};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Qubit identifier (0-indexed)
pub type QubitId = usize;

/// Rotation angle in radians
pub type Angle = f64;

/// Noise amplification factor (1 = unmodified circuit)
pub type NoiseFactor = f64;


// ============================================================================
// Noise Factor Validation
// ============================================================================

/// Validate a single noise factor
///
/// Fails with [`ZneError::InvalidNoiseFactor`] if the factor is below one,
/// NaN or infinite.
pub fn validate_noise_factor(noise_factor: NoiseFactor) -> ZneResult<NoiseFactor> {
    if !noise_factor.is_finite() || noise_factor < 1.0 {
        return Err(ZneError::InvalidNoiseFactor(noise_factor));
    }
    Ok(noise_factor)
}

/// Noise factor realized by a (possibly fractional) number of foldings
#[inline]
pub fn folding_to_noise_factor(folding: f64) -> NoiseFactor {
    2.0 * folding + 1.0
}

// ============================================================================
// Approximation Warning
// ============================================================================

/// Realized noise factor deviates from the requested one beyond tolerance
///
/// Non-fatal. Amplification proceeds with the closest realizable factor and
/// extrapolation still uses the requested factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseFactorApproximationWarning {
    /// Factor requested by the caller
    pub requested: NoiseFactor,

    /// Factor actually realized by folding
    pub realized: NoiseFactor,

    /// `|realized - requested| / requested`
    pub relative_error: f64,

    /// Tolerance that was exceeded
    pub tolerance: f64,
}

impl NoiseFactorApproximationWarning {
    /// Compare a realized factor with the requested one
    ///
    /// Returns `None` if the relative error is within tolerance.
    pub fn check(requested: NoiseFactor, realized: NoiseFactor, tolerance: f64) -> Option<Self> {
        let relative_error = (realized - requested).abs() / requested;
        if relative_error > tolerance {
            Some(Self {
                requested,
                realized,
                relative_error,
                tolerance,
            })
        } else {
            None
        }
    }
}

impl fmt::Display for NoiseFactorApproximationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rounding of noise factor: foldings are performed with noise factor {:.2} \
             instead of specified noise factor {:.2} which amounts to a relative error of {:.2}%",
            self.realized,
            self.requested,
            self.relative_error * 100.0
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
