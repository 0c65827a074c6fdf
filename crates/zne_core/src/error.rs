//! Error types for ZNE
//!
//! Gantree: L0_Foundation → Errors
//!
//! One error enum shared by amplification, extrapolation and orchestration.
//! Approximation of a noise factor is not an error, see
//! [`NoiseFactorApproximationWarning`](crate::types::NoiseFactorApproximationWarning).

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use thiserror::Error;

/// Main error type for ZNE
/// Gantree: ZneError // enum
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ZneError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Noise factor below one or not finite
    /// Gantree: InvalidNoiseFactor(f64) // nf < 1
    #[error("Invalid noise factor {0}: must be a finite value >= 1")]
    InvalidNoiseFactor(f64),

    /// Inconsistent strategy or amplifier configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    // ========================================================================
    // Circuit Errors
    // ========================================================================
    /// Folding requested on an instruction without a known inverse
    /// Gantree: UnsupportedInstruction(name) // no inverse
    #[error("Unsupported instruction '{0}': no known inverse, cannot be folded")]
    UnsupportedInstruction(String),

    /// Gate on non-existent qubit
    #[error("Gate references qubit {qubit} but circuit has only {num_qubits} qubits")]
    GateQubitMismatch { qubit: usize, num_qubits: usize },

    /// Malformed Pauli observable
    #[error("Invalid observable: {0}")]
    InvalidObservable(String),

    // ========================================================================
    // Regression Errors
    // ========================================================================
    /// Fewer data points than the regression model needs
    /// Gantree: InsufficientData{{got,needed}} // < min_points
    #[error("Insufficient data: {got} distinct data points provided, at least {needed} needed")]
    InsufficientData { got: usize, needed: usize },

    /// Independent variable has zero variance
    /// Gantree: DegenerateInput(String) // ill-posed fit
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Regression inputs of different lengths
    #[error(
        "Dimension mismatch: x={x}, y={y}, sigma_x={sigma_x}, sigma_y={sigma_y}; \
         all inputs must have the same size"
    )]
    DimensionMismatch {
        x: usize,
        y: usize,
        sigma_x: usize,
        sigma_y: usize,
    },

    /// Non-finite or otherwise unusable regression data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Numerical failure inside a fit
    #[error("Fit failed: {0}")]
    FitFailed(String),

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Estimation collaborator failure
    /// Gantree: EstimatorError(String) // external
    #[error("Estimator error: {0}")]
    EstimatorError(String),

    /// Number of results does not match the submitted experiments
    #[error("Inconsistent results: expected {expected}, received {received}")]
    InconsistentResults { expected: usize, received: usize },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Not implemented
    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

/// Result type alias for ZNE operations
/// Gantree: ZneResult<T> // type alias
pub type ZneResult<T> = Result<T, ZneError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for ZneError {
    fn from(err: serde_json::Error) -> Self {
        ZneError::JsonError(err.to_string())
    }
}

// ============================================================================
// Error Helpers
// ============================================================================

impl ZneError {
    /// Check if error only affects a single problem of a batch
    pub fn is_problem_scoped(&self) -> bool {
        matches!(
            self,
            ZneError::UnsupportedInstruction(_)
                | ZneError::GateQubitMismatch { .. }
                | ZneError::InvalidObservable(_)
                | ZneError::InsufficientData { .. }
                | ZneError::DegenerateInput(_)
                | ZneError::DimensionMismatch { .. }
                | ZneError::InvalidData(_)
                | ZneError::FitFailed(_)
        )
    }

    /// Check if error is raised while validating a configuration
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ZneError::InvalidNoiseFactor(_) | ZneError::InvalidConfiguration(_)
        )
    }

    /// Check if error is raised by the regression stage
    pub fn is_regression_error(&self) -> bool {
        matches!(
            self,
            ZneError::InsufficientData { .. }
                | ZneError::DegenerateInput(_)
                | ZneError::DimensionMismatch { .. }
                | ZneError::InvalidData(_)
                | ZneError::FitFailed(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ZneError::InvalidNoiseFactor(0.5);
        assert!(err.to_string().contains("0.5"));
    }

    #[test]
    fn test_insufficient_data_display() {
        let err = ZneError::InsufficientData { got: 1, needed: 2 };
        assert!(err.to_string().contains('1'));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn test_is_problem_scoped() {
        assert!(ZneError::InsufficientData { got: 1, needed: 2 }.is_problem_scoped());
        assert!(ZneError::UnsupportedInstruction("measure".into()).is_problem_scoped());
        assert!(!ZneError::EstimatorError("down".into()).is_problem_scoped());
    }

    #[test]
    fn test_is_configuration_error() {
        assert!(ZneError::InvalidNoiseFactor(0.0).is_configuration_error());
        assert!(!ZneError::DegenerateInput("x".into()).is_configuration_error());
    }

    #[test]
    fn test_json_conversion() {
        let err: ZneError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, ZneError::JsonError(_)));
    }
}
