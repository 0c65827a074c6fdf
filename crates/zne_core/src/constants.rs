//! Constants for ZNE
//!
//! Gantree: L0_Foundation → Constants
//!
//! Strategy defaults and numerical thresholds.

// ============================================================================
// Strategy Defaults
// Gantree: zne // 전략 기본값
// ============================================================================

pub mod zne {
    //! Defaults of the ZNE strategy configuration surface

    /// Default noise factors
    pub const DEFAULT_NOISE_FACTORS: [f64; 3] = [1.0, 3.0, 5.0];

    /// Default relative tolerance between requested and realized noise factor
    pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-2;

    /// Barriers are inserted around folded gates by default
    pub const DEFAULT_INSERT_BARRIERS: bool = true;

    /// Default shots per estimator execution
    pub const DEFAULT_SHOTS: u64 = 4096;

    /// Upper bound on the total number of folds in one amplification
    pub const MAX_NUM_FOLDINGS: usize = 1 << 20;
}

// ============================================================================
// Numerical Thresholds
// Gantree: numeric // 수치 임계값
// ============================================================================

pub mod numeric {
    //! Tolerances used by the regression engine

    /// Relative magnitude below which a std error counts as zero
    pub const SIGMA_ZERO_RTOL: f64 = 1e-8;

    /// Absolute magnitude below which a std error counts as zero
    pub const SIGMA_ZERO_ATOL: f64 = 1e-12;

    /// Variance of the independent variable below which a fit is ill-posed
    pub const X_VARIANCE_EPS: f64 = 1e-14;

    /// Levenberg-Marquardt iteration cap
    pub const LM_MAX_ITERATIONS: usize = 500;

    /// Levenberg-Marquardt relative cost improvement for convergence
    pub const LM_TOLERANCE: f64 = 1e-12;

    /// Initial Levenberg-Marquardt damping
    pub const LM_INITIAL_DAMPING: f64 = 1e-3;

    /// Check whether a std error should be treated as zero
    #[inline]
    pub fn is_zero_sigma(sigma: f64, value: f64) -> bool {
        sigma.abs() <= SIGMA_ZERO_ATOL + SIGMA_ZERO_RTOL * value.abs()
    }
}

// ============================================================================
// Tests
// ============================================================================
