//! # ZNE Extrapolation
//!
//! Regression models that extrapolate expectation values to zero noise.
//!
//! ## Gantree Architecture
//!
//! ```text
//! zne_extrapolation // L4: Extrapolation
//!     Extrapolator // trait, shared validation, ReckoningResult
//!     Regression // weighted least squares, covariance, fit statistics
//!     PolynomialExtrapolator // linear, quadratic, cubic, quartic
//!     MultiExponentialExtrapolator // mono, bi (Levenberg-Marquardt)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use zne_extrapolation::prelude::*;
//!
//! let x = [1.0, 3.0, 5.0];
//! let y = [0.80, 0.60, 0.40];
//!
//! let result = PolynomialExtrapolator::linear()
//!     .extrapolate(&x, &y, None, None)
//!     .unwrap();
//!
//! assert!((result.value - 0.9).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Extrapolator trait (Gantree: L4_Extrapolation → Extrapolator)
pub mod extrapolator;

/// Least-squares machinery (Gantree: L4_Extrapolation → Regression)
pub mod regression;

/// Polynomial models (Gantree: L4_Extrapolation → PolynomialExtrapolator)
pub mod polynomial;

/// Exponential models (Gantree: L4_Extrapolation → MultiExponentialExtrapolator)
pub mod exponential;

// ============================================================================
// Re-exports
// ============================================================================

pub use exponential::MultiExponentialExtrapolator;
pub use extrapolator::{validate_data, Extrapolator, ReckoningResult};
pub use polynomial::PolynomialExtrapolator;
pub use regression::{RegressionData, RegressionFit, Weighting};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use zne_extrapolation::prelude::*;
    //! ```

    pub use crate::exponential::MultiExponentialExtrapolator;
    pub use crate::extrapolator::{Extrapolator, ReckoningResult};
    pub use crate::polynomial::PolynomialExtrapolator;
}

// ============================================================================
// Integration Tests
// ============================================================================
