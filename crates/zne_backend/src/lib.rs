//! # ZNE Backend
//!
//! Estimation collaborator interface and a noisy reference simulator.
//!
//! ## Gantree Architecture
//!
//! ```text
//! zne_backend // L2: Backend
//!     EstimatorTrait // Estimator, EstimationJob, RunOptions, RawMeasurement
//!     NoiseModel // depolarizing + readout
//!     SimulatorEstimator // state vector + analytic damping + sampling
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use zne_backend::prelude::*;
//! use zne_core::CircuitBuilder;
//!
//! let estimator = SimulatorEstimator::from_depol(0.002).unwrap();
//! let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).build();
//! let job = EstimationJob::new(circuit, "ZZ".parse().unwrap()).unwrap();
//!
//! let result = estimator.estimate_one(&job, &RunOptions::exact()).unwrap();
//! assert!(result.value < 1.0);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Estimator trait and execution types (Gantree: L2_Backend → EstimatorTrait)
pub mod estimator;

/// Noise model (Gantree: L2_Backend → NoiseModel)
pub mod noise;

/// Simulator estimator (Gantree: L2_Backend → SimulatorEstimator)
pub mod simulator;

// ============================================================================
// Re-exports
// ============================================================================

pub use estimator::{EstimationJob, Estimator, RawMeasurement, RunOptions};
pub use noise::NoiseModel;
pub use simulator::{SimulatorEstimator, StateVector};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use zne_backend::prelude::*;
    //! ```

    pub use crate::estimator::{EstimationJob, Estimator, RawMeasurement, RunOptions};
    pub use crate::noise::NoiseModel;
    pub use crate::simulator::{SimulatorEstimator, StateVector};
}

// ============================================================================
// Integration Tests
// ============================================================================
