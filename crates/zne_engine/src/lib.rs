//! # ZNE Engine
//!
//! Strategy configuration and the zero-noise extrapolation pipeline.
//!
//! ## Gantree Architecture
//!
//! ```text
//! zne_engine // L5: Engine
//!     ZneStrategy // amplifier, factors, extrapolator, noop/active
//!     NoiseAmplificationOrchestrator // problems × factors, one batch, demux
//!     ZneMetadata // std_error + zne.{noise_amplification, extrapolation}
//!     ZneEstimator // mitigate(problems) -> Vec<Result<MitigatedResult>>
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use zne_engine::prelude::*;
//! use zne_backend::{EstimationJob, NoiseModel, RunOptions, SimulatorEstimator};
//! use zne_core::CircuitBuilder;
//!
//! let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).build();
//! let job = EstimationJob::new(circuit, "ZZ".parse().unwrap()).unwrap();
//!
//! let noise = NoiseModel::new(0.0, 0.02, 0.0).unwrap();
//! let estimator = ZneEstimator::new(
//!     SimulatorEstimator::new(noise),
//!     ZneStrategy::builder().build().unwrap(),
//! );
//!
//! let result = estimator.mitigate_one(&job, &RunOptions::exact()).unwrap();
//! assert!((result.value - 1.0).abs() < 0.005);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Strategy configuration (Gantree: L5_Engine → ZneStrategy)
pub mod strategy;

/// Cross product and batching (Gantree: L5_Engine → NoiseAmplificationOrchestrator)
pub mod orchestrator;

/// Result metadata (Gantree: L5_Engine → ZneMetadata)
pub mod metadata;

/// Mitigating estimator (Gantree: L5_Engine → ZneEstimator)
pub mod estimator;

// ============================================================================
// Re-exports
// ============================================================================

pub use estimator::{MitigatedResult, ZneEstimator};
pub use metadata::{
    ComponentInfo, ExtrapolationMetadata, NoiseAmplificationMetadata, ZneMetadata, ZneSection,
};
pub use orchestrator::{NoiseAmplificationOrchestrator, NoiseAmplificationRecord};
pub use strategy::{StrategyMode, ZneStrategy, ZneStrategyBuilder};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use zne_engine::prelude::*;
    //! ```

    pub use crate::estimator::{MitigatedResult, ZneEstimator};
    pub use crate::metadata::ZneMetadata;
    pub use crate::orchestrator::{NoiseAmplificationOrchestrator, NoiseAmplificationRecord};
    pub use crate::strategy::{StrategyMode, ZneStrategy, ZneStrategyBuilder};
    pub use zne_amplification::prelude::*;
    pub use zne_extrapolation::prelude::*;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use approx::assert_relative_eq;
    use zne_backend::{
        EstimationJob, Estimator, NoiseModel, RawMeasurement, RunOptions, SimulatorEstimator,
    };
    use zne_core::{CircuitBuilder, ZneError, ZneResult};

    fn ghz(n: usize) -> EstimationJob {
        let circuit = CircuitBuilder::new(n).h(0).cx_chain().build();
        // ZZ on a qubit pair is +1 on the GHZ state
        let label = format!("ZZ{}", "I".repeat(n - 2));
        EstimationJob::new(circuit, label.parse().unwrap()).unwrap()
    }

    fn measured_bell() -> EstimationJob {
        let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).measure_all().build();
        EstimationJob::new(circuit, "ZZ".parse().unwrap()).unwrap()
    }

    fn noisy() -> SimulatorEstimator {
        SimulatorEstimator::new(NoiseModel::new(0.0, 0.02, 0.0).unwrap())
    }

    #[test]
    fn test_zne_beats_raw() {
        let job = ghz(3);
        let options = RunOptions::exact();
        let raw = noisy().estimate_one(&job, &options).unwrap();

        for extrapolator in [
            PolynomialExtrapolator::linear(),
            PolynomialExtrapolator::quadratic(),
        ] {
            let strategy = ZneStrategy::builder()
                .extrapolator(extrapolator)
                .build()
                .unwrap();
            let result = ZneEstimator::new(noisy(), strategy)
                .mitigate_one(&job, &options)
                .unwrap();
            assert!(
                (result.value - 1.0).abs() < (raw.value - 1.0).abs(),
                "{}: {} vs raw {}",
                extrapolator.name(),
                result.value,
                raw.value
            );
        }
    }

    #[test]
    fn test_noop_bit_identical() {
        let job = ghz(2);
        let options = RunOptions::default().with_seed(11);
        let raw = noisy().estimate_one(&job, &options).unwrap();

        for strategy in [
            ZneStrategy::noop(),
            ZneStrategy::builder().noise_factors([1.0]).build().unwrap(),
        ] {
            let result = ZneEstimator::new(noisy(), strategy)
                .mitigate_one(&job, &options)
                .unwrap();
            assert_eq!(result.value.to_bits(), raw.value.to_bits());
            assert_eq!(result.variance.to_bits(), raw.variance.to_bits());
            assert!(result.metadata.is_none());
        }
    }

    #[test]
    fn test_partial_failure() {
        let strategy = ZneStrategy::builder()
            .noise_amplifier(GlobalFoldingAmplifier::new())
            .build()
            .unwrap();
        let estimator = ZneEstimator::new(noisy(), strategy);

        let results = estimator.mitigate(
            &[ghz(2), measured_bell(), ghz(3)],
            &RunOptions::exact(),
        );
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ZneError::UnsupportedInstruction(_))));
        assert!(results[2].is_ok());
    }

    /// Linear decay in the cx count; three-qubit circuits come back as NaN
    struct PoisonsWideCircuits;

    impl Estimator for PoisonsWideCircuits {
        fn name(&self) -> &str {
            "poisons_wide_circuits"
        }

        fn estimate(
            &self,
            jobs: &[EstimationJob],
            _options: &RunOptions,
        ) -> ZneResult<Vec<RawMeasurement>> {
            Ok(jobs
                .iter()
                .map(|j| {
                    let value = if j.circuit.num_qubits() == 3 {
                        f64::NAN
                    } else {
                        0.9 - 0.05 * j.circuit.count_2q() as f64
                    };
                    RawMeasurement::new(value, 0.25, 1000)
                })
                .collect())
        }
    }

    #[test]
    fn test_failed_extrapolation_isolated() {
        let strategy = ZneStrategy::builder()
            .noise_amplifier(CxAmplifier::new())
            .build()
            .unwrap();
        let estimator = ZneEstimator::new(PoisonsWideCircuits, strategy);

        let results = estimator.mitigate(&[ghz(2), ghz(3), ghz(2)], &RunOptions::default());
        assert_eq!(results.len(), 3);
        assert!(matches!(results[1], Err(ZneError::InvalidData(_))));
        for index in [0, 2] {
            let result = results[index].as_ref().unwrap();
            assert_relative_eq!(result.value, 0.9, epsilon = 1e-10);
            assert_eq!(result.shots, 3000);
            assert!(result.is_mitigated());
        }
    }

    #[test]
    fn test_metadata_shape() {
        let estimator = ZneEstimator::new(noisy(), ZneStrategy::default());
        let result = estimator
            .mitigate_one(&ghz(2), &RunOptions::default().with_seed(3))
            .unwrap();
        let json = serde_json::to_value(result.metadata.unwrap()).unwrap();

        assert!(json["std_error"].is_number());
        let amplification = &json["zne"]["noise_amplification"];
        assert_eq!(amplification["noise_amplifier"]["name"], "MultiQubitAmplifier");
        assert_eq!(amplification["noise_factors"], serde_json::json!([1.0, 3.0, 5.0]));
        for key in ["values", "variance", "shots"] {
            assert_eq!(amplification[key].as_array().unwrap().len(), 3, "{}", key);
        }
        assert_eq!(amplification["shots"][0], 4096);

        let extrapolation = &json["zne"]["extrapolation"];
        assert_eq!(extrapolation["extrapolator"]["name"], "LinearExtrapolator");
        assert_eq!(extrapolation["extrapolator"]["options"]["degree"], 1);
        for key in ["coefficients", "std_errors", "covariance_matrix", "residuals", "R2"] {
            assert!(!extrapolation[key].is_null(), "{}", key);
        }
    }

    #[test]
    fn test_unsorted_factors_rearranged() {
        let strategy = ZneStrategy::builder()
            .noise_factors([5.0, 3.0, 1.0, 3.0])
            .build()
            .unwrap();
        let result = ZneEstimator::new(noisy(), strategy)
            .mitigate_one(&ghz(2), &RunOptions::exact())
            .unwrap();
        let metadata = result.metadata.unwrap();
        assert_eq!(metadata.noise_factors(), &[1.0, 3.0, 5.0]);

        let values = metadata.values();
        assert!(values[0] > values[1] && values[1] > values[2]);
    }

    #[test]
    fn test_ideal_estimator_constant() {
        // No noise: every factor gives the ideal value, so the fit is exact
        let estimator = ZneEstimator::new(SimulatorEstimator::ideal(), ZneStrategy::default());
        let result = estimator
            .mitigate_one(&ghz(3), &RunOptions::exact())
            .unwrap();
        assert_relative_eq!(result.value, 1.0, epsilon = 1e-12);
        assert!(result.std_error.is_finite());
    }

    #[test]
    fn test_realized_factors_reported() {
        let strategy = ZneStrategy::builder()
            .noise_amplifier(CxAmplifier::new())
            .noise_factors([1.0, 2.0, 3.0])
            .build()
            .unwrap();
        let result = ZneEstimator::new(noisy(), strategy)
            .mitigate_one(&ghz(2), &RunOptions::exact())
            .unwrap();
        let amplification = result.metadata.unwrap().zne.noise_amplification;
        assert_eq!(amplification.noise_factors, vec![1.0, 2.0, 3.0]);
        assert_eq!(amplification.realized_noise_factors, vec![1.0, 1.0, 3.0]);
    }

    #[test]
    fn test_exponential_extrapolation_runs() {
        let strategy = ZneStrategy::builder()
            .noise_factors([1.0, 3.0, 5.0, 7.0])
            .extrapolator(MultiExponentialExtrapolator::mono())
            .build()
            .unwrap();
        let result = ZneEstimator::new(noisy(), strategy)
            .mitigate_one(&ghz(2), &RunOptions::exact())
            .unwrap();
        assert!(result.value.is_finite());
        assert!(result.std_error.is_finite());
        assert_eq!(
            result.metadata.unwrap().zne.extrapolation.extrapolator.name,
            "MonoExponentialExtrapolator"
        );
    }

    #[test]
    fn test_shot_noise_std_error() {
        let estimator = ZneEstimator::new(noisy(), ZneStrategy::default());
        let result = estimator
            .mitigate_one(&ghz(2), &RunOptions::default().with_seed(5))
            .unwrap();
        assert!(result.std_error > 0.0);
        assert_relative_eq!(result.variance, result.std_error.powi(2));
        assert_eq!(result.shots, 3 * 4096);
    }
}
