//! Noise amplification orchestrator
//!
//! Gantree: L5_Engine → NoiseAmplificationOrchestrator
//!
//! Expands problems into the problems × factors cross product, submits one
//! estimator batch and routes measurements back to their problem.

use crate::strategy::ZneStrategy;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use zne_amplification::NoiseAmplifier;
use zne_backend::{EstimationJob, Estimator, RawMeasurement, RunOptions};
use zne_core::{NoiseFactor, NoiseFactorApproximationWarning, ZneError, ZneResult};

// ============================================================================
// Record
// ============================================================================

/// Noisy measurements of one problem across all noise factors
/// Gantree: NoiseAmplificationRecord // per-factor measurements + warnings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseAmplificationRecord {
    /// Requested noise factors, ascending
    pub noise_factors: Vec<NoiseFactor>,

    /// Noise factors realized by folding
    pub realized_noise_factors: Vec<NoiseFactor>,

    /// One measurement per noise factor
    pub measurements: Vec<RawMeasurement>,

    /// Approximation warnings raised while folding
    pub warnings: Vec<NoiseFactorApproximationWarning>,
}

impl NoiseAmplificationRecord {
    /// Noisy expectation values
    pub fn values(&self) -> Vec<f64> {
        self.measurements.iter().map(|m| m.value).collect()
    }

    /// Per-factor std deviation `sqrt(variance)`
    pub fn std_devs(&self) -> Vec<f64> {
        self.measurements.iter().map(|m| m.variance.sqrt()).collect()
    }

    /// Total shots across factors
    pub fn total_shots(&self) -> u64 {
        self.measurements.iter().map(|m| m.shots).sum()
    }
}

/// Amplified jobs of one problem, before estimation
struct AmplifiedProblem {
    jobs: Vec<EstimationJob>,
    realized: Vec<NoiseFactor>,
    warnings: Vec<NoiseFactorApproximationWarning>,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs amplification and batched estimation for a strategy
/// Gantree: NoiseAmplificationOrchestrator // cross product, batch, demux
#[derive(Debug, Clone, Copy)]
pub struct NoiseAmplificationOrchestrator<'a> {
    strategy: &'a ZneStrategy,
}

impl<'a> NoiseAmplificationOrchestrator<'a> {
    /// Create for a strategy
    pub fn new(strategy: &'a ZneStrategy) -> Self {
        Self { strategy }
    }

    /// Strategy being orchestrated
    pub fn strategy(&self) -> &ZneStrategy {
        self.strategy
    }

    /// Number of estimator experiments for `num_problems` problems
    pub fn total_executions(&self, num_problems: usize) -> usize {
        num_problems * self.strategy.num_noise_factors()
    }

    /// Amplify every problem, estimate once, and demultiplex
    ///
    /// Returns one result per problem in input order. Amplification failures
    /// stay local to their problem; an estimator failure fails all of them.
    /// Gantree: run(problems, estimator, opts) -> Vec<Result<Record>>
    pub fn run<E: Estimator + ?Sized>(
        &self,
        problems: &[EstimationJob],
        estimator: &E,
        options: &RunOptions,
    ) -> Vec<ZneResult<NoiseAmplificationRecord>> {
        let amplifier = match self.strategy.noise_amplifier() {
            Some(amplifier) => amplifier,
            None => {
                let err = ZneError::InvalidConfiguration(
                    "orchestrator needs a noise amplifier".into(),
                );
                return problems.iter().map(|_| Err(err.clone())).collect();
            }
        };

        let total = self.total_executions(problems.len());
        log::info!(
            "{}: {} problems x {} noise factors = {} executions",
            amplifier.name(),
            problems.len(),
            self.strategy.num_noise_factors(),
            total
        );

        let amplified: Vec<ZneResult<AmplifiedProblem>> = problems
            .par_iter()
            .enumerate()
            .map(|(index, problem)| self.amplify_problem(amplifier.as_ref(), index, problem))
            .collect();

        let batch: Vec<EstimationJob> = amplified
            .iter()
            .filter_map(|p| p.as_ref().ok())
            .flat_map(|p| p.jobs.iter().cloned())
            .collect();

        if batch.is_empty() {
            log::debug!("no problem amplified successfully, skipping estimation");
            return amplified
                .into_iter()
                .map(|p| p.map(|p| self.record(p, Vec::new())))
                .collect();
        }

        log::debug!("{}: submitting batch of {} jobs", estimator.name(), batch.len());
        let measurements = estimator.estimate(&batch, options).and_then(|m| {
            if m.len() == batch.len() {
                Ok(m)
            } else {
                Err(ZneError::InconsistentResults {
                    expected: batch.len(),
                    received: m.len(),
                })
            }
        });

        let measurements = match measurements {
            Ok(m) => m,
            Err(err) => {
                log::warn!("{}: batch failed: {}", estimator.name(), err);
                return problems.iter().map(|_| Err(err.clone())).collect();
            }
        };

        let mut remaining = measurements.into_iter();
        amplified
            .into_iter()
            .map(|problem| {
                problem.map(|p| {
                    let chunk = remaining.by_ref().take(p.jobs.len()).collect();
                    self.record(p, chunk)
                })
            })
            .collect()
    }

    fn amplify_problem(
        &self,
        amplifier: &dyn NoiseAmplifier,
        index: usize,
        problem: &EstimationJob,
    ) -> ZneResult<AmplifiedProblem> {
        let factors = self.strategy.noise_factors();
        let mut jobs = Vec::with_capacity(factors.len());
        let mut realized = Vec::with_capacity(factors.len());
        let mut warnings = Vec::new();

        for (factor_index, &factor) in factors.iter().enumerate() {
            let ctx = self.strategy.amplification_context(index, factor_index);
            let amplified = amplifier.amplify_circuit_noise(&problem.circuit, factor, &ctx)?;

            realized.push(amplified.realized());
            warnings.extend(amplified.warning().copied());
            jobs.push(EstimationJob {
                circuit: amplified.output,
                observable: problem.observable.clone(),
            });
        }

        Ok(AmplifiedProblem {
            jobs,
            realized,
            warnings,
        })
    }

    fn record(
        &self,
        problem: AmplifiedProblem,
        measurements: Vec<RawMeasurement>,
    ) -> NoiseAmplificationRecord {
        NoiseAmplificationRecord {
            noise_factors: self.strategy.noise_factors().to_vec(),
            realized_noise_factors: problem.realized,
            measurements,
            warnings: problem.warnings,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zne_amplification::{CxAmplifier, GlobalFoldingAmplifier};
    use zne_core::{CircuitBuilder, Gate};

    /// Returns the 2q gate count of each circuit as its value
    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl Estimator for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn estimate(
            &self,
            jobs: &[EstimationJob],
            _options: &RunOptions,
        ) -> ZneResult<Vec<RawMeasurement>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(jobs
                .iter()
                .map(|j| RawMeasurement::new(j.circuit.count_2q() as f64, 0.25, 100))
                .collect())
        }
    }

    struct Failing;

    impl Estimator for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn estimate(&self, _: &[EstimationJob], _: &RunOptions) -> ZneResult<Vec<RawMeasurement>> {
            Err(ZneError::EstimatorError("backend offline".into()))
        }
    }

    struct Short;

    impl Estimator for Short {
        fn name(&self) -> &str {
            "short"
        }

        fn estimate(&self, jobs: &[EstimationJob], _: &RunOptions) -> ZneResult<Vec<RawMeasurement>> {
            Ok(vec![RawMeasurement::new(0.0, 0.0, 1); jobs.len() - 1])
        }
    }

    fn bell() -> EstimationJob {
        let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).build();
        EstimationJob::new(circuit, "ZZ".parse().unwrap()).unwrap()
    }

    fn measured() -> EstimationJob {
        let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).measure_all().build();
        EstimationJob::new(circuit, "ZZ".parse().unwrap()).unwrap()
    }

    fn strategy() -> ZneStrategy {
        ZneStrategy::builder()
            .noise_amplifier(CxAmplifier::new())
            .build()
            .unwrap()
    }

    #[test]
    fn test_single_batch_in_order() {
        let strategy = strategy();
        let orchestrator = NoiseAmplificationOrchestrator::new(&strategy);
        let estimator = Counting::default();

        let results = orchestrator.run(&[bell(), bell()], &estimator, &RunOptions::default());
        assert_eq!(estimator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(results.len(), 2);

        for result in results {
            let record = result.unwrap();
            assert_eq!(record.noise_factors, vec![1.0, 3.0, 5.0]);
            assert_eq!(record.realized_noise_factors, vec![1.0, 3.0, 5.0]);
            assert_eq!(record.values(), vec![1.0, 3.0, 5.0]);
            assert!(record.warnings.is_empty());
            assert_eq!(record.total_shots(), 300);
        }
    }

    #[test]
    fn test_total_executions() {
        let strategy = strategy();
        assert_eq!(NoiseAmplificationOrchestrator::new(&strategy).total_executions(7), 21);
    }

    #[test]
    fn test_failed_amplification_isolated() {
        let strategy = ZneStrategy::builder()
            .noise_amplifier(GlobalFoldingAmplifier::new())
            .build()
            .unwrap();
        let orchestrator = NoiseAmplificationOrchestrator::new(&strategy);
        let estimator = Counting::default();

        let results = orchestrator.run(
            &[bell(), measured(), bell()],
            &estimator,
            &RunOptions::default(),
        );
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ZneError::UnsupportedInstruction(_))));
        assert!(results[2].is_ok());
        assert_eq!(results[2].as_ref().unwrap().measurements.len(), 3);
    }

    #[test]
    fn test_all_failed_skips_estimation() {
        let strategy = ZneStrategy::builder()
            .noise_amplifier(GlobalFoldingAmplifier::new())
            .build()
            .unwrap();
        let estimator = Counting::default();
        let results = NoiseAmplificationOrchestrator::new(&strategy).run(
            &[measured()],
            &estimator,
            &RunOptions::default(),
        );
        assert!(results[0].is_err());
        assert_eq!(estimator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_batch_failure_fails_all() {
        let strategy = strategy();
        let results = NoiseAmplificationOrchestrator::new(&strategy).run(
            &[bell(), bell()],
            &Failing,
            &RunOptions::default(),
        );
        assert!(results
            .iter()
            .all(|r| matches!(r, Err(ZneError::EstimatorError(_)))));
    }

    #[test]
    fn test_inconsistent_results() {
        let strategy = strategy();
        let results = NoiseAmplificationOrchestrator::new(&strategy).run(
            &[bell()],
            &Short,
            &RunOptions::default(),
        );
        assert!(matches!(
            results[0],
            Err(ZneError::InconsistentResults {
                expected: 3,
                received: 2
            })
        ));
    }

    #[test]
    fn test_approximation_warnings_collected() {
        let strategy = ZneStrategy::builder()
            .noise_amplifier(CxAmplifier::new())
            .noise_factors([1.0, 2.0, 3.0])
            .build()
            .unwrap();
        let results = NoiseAmplificationOrchestrator::new(&strategy).run(
            &[bell()],
            &Counting::default(),
            &RunOptions::default(),
        );
        let record = results[0].as_ref().unwrap();
        // One cx cannot realize factor 2
        assert_eq!(record.warnings.len(), 1);
        assert_eq!(record.warnings[0].requested, 2.0);
        assert_ne!(record.realized_noise_factors[1], 2.0);
    }

    #[test]
    fn test_problems_untouched() {
        let strategy = strategy();
        let job = bell();
        let before = job.clone();
        let results = NoiseAmplificationOrchestrator::new(&strategy).run(
            std::slice::from_ref(&job),
            &Counting::default(),
            &RunOptions::default(),
        );
        assert!(results[0].is_ok());
        assert_eq!(job, before);
        assert!(!job.circuit.gates().iter().any(Gate::is_barrier));
    }
}
