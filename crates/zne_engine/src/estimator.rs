//! ZNE estimator facade
//!
//! Gantree: L5_Engine → ZneEstimator
//!
//! Wraps any [`Estimator`] so that each problem is amplified, estimated and
//! extrapolated to zero noise.

use crate::metadata::ZneMetadata;
use crate::orchestrator::{NoiseAmplificationOrchestrator, NoiseAmplificationRecord};
use crate::strategy::ZneStrategy;
use serde::{Deserialize, Serialize};
use std::fmt;
use zne_backend::{EstimationJob, Estimator, RawMeasurement, RunOptions};
use zne_core::{ZneError, ZneResult};

// ============================================================================
// Result
// ============================================================================

/// Mitigated expectation value of one problem
/// Gantree: MitigatedResult // value, std_error, metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigatedResult {
    /// Expectation value (zero-noise estimate when active)
    pub value: f64,

    /// Std error of `value`
    pub std_error: f64,

    /// Variance reported downstream
    pub variance: f64,

    /// Shots spent on this problem
    pub shots: u64,

    /// ZNE details, absent in noop mode
    pub metadata: Option<ZneMetadata>,
}

impl MitigatedResult {
    /// Raw measurement passed through unchanged
    pub fn passthrough(measurement: RawMeasurement) -> Self {
        Self {
            value: measurement.value,
            std_error: measurement.std_error(),
            variance: measurement.variance,
            shots: measurement.shots,
            metadata: None,
        }
    }

    /// Check whether ZNE was applied
    pub fn is_mitigated(&self) -> bool {
        self.metadata.is_some()
    }
}

impl fmt::Display for MitigatedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} ± {:.6}", self.value, self.std_error)?;
        if !self.is_mitigated() {
            write!(f, " (unmitigated)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Estimator
// ============================================================================

/// Estimator with zero-noise extrapolation
/// Gantree: ZneEstimator<E> // facade
#[derive(Debug, Clone)]
pub struct ZneEstimator<E: Estimator> {
    estimator: E,
    strategy: ZneStrategy,
}

impl<E: Estimator> ZneEstimator<E> {
    /// Wrap an estimator with a strategy
    pub fn new(estimator: E, strategy: ZneStrategy) -> Self {
        Self {
            estimator,
            strategy,
        }
    }

    /// Wrap an estimator with the default strategy
    pub fn with_default_strategy(estimator: E) -> Self {
        Self::new(estimator, ZneStrategy::default())
    }

    /// Replace the strategy
    pub fn with_strategy(mut self, strategy: ZneStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Active strategy
    pub fn strategy(&self) -> &ZneStrategy {
        &self.strategy
    }

    /// Wrapped estimator
    pub fn inner(&self) -> &E {
        &self.estimator
    }

    /// Unwrap the estimator
    pub fn into_inner(self) -> E {
        self.estimator
    }

    /// Mitigate every problem
    ///
    /// Returns one result per problem in input order. A failing problem does
    /// not affect the others unless the estimator batch itself fails.
    /// Gantree: mitigate(problems, opts) -> Vec<Result<MitigatedResult>>
    pub fn mitigate(
        &self,
        problems: &[EstimationJob],
        options: &RunOptions,
    ) -> Vec<ZneResult<MitigatedResult>> {
        if let Err(err) = options.validate() {
            return problems.iter().map(|_| Err(err.clone())).collect();
        }

        if self.strategy.is_noop() {
            log::debug!("noop strategy, passing {} problems through", problems.len());
            return self.passthrough(problems, options);
        }

        let results: Vec<ZneResult<MitigatedResult>> =
            NoiseAmplificationOrchestrator::new(&self.strategy)
                .run(problems, &self.estimator, options)
                .into_iter()
                .map(|record| record.and_then(|r| self.extrapolate(&r)))
                .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        log::info!(
            "{}: mitigated {} of {} problems with {}",
            self.estimator.name(),
            results.len() - failed,
            results.len(),
            self.strategy.extrapolator().name()
        );
        results
    }

    /// Mitigate a single problem
    pub fn mitigate_one(
        &self,
        problem: &EstimationJob,
        options: &RunOptions,
    ) -> ZneResult<MitigatedResult> {
        self.mitigate(std::slice::from_ref(problem), options)
            .into_iter()
            .next()
            .unwrap_or(Err(ZneError::InconsistentResults {
                expected: 1,
                received: 0,
            }))
    }

    fn passthrough(
        &self,
        problems: &[EstimationJob],
        options: &RunOptions,
    ) -> Vec<ZneResult<MitigatedResult>> {
        if problems.is_empty() {
            return Vec::new();
        }
        match self.estimator.estimate(problems, options) {
            Ok(measurements) if measurements.len() == problems.len() => measurements
                .into_iter()
                .map(|m| Ok(MitigatedResult::passthrough(m)))
                .collect(),
            Ok(measurements) => {
                let err = ZneError::InconsistentResults {
                    expected: problems.len(),
                    received: measurements.len(),
                };
                problems.iter().map(|_| Err(err.clone())).collect()
            }
            Err(err) => problems.iter().map(|_| Err(err.clone())).collect(),
        }
    }

    /// Fit requested noise factors against noisy values
    fn extrapolate(&self, record: &NoiseAmplificationRecord) -> ZneResult<MitigatedResult> {
        let values = record.values();
        let std_devs = record.std_devs();
        let reckoning = self.strategy.extrapolator().extrapolate(
            &record.noise_factors,
            &values,
            None,
            Some(&std_devs),
        )?;

        log::debug!(
            "extrapolated {:?} at {:?} to {}",
            values,
            record.noise_factors,
            reckoning
        );

        let metadata = ZneMetadata::new(
            &self.strategy,
            record,
            reckoning.std_error,
            reckoning.metadata,
        );

        Ok(MitigatedResult {
            value: reckoning.value,
            std_error: reckoning.std_error,
            variance: reckoning.std_error * reckoning.std_error,
            shots: record.total_shots(),
            metadata: Some(metadata),
        })
    }
}

impl<E: Estimator> Estimator for ZneEstimator<E> {
    fn name(&self) -> &str {
        self.estimator.name()
    }

    /// Mitigated values as raw measurements; the first failing problem fails
    /// the batch
    fn estimate(
        &self,
        jobs: &[EstimationJob],
        options: &RunOptions,
    ) -> ZneResult<Vec<RawMeasurement>> {
        self.mitigate(jobs, options)
            .into_iter()
            .map(|r| r.map(|m| RawMeasurement::new(m.value, m.variance, m.shots)))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
