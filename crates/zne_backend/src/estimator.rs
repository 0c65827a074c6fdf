//! Estimation collaborator types and trait
//!
//! Gantree: L2_Backend → EstimatorTrait
//!
//! Interface to whatever computes noisy expectation values: hardware
//! primitives, cloud services or the bundled simulator.

use serde::{Deserialize, Serialize};
use std::fmt;
use zne_core::constants::zne::DEFAULT_SHOTS;
use zne_core::{Circuit, Observable, ZneError, ZneResult};

/// One (circuit, observable) experiment
/// Gantree: EstimationJob // circuit + observable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationJob {
    /// Circuit preparing the state
    pub circuit: Circuit,

    /// Observable to estimate
    pub observable: Observable,
}

impl EstimationJob {
    /// Create a job, checking register sizes agree
    pub fn new(circuit: Circuit, observable: Observable) -> ZneResult<Self> {
        if circuit.num_qubits() != observable.num_qubits() {
            return Err(ZneError::InvalidObservable(format!(
                "observable acts on {} qubits, circuit has {}",
                observable.num_qubits(),
                circuit.num_qubits()
            )));
        }
        Ok(Self {
            circuit,
            observable,
        })
    }
}

/// Options forwarded to the estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Shots per experiment (`None` = exact expectation values)
    pub shots: Option<u64>,

    /// Seed for shot sampling
    pub seed: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            shots: Some(DEFAULT_SHOTS),
            seed: None,
        }
    }
}

impl RunOptions {
    /// Exact expectation values, no sampling
    pub fn exact() -> Self {
        Self {
            shots: None,
            seed: None,
        }
    }

    /// Set shots
    pub fn with_shots(mut self, shots: u64) -> Self {
        self.shots = Some(shots);
        self
    }

    /// Set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate options
    pub fn validate(&self) -> ZneResult<()> {
        if self.shots == Some(0) {
            return Err(ZneError::InvalidConfiguration(
                "shots must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Noisy expectation value returned for one experiment
/// Gantree: RawMeasurement // value, variance, shots
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawMeasurement {
    /// Estimated expectation value
    pub value: f64,

    /// Single-shot variance of the observable
    pub variance: f64,

    /// Shots spent (0 for exact evaluation)
    pub shots: u64,
}

impl RawMeasurement {
    /// Create measurement
    pub fn new(value: f64, variance: f64, shots: u64) -> Self {
        Self {
            value,
            variance,
            shots,
        }
    }

    /// Standard error of `value`: `sqrt(variance / shots)`, 0 when exact
    pub fn std_error(&self) -> f64 {
        if self.shots == 0 {
            0.0
        } else {
            (self.variance / self.shots as f64).sqrt()
        }
    }
}

impl fmt::Display for RawMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RawMeasurement(value={:.6}, variance={:.6}, shots={})",
            self.value, self.variance, self.shots
        )
    }
}

/// Expectation-value estimator
/// Gantree: Estimator // collaborator interface
pub trait Estimator: Send + Sync {
    /// Estimator name
    fn name(&self) -> &str;

    /// Estimate a batch of experiments
    ///
    /// Results must come back in submission order, one per job.
    /// Gantree: estimate(jobs, opts) -> Result<Vec<RawMeasurement>>
    fn estimate(&self, jobs: &[EstimationJob], options: &RunOptions)
        -> ZneResult<Vec<RawMeasurement>>;

    /// Estimate a single experiment
    fn estimate_one(&self, job: &EstimationJob, options: &RunOptions) -> ZneResult<RawMeasurement> {
        let results = self.estimate(std::slice::from_ref(job), options)?;
        let received = results.len();
        results
            .into_iter()
            .next()
            .filter(|_| received == 1)
            .ok_or(ZneError::InconsistentResults {
                expected: 1,
                received,
            })
    }
}

// ============================================================================
// Tests
// ============================================================================
