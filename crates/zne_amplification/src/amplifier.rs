//! Noise amplifier trait and run context
//!
//! Gantree: L3_Amplification → NoiseAmplifier
//!
//! Amplifiers work natively on either circuits or instruction DAGs. The
//! other entry point converts and delegates; an amplifier without a native
//! level fails both with `NotImplemented`.

use crate::plan::FoldingPlan;
use serde::{Deserialize, Serialize};
use std::fmt;
use zne_core::constants::zne::{DEFAULT_INSERT_BARRIERS, DEFAULT_RELATIVE_TOLERANCE};
use zne_core::{Circuit, InstructionDag, NoiseFactor, NoiseFactorApproximationWarning, ZneError, ZneResult};

// ============================================================================
// Amplification Level
// ============================================================================

/// Representation an amplifier operates on natively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmplificationLevel {
    /// Ordered instruction list
    Circuit,

    /// Dependency graph
    Dag,
}

// ============================================================================
// Context
// ============================================================================

/// Run-level amplification options
/// Gantree: AmplificationContext // barriers, tolerance, seed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmplificationContext {
    /// Fence folded gates with barriers
    pub insert_barriers: bool,

    /// Allowed relative deviation of the realized noise factor
    pub noise_factor_relative_tolerance: f64,

    /// Seed for random sub-folding
    pub random_seed: Option<u64>,

    /// Per-call value mixed into the seed
    pub disambiguator: u64,
}

impl Default for AmplificationContext {
    fn default() -> Self {
        Self {
            insert_barriers: DEFAULT_INSERT_BARRIERS,
            noise_factor_relative_tolerance: DEFAULT_RELATIVE_TOLERANCE,
            random_seed: None,
            disambiguator: 0,
        }
    }
}

impl AmplificationContext {
    /// Set barrier insertion
    pub fn with_barriers(mut self, insert_barriers: bool) -> Self {
        self.insert_barriers = insert_barriers;
        self
    }

    /// Set relative tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.noise_factor_relative_tolerance = tolerance;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Set disambiguator
    pub fn with_disambiguator(mut self, disambiguator: u64) -> Self {
        self.disambiguator = disambiguator;
        self
    }

    /// Seed for this call, `None` when unseeded
    pub fn call_seed(&self) -> Option<u64> {
        self.random_seed
            .map(|seed| seed.wrapping_add(self.disambiguator))
    }

    /// Validate context
    pub fn validate(&self) -> ZneResult<()> {
        let tol = self.noise_factor_relative_tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(ZneError::InvalidConfiguration(format!(
                "noise factor relative tolerance must be finite and non-negative, got {}",
                tol
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Amplified Output
// ============================================================================

/// Amplifier output with fold bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct Amplified<T> {
    /// Noise-amplified circuit or DAG
    pub output: T,

    /// Fold counts behind `output`
    pub plan: FoldingPlan,
}

impl<T> Amplified<T> {
    /// Wrap output
    pub fn new(output: T, plan: FoldingPlan) -> Self {
        Self { output, plan }
    }

    /// Requested noise factor
    pub fn requested(&self) -> NoiseFactor {
        self.plan.requested
    }

    /// Realized noise factor
    pub fn realized(&self) -> NoiseFactor {
        self.plan.realized
    }

    /// Approximation warning, if any
    pub fn warning(&self) -> Option<&NoiseFactorApproximationWarning> {
        self.plan.warning.as_ref()
    }

    /// Convert the output, keeping the plan
    pub fn try_map<U>(self, f: impl FnOnce(T) -> ZneResult<U>) -> ZneResult<Amplified<U>> {
        Ok(Amplified {
            output: f(self.output)?,
            plan: self.plan,
        })
    }
}

// ============================================================================
// Trait
// ============================================================================

/// Noise amplification strategy
/// Gantree: NoiseAmplifier // trait
pub trait NoiseAmplifier: Send + Sync + fmt::Debug {
    /// Strategy name
    fn name(&self) -> &str;

    /// Strategy options, reported in result metadata
    fn options(&self) -> serde_json::Value;

    /// Native representation, `None` if the amplifier implements neither
    fn native_level(&self) -> Option<AmplificationLevel>;

    /// Amplify the noise of a circuit
    ///
    /// Never mutates `circuit`. DAG-native amplifiers are reached through
    /// conversion.
    /// Gantree: amplify_circuit_noise(c, f, ctx) -> Result<Amplified<Circuit>>
    fn amplify_circuit_noise(
        &self,
        circuit: &Circuit,
        noise_factor: NoiseFactor,
        ctx: &AmplificationContext,
    ) -> ZneResult<Amplified<Circuit>> {
        match self.native_level() {
            Some(AmplificationLevel::Dag) => {
                let dag = InstructionDag::from_circuit(circuit);
                self.amplify_dag_noise(&dag, noise_factor, ctx)?
                    .try_map(|dag| dag.to_circuit())
            }
            _ => Err(not_implemented(self.name(), "circuit")),
        }
    }

    /// Amplify the noise of an instruction DAG
    /// Gantree: amplify_dag_noise(d, f, ctx) -> Result<Amplified<InstructionDag>>
    fn amplify_dag_noise(
        &self,
        dag: &InstructionDag,
        noise_factor: NoiseFactor,
        ctx: &AmplificationContext,
    ) -> ZneResult<Amplified<InstructionDag>> {
        match self.native_level() {
            Some(AmplificationLevel::Circuit) => {
                let circuit = dag.to_circuit()?;
                self.amplify_circuit_noise(&circuit, noise_factor, ctx)?
                    .try_map(|circuit| Ok(InstructionDag::from_circuit(&circuit)))
            }
            _ => Err(not_implemented(self.name(), "DAG")),
        }
    }
}

fn not_implemented(name: &str, level: &str) -> ZneError {
    ZneError::NotImplemented(format!("{} does not amplify at {} level", name, level))
}

// ============================================================================
// Tests
// ============================================================================
