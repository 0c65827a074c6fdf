//! Noise model for the simulator estimator
//!
//! Gantree: L2_Backend → NoiseModel
//!
//! Global depolarizing noise per gate plus symmetric readout flips. Under
//! this model the noisy expectation of a non-identity Pauli string is the
//! ideal one damped by `Π (1 - p_gate)` and `(1 - 2 p_readout)^weight`.

use serde::{Deserialize, Serialize};
use std::fmt;
use zne_core::{Gate, ZneError, ZneResult};

/// Depolarizing noise model
/// Gantree: NoiseModel // per-gate depolarizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseModel {
    /// Single-qubit gate error rate
    /// Gantree: gate_error_1q: f64
    gate_error_1q: f64,

    /// Multi-qubit gate error rate
    /// Gantree: gate_error_2q: f64
    gate_error_2q: f64,

    /// Readout error rate
    /// Gantree: readout_error: f64
    readout_error: f64,
}

impl NoiseModel {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a new noise model with validation
    pub fn new(gate_error_1q: f64, gate_error_2q: f64, readout_error: f64) -> ZneResult<Self> {
        let model = Self {
            gate_error_1q,
            gate_error_2q,
            readout_error,
        };
        model.validate()?;
        Ok(model)
    }

    /// Create ideal (noiseless) model
    pub fn ideal() -> Self {
        Self {
            gate_error_1q: 0.0,
            gate_error_2q: 0.0,
            readout_error: 0.0,
        }
    }

    /// Create from an effective depolarizing rate
    ///
    /// Multi-qubit gates get ten times the single-qubit rate, readout a quarter.
    pub fn from_depol(p_depol: f64) -> ZneResult<Self> {
        Self::new(p_depol, p_depol * 10.0, p_depol / 4.0)
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set single-qubit gate error
    pub fn with_gate_error_1q(mut self, error: f64) -> Self {
        self.gate_error_1q = error;
        self
    }

    /// Set multi-qubit gate error
    pub fn with_gate_error_2q(mut self, error: f64) -> Self {
        self.gate_error_2q = error;
        self
    }

    /// Set readout error
    pub fn with_readout_error(mut self, error: f64) -> Self {
        self.readout_error = error;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Single-qubit gate error
    pub fn gate_error_1q(&self) -> f64 {
        self.gate_error_1q
    }

    /// Multi-qubit gate error
    pub fn gate_error_2q(&self) -> f64 {
        self.gate_error_2q
    }

    /// Readout error
    pub fn readout_error(&self) -> f64 {
        self.readout_error
    }

    /// Check whether every rate is zero
    pub fn is_ideal(&self) -> bool {
        self.gate_error_1q == 0.0 && self.gate_error_2q == 0.0 && self.readout_error == 0.0
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate noise model constraints
    /// Gantree: validate(&self) -> Result // rates in [0,1], readout <= 0.5
    pub fn validate(&self) -> ZneResult<()> {
        for (label, rate) in [
            ("1Q gate error", self.gate_error_1q),
            ("2Q gate error", self.gate_error_2q),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ZneError::InvalidConfiguration(format!(
                    "{} must be in [0,1]: {}",
                    label, rate
                )));
            }
        }

        if !(0.0..=0.5).contains(&self.readout_error) {
            return Err(ZneError::InvalidConfiguration(format!(
                "Readout error must be in [0,0.5]: {}",
                self.readout_error
            )));
        }

        Ok(())
    }

    // ========================================================================
    // Damping
    // ========================================================================

    /// Error rate applied after a gate
    pub fn gate_error(&self, gate: &Gate) -> f64 {
        if gate.is_multi_qubit() {
            self.gate_error_2q
        } else if gate.is_single_qubit() {
            self.gate_error_1q
        } else {
            0.0
        }
    }

    /// Product of `1 - p` over every gate
    /// Gantree: gate_fidelity(gates) -> f64 // Π(1-p)
    pub fn gate_fidelity<'a>(&self, gates: impl IntoIterator<Item = &'a Gate>) -> f64 {
        gates
            .into_iter()
            .map(|g| 1.0 - self.gate_error(g))
            .product()
    }

    /// Readout damping of a Pauli string of the given weight
    pub fn readout_damping(&self, weight: usize) -> f64 {
        (1.0 - 2.0 * self.readout_error).powi(weight as i32)
    }
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self::ideal()
    }
}

impl fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NoiseModel(1Q={:.4}, 2Q={:.4}, RO={:.4})",
            self.gate_error_1q, self.gate_error_2q, self.readout_error
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
