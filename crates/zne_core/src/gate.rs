//! Quantum gate definitions for ZNE
//!
//! Gantree: L1_Circuit → Gate
//!
//! Instruction set understood by the noise amplifiers. Every unitary gate
//! knows its inverse so it can be folded; measurements and resets cannot.

use crate::error::{ZneError, ZneResult};
use crate::types::{Angle, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantum gate enumeration
/// Gantree: Gate // gate enum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    // ========================================================================
    // Single-Qubit Gates (Non-Parameterized)
    // ========================================================================
    /// Hadamard gate
    H(QubitId),

    /// Pauli-X gate (NOT)
    X(QubitId),

    /// Pauli-Y gate
    Y(QubitId),

    /// Pauli-Z gate
    Z(QubitId),

    /// S gate (sqrt(Z))
    S(QubitId),

    /// S-dagger gate (inverse of S)
    Sdg(QubitId),

    /// T gate (fourth root of Z)
    T(QubitId),

    /// T-dagger gate (inverse of T)
    Tdg(QubitId),

    /// SX gate (sqrt(X))
    Sx(QubitId),

    /// SX-dagger gate
    Sxdg(QubitId),

    /// Identity gate
    Id(QubitId),

    // ========================================================================
    // Single-Qubit Parameterized Rotation Gates
    // ========================================================================
    /// Rotation around X-axis
    Rx(QubitId, Angle),

    /// Rotation around Y-axis
    Ry(QubitId, Angle),

    /// Rotation around Z-axis
    Rz(QubitId, Angle),

    /// General single-qubit rotation U(θ, φ, λ)
    U(QubitId, Angle, Angle, Angle),

    /// Phase gate P(λ) = diag(1, e^{iλ})
    P(QubitId, Angle),

    // ========================================================================
    // Two-Qubit Gates
    // ========================================================================
    /// Controlled-NOT (CX)
    Cnot(QubitId, QubitId),

    /// Controlled-Z
    Cz(QubitId, QubitId),

    /// Controlled-Y
    Cy(QubitId, QubitId),

    /// SWAP gate
    Swap(QubitId, QubitId),

    /// iSWAP gate
    ISwap(QubitId, QubitId),

    /// iSWAP-dagger gate
    ISwapdg(QubitId, QubitId),

    /// Controlled-Rz
    Crz(QubitId, QubitId, Angle),

    /// Controlled-Rx
    Crx(QubitId, QubitId, Angle),

    /// Controlled-Ry
    Cry(QubitId, QubitId, Angle),

    /// ECR gate (Echoed Cross-Resonance, IBM native)
    Ecr(QubitId, QubitId),

    // ========================================================================
    // Three-Qubit Gates
    // ========================================================================
    /// Toffoli (CCX)
    Ccx(QubitId, QubitId, QubitId),

    /// Controlled-SWAP (Fredkin)
    Cswap(QubitId, QubitId, QubitId),

    // ========================================================================
    // User-Defined
    // ========================================================================
    /// Gate outside the standard set
    Opaque(OpaqueGate),

    // ========================================================================
    // Measurement and Control
    // ========================================================================
    /// Single qubit measurement
    Measure(QubitId),

    /// Measure all qubits
    MeasureAll,

    /// Barrier (scheduling fence, no logical effect)
    Barrier(Vec<QubitId>),

    /// Reset qubit to |0⟩
    Reset(QubitId),
}

/// User-defined gate
///
/// The amplifiers can only fold it when it is declared self-inverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpaqueGate {
    /// Gate name
    pub name: String,

    /// Qubit operands
    pub qubits: Vec<QubitId>,

    /// Whether `G·G = I` holds
    pub self_inverse: bool,
}

impl OpaqueGate {
    /// Create an opaque gate
    pub fn new(name: impl Into<String>, qubits: Vec<QubitId>) -> Self {
        Self {
            name: name.into(),
            qubits,
            self_inverse: false,
        }
    }

    /// Declare the gate self-inverse
    pub fn self_inverse(mut self) -> Self {
        self.self_inverse = true;
        self
    }
}

impl Gate {
    // ========================================================================
    // Gate Properties
    // ========================================================================

    /// Get qubits involved in this gate
    pub fn qubits(&self) -> Vec<QubitId> {
        match self {
            // Single-qubit gates
            Gate::H(q)
            | Gate::X(q)
            | Gate::Y(q)
            | Gate::Z(q)
            | Gate::S(q)
            | Gate::Sdg(q)
            | Gate::T(q)
            | Gate::Tdg(q)
            | Gate::Sx(q)
            | Gate::Sxdg(q)
            | Gate::Id(q)
            | Gate::Rx(q, _)
            | Gate::Ry(q, _)
            | Gate::Rz(q, _)
            | Gate::U(q, _, _, _)
            | Gate::P(q, _)
            | Gate::Measure(q)
            | Gate::Reset(q) => vec![*q],

            // Two-qubit gates
            Gate::Cnot(c, t)
            | Gate::Cz(c, t)
            | Gate::Cy(c, t)
            | Gate::Swap(c, t)
            | Gate::ISwap(c, t)
            | Gate::ISwapdg(c, t)
            | Gate::Ecr(c, t)
            | Gate::Crz(c, t, _)
            | Gate::Crx(c, t, _)
            | Gate::Cry(c, t, _) => vec![*c, *t],

            // Three-qubit gates
            Gate::Ccx(c1, c2, t) | Gate::Cswap(c1, c2, t) => vec![*c1, *c2, *t],

            Gate::Opaque(gate) => gate.qubits.clone(),

            // Special
            Gate::MeasureAll => vec![], // Applied to all qubits
            Gate::Barrier(qs) => qs.clone(),
        }
    }

    /// Number of qubit operands
    pub fn num_qubits(&self) -> usize {
        self.qubits().len()
    }

    /// Check if gate is single-qubit
    pub fn is_single_qubit(&self) -> bool {
        self.is_unitary() && self.num_qubits() == 1
    }

    /// Check if gate is two-qubit
    pub fn is_two_qubit(&self) -> bool {
        self.is_unitary() && self.num_qubits() == 2
    }

    /// Check if gate acts on more than one qubit
    pub fn is_multi_qubit(&self) -> bool {
        self.is_unitary() && self.num_qubits() > 1
    }

    /// Check if gate is measurement
    pub fn is_measurement(&self) -> bool {
        matches!(self, Gate::Measure(_) | Gate::MeasureAll)
    }

    /// Check if gate is a barrier
    pub fn is_barrier(&self) -> bool {
        matches!(self, Gate::Barrier(_))
    }

    /// Check if gate is a unitary operation (not a directive or
    /// non-unitary instruction)
    pub fn is_unitary(&self) -> bool {
        !matches!(
            self,
            Gate::Measure(_) | Gate::MeasureAll | Gate::Barrier(_) | Gate::Reset(_)
        )
    }

    /// Get gate name
    pub fn name(&self) -> &str {
        match self {
            Gate::H(_) => "h",
            Gate::X(_) => "x",
            Gate::Y(_) => "y",
            Gate::Z(_) => "z",
            Gate::S(_) => "s",
            Gate::Sdg(_) => "sdg",
            Gate::T(_) => "t",
            Gate::Tdg(_) => "tdg",
            Gate::Sx(_) => "sx",
            Gate::Sxdg(_) => "sxdg",
            Gate::Id(_) => "id",
            Gate::Rx(_, _) => "rx",
            Gate::Ry(_, _) => "ry",
            Gate::Rz(_, _) => "rz",
            Gate::U(_, _, _, _) => "u",
            Gate::P(_, _) => "p",
            Gate::Cnot(_, _) => "cx",
            Gate::Cz(_, _) => "cz",
            Gate::Cy(_, _) => "cy",
            Gate::Swap(_, _) => "swap",
            Gate::ISwap(_, _) => "iswap",
            Gate::ISwapdg(_, _) => "iswapdg",
            Gate::Ecr(_, _) => "ecr",
            Gate::Crz(_, _, _) => "crz",
            Gate::Crx(_, _, _) => "crx",
            Gate::Cry(_, _, _) => "cry",
            Gate::Ccx(_, _, _) => "ccx",
            Gate::Cswap(_, _, _) => "cswap",
            Gate::Opaque(gate) => &gate.name,
            Gate::Measure(_) => "measure",
            Gate::MeasureAll => "measure",
            Gate::Barrier(_) => "barrier",
            Gate::Reset(_) => "reset",
        }
    }

    // ========================================================================
    // Inversion
    // ========================================================================

    /// Check if the gate is its own inverse
    pub fn is_self_inverse(&self) -> bool {
        match self {
            Gate::H(_)
            | Gate::X(_)
            | Gate::Y(_)
            | Gate::Z(_)
            | Gate::Id(_)
            | Gate::Cnot(_, _)
            | Gate::Cz(_, _)
            | Gate::Cy(_, _)
            | Gate::Swap(_, _)
            | Gate::Ecr(_, _)
            | Gate::Ccx(_, _, _)
            | Gate::Cswap(_, _, _)
            | Gate::Barrier(_) => true,
            Gate::Opaque(gate) => gate.self_inverse,
            _ => false,
        }
    }

    /// Get the inverse gate
    ///
    /// Rotations negate their angle, `S`/`T`/`SX`/`iSWAP` map to their
    /// adjoint variants. Barriers are returned unchanged.
    ///
    /// # Errors
    ///
    /// [`ZneError::UnsupportedInstruction`] for measurements, resets and
    /// opaque gates not declared self-inverse.
    pub fn inverse(&self) -> ZneResult<Gate> {
        if self.is_self_inverse() {
            return Ok(self.clone());
        }

        let inverse = match self {
            Gate::S(q) => Gate::Sdg(*q),
            Gate::Sdg(q) => Gate::S(*q),
            Gate::T(q) => Gate::Tdg(*q),
            Gate::Tdg(q) => Gate::T(*q),
            Gate::Sx(q) => Gate::Sxdg(*q),
            Gate::Sxdg(q) => Gate::Sx(*q),
            Gate::Rx(q, theta) => Gate::Rx(*q, -theta),
            Gate::Ry(q, theta) => Gate::Ry(*q, -theta),
            Gate::Rz(q, theta) => Gate::Rz(*q, -theta),
            // U(θ, φ, λ)† = U(-θ, -λ, -φ)
            Gate::U(q, theta, phi, lambda) => Gate::U(*q, -theta, -lambda, -phi),
            Gate::P(q, lambda) => Gate::P(*q, -lambda),
            Gate::ISwap(a, b) => Gate::ISwapdg(*a, *b),
            Gate::ISwapdg(a, b) => Gate::ISwap(*a, *b),
            Gate::Crz(c, t, theta) => Gate::Crz(*c, *t, -theta),
            Gate::Crx(c, t, theta) => Gate::Crx(*c, *t, -theta),
            Gate::Cry(c, t, theta) => Gate::Cry(*c, *t, -theta),
            _ => return Err(ZneError::UnsupportedInstruction(self.name().to_string())),
        };

        Ok(inverse)
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let qubits: Vec<String> = self.qubits().iter().map(|q| format!("q{}", q)).collect();
        if qubits.is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{} {}", self.name(), qubits.join(","))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
