//! Circuit builder for ZNE
//!
//! Gantree: L1_Circuit → CircuitBuilder
//!
//! Fluent construction of test and benchmark circuits. The first invalid
//! gate is remembered and reported by [`CircuitBuilder::build_validated`].

use crate::circuit::Circuit;
use crate::error::{ZneError, ZneResult};
use crate::gate::{Gate, OpaqueGate};
use crate::types::{Angle, QubitId};

/// Fluent circuit builder (consuming self pattern)
/// Gantree: CircuitBuilder // builder pattern
#[derive(Debug, Clone)]
pub struct CircuitBuilder {
    circuit: Circuit,
    error: Option<ZneError>,
}

impl CircuitBuilder {
    // ========================================================================
    // Constructor
    // ========================================================================

    /// Create a new circuit builder
    /// Gantree: new(n) -> Self
    pub fn new(num_qubits: usize) -> Self {
        Self {
            circuit: Circuit::new(num_qubits),
            error: None,
        }
    }

    /// Create with circuit name
    pub fn with_name(num_qubits: usize, name: impl Into<String>) -> Self {
        Self {
            circuit: Circuit::with_name(num_qubits, name),
            error: None,
        }
    }

    /// Set classical register width
    pub fn clbits(mut self, num_clbits: usize) -> Self {
        self.circuit = self.circuit.with_clbits(num_clbits);
        self
    }

    /// Add an arbitrary gate
    /// Gantree: gate(self, Gate) -> Self
    pub fn gate(mut self, gate: Gate) -> Self {
        if let Err(err) = self.circuit.add_gate(gate) {
            self.error.get_or_insert(err);
        }
        self
    }

    // ========================================================================
    // Single-Qubit Gates
    // ========================================================================

    /// Add Hadamard gate
    pub fn h(self, qubit: QubitId) -> Self {
        self.gate(Gate::H(qubit))
    }

    /// Add Pauli-X gate
    pub fn x(self, qubit: QubitId) -> Self {
        self.gate(Gate::X(qubit))
    }

    /// Add Pauli-Y gate
    pub fn y(self, qubit: QubitId) -> Self {
        self.gate(Gate::Y(qubit))
    }

    /// Add Pauli-Z gate
    pub fn z(self, qubit: QubitId) -> Self {
        self.gate(Gate::Z(qubit))
    }

    /// Add S gate
    pub fn s(self, qubit: QubitId) -> Self {
        self.gate(Gate::S(qubit))
    }

    /// Add S-dagger gate
    pub fn sdg(self, qubit: QubitId) -> Self {
        self.gate(Gate::Sdg(qubit))
    }

    /// Add T gate
    pub fn t(self, qubit: QubitId) -> Self {
        self.gate(Gate::T(qubit))
    }

    /// Add T-dagger gate
    pub fn tdg(self, qubit: QubitId) -> Self {
        self.gate(Gate::Tdg(qubit))
    }

    /// Add SX gate
    pub fn sx(self, qubit: QubitId) -> Self {
        self.gate(Gate::Sx(qubit))
    }

    /// Add Rx rotation
    pub fn rx(self, qubit: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Rx(qubit, angle))
    }

    /// Add Ry rotation
    pub fn ry(self, qubit: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Ry(qubit, angle))
    }

    /// Add Rz rotation
    pub fn rz(self, qubit: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Rz(qubit, angle))
    }

    /// Add U gate (general single-qubit)
    pub fn u(self, qubit: QubitId, theta: Angle, phi: Angle, lambda: Angle) -> Self {
        self.gate(Gate::U(qubit, theta, phi, lambda))
    }

    /// Add phase gate
    pub fn p(self, qubit: QubitId, lambda: Angle) -> Self {
        self.gate(Gate::P(qubit, lambda))
    }

    // ========================================================================
    // Multi-Qubit Gates
    // ========================================================================

    /// Add CNOT gate
    pub fn cx(self, control: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Cnot(control, target))
    }

    /// Add CZ gate
    pub fn cz(self, control: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Cz(control, target))
    }

    /// Add CY gate
    pub fn cy(self, control: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Cy(control, target))
    }

    /// Add SWAP gate
    pub fn swap(self, qubit1: QubitId, qubit2: QubitId) -> Self {
        self.gate(Gate::Swap(qubit1, qubit2))
    }

    /// Add iSWAP gate
    pub fn iswap(self, qubit1: QubitId, qubit2: QubitId) -> Self {
        self.gate(Gate::ISwap(qubit1, qubit2))
    }

    /// Add controlled-Rz gate
    pub fn crz(self, control: QubitId, target: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Crz(control, target, angle))
    }

    /// Add ECR gate
    pub fn ecr(self, control: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Ecr(control, target))
    }

    /// Add Toffoli gate
    pub fn ccx(self, c1: QubitId, c2: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Ccx(c1, c2, target))
    }

    /// Add a user-defined gate
    pub fn opaque(self, gate: OpaqueGate) -> Self {
        self.gate(Gate::Opaque(gate))
    }

    // ========================================================================
    // Directives and Non-Unitary
    // ========================================================================

    /// Add measurement
    pub fn measure(self, qubit: QubitId) -> Self {
        self.gate(Gate::Measure(qubit))
    }

    /// Add measure all
    pub fn measure_all(self) -> Self {
        self.gate(Gate::MeasureAll)
    }

    /// Add barrier on all qubits
    pub fn barrier(self) -> Self {
        let all = (0..self.circuit.num_qubits()).collect();
        self.gate(Gate::Barrier(all))
    }

    /// Add reset
    pub fn reset(self, qubit: QubitId) -> Self {
        self.gate(Gate::Reset(qubit))
    }

    // ========================================================================
    // Layers
    // ========================================================================

    /// Add Hadamard layer on all qubits
    pub fn h_layer(self) -> Self {
        (0..self.circuit.num_qubits()).fold(self, |b, q| b.h(q))
    }

    /// Add CX chain (linear connectivity)
    pub fn cx_chain(self) -> Self {
        let n = self.circuit.num_qubits();
        (0..n.saturating_sub(1)).fold(self, |b, q| b.cx(q, q + 1))
    }

    /// Hardware-efficient ansatz layer: Ry and Rz on every qubit then a CX chain
    pub fn hea_layer(self, params: &[Angle], layer: usize) -> Self {
        let n = self.circuit.num_qubits();
        let offset = layer * n * 2;

        let mut builder = self;
        for q in 0..n {
            if let Some(&theta) = params.get(offset + q) {
                builder = builder.ry(q, theta);
            }
        }
        for q in 0..n {
            if let Some(&phi) = params.get(offset + n + q) {
                builder = builder.rz(q, phi);
            }
        }
        builder.cx_chain()
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build and return the circuit, dropping invalid gates
    /// Gantree: build(self) -> Circuit
    pub fn build(self) -> Circuit {
        self.circuit
    }

    /// Build, failing on the first invalid gate
    pub fn build_validated(self) -> ZneResult<Circuit> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.circuit),
        }
    }

    /// Get reference to current circuit state
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }
}

// ============================================================================
// Tests
// ============================================================================
