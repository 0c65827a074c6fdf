//! Quantum circuit structure for ZNE
//!
//! Gantree: L1_Circuit → Circuit
//!
//! Ordered instruction list over a fixed qubit register. Amplifiers never
//! mutate their input; they build a fresh circuit with
//! [`Circuit::copy_empty_like`] and push instructions into it.

use crate::error::{ZneError, ZneResult};
use crate::gate::Gate;
use crate::types::QubitId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Quantum circuit
/// Gantree: Circuit // circuit struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Number of qubits
    /// Gantree: num_qubits: usize
    num_qubits: usize,

    /// Number of classical bits
    num_clbits: usize,

    /// Gate sequence
    /// Gantree: gates: Vec<Gate>
    gates: Vec<Gate>,

    /// Optional circuit name
    name: Option<String>,
}

impl Circuit {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a new empty circuit
    /// Gantree: new(n) -> Self
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            num_clbits: 0,
            gates: Vec::new(),
            name: None,
        }
    }

    /// Create a circuit with a name
    pub fn with_name(num_qubits: usize, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(num_qubits)
        }
    }

    /// Set the classical register width
    pub fn with_clbits(mut self, num_clbits: usize) -> Self {
        self.num_clbits = num_clbits;
        self
    }

    /// Create from a vector of gates
    pub fn from_gates(num_qubits: usize, gates: Vec<Gate>) -> ZneResult<Self> {
        let circuit = Self {
            gates,
            ..Self::new(num_qubits)
        };
        circuit.validate_gates()?;
        Ok(circuit)
    }

    /// Empty circuit with the same registers and name
    /// Gantree: copy_empty_like(&self) -> Self // layout preserved
    pub fn copy_empty_like(&self) -> Self {
        Self {
            num_qubits: self.num_qubits,
            num_clbits: self.num_clbits,
            gates: Vec::new(),
            name: self.name.clone(),
        }
    }

    // ========================================================================
    // Basic Operations
    // ========================================================================

    /// Add a gate to the circuit
    /// Gantree: add_gate(&mut, Gate) -> Result
    pub fn add_gate(&mut self, gate: Gate) -> ZneResult<()> {
        self.check_qubits(&gate)?;
        self.gates.push(gate);
        Ok(())
    }

    /// Add a barrier on the given qubits (empty = all qubits)
    ///
    /// Nothing is added when the last instruction is already a barrier on
    /// the same qubits. Returns whether a barrier was added.
    /// Gantree: add_barrier(&mut, qs) -> Result<bool> // idempotent
    pub fn add_barrier(&mut self, qubits: Vec<QubitId>) -> ZneResult<bool> {
        let barrier = Gate::Barrier(qubits);
        self.check_qubits(&barrier)?;

        if let Some(Gate::Barrier(last)) = self.gates.last() {
            if self.barrier_span(last) == self.barrier_span(&barrier.qubits()) {
                return Ok(false);
            }
        }

        self.gates.push(barrier);
        Ok(true)
    }

    /// Add a barrier across the whole register
    pub fn add_barrier_all(&mut self) -> ZneResult<bool> {
        self.add_barrier((0..self.num_qubits).collect())
    }

    /// Append every instruction of another circuit
    ///
    /// Barriers go through [`Circuit::add_barrier`] so no duplicate fences
    /// are created at the seam.
    pub fn append(&mut self, other: &Circuit) -> ZneResult<()> {
        for gate in &other.gates {
            match gate {
                Gate::Barrier(qs) => {
                    self.add_barrier(qs.clone())?;
                }
                _ => self.add_gate(gate.clone())?,
            }
        }
        Ok(())
    }

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get number of classical bits
    pub fn num_clbits(&self) -> usize {
        self.num_clbits
    }

    /// Get gates
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Get circuit name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Check if circuit is empty
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    // ========================================================================
    // Inversion
    // ========================================================================

    /// Inverse circuit: reversed order, each gate replaced by its inverse
    ///
    /// # Errors
    ///
    /// [`ZneError::UnsupportedInstruction`] if any instruction has no inverse.
    pub fn inverse(&self) -> ZneResult<Circuit> {
        let mut inverse = self.copy_empty_like();
        for gate in self.gates.iter().rev() {
            inverse.gates.push(gate.inverse()?);
        }
        Ok(inverse)
    }

    // ========================================================================
    // Circuit Analysis
    // ========================================================================

    /// Get total instruction count (barriers included)
    /// Gantree: gate_count(&self) -> usize
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// Count unitary gates (barriers, measurements and resets excluded)
    pub fn count_unitary(&self) -> usize {
        self.gates.iter().filter(|g| g.is_unitary()).count()
    }

    /// Count single-qubit gates
    /// Gantree: count_1q(&self) -> usize
    pub fn count_1q(&self) -> usize {
        self.gates.iter().filter(|g| g.is_single_qubit()).count()
    }

    /// Count two-qubit gates
    /// Gantree: count_2q(&self) -> usize
    pub fn count_2q(&self) -> usize {
        self.gates.iter().filter(|g| g.is_two_qubit()).count()
    }

    /// Count barriers
    pub fn count_barriers(&self) -> usize {
        self.gates.iter().filter(|g| g.is_barrier()).count()
    }

    /// Count measurement operations
    pub fn count_measurements(&self) -> usize {
        self.gates.iter().filter(|g| g.is_measurement()).count()
    }

    /// Instruction counts by gate name
    pub fn count_ops(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for gate in &self.gates {
            *counts.entry(gate.name().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Same gate sequence once barriers are removed
    pub fn equivalent_ignoring_barriers(&self, other: &Circuit) -> bool {
        self.num_qubits == other.num_qubits
            && self
                .gates
                .iter()
                .filter(|g| !g.is_barrier())
                .eq(other.gates.iter().filter(|g| !g.is_barrier()))
    }

    // ========================================================================
    // Validation
    // ========================================================================

    fn check_qubits(&self, gate: &Gate) -> ZneResult<()> {
        for qubit in gate.qubits() {
            if qubit >= self.num_qubits {
                return Err(ZneError::GateQubitMismatch {
                    qubit,
                    num_qubits: self.num_qubits,
                });
            }
        }
        Ok(())
    }

    fn validate_gates(&self) -> ZneResult<()> {
        self.gates.iter().try_for_each(|g| self.check_qubits(g))
    }

    /// Sorted, deduplicated qubit span of a barrier (empty = all)
    fn barrier_span(&self, qubits: &[QubitId]) -> Vec<QubitId> {
        if qubits.is_empty() {
            return (0..self.num_qubits).collect();
        }
        let mut span = qubits.to_vec();
        span.sort_unstable();
        span.dedup();
        span
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit({}{} qubits, {} instructions)",
            self.name.as_deref().map(|n| format!("{}: ", n)).unwrap_or_default(),
            self.num_qubits,
            self.gates.len()
        )?;
        writeln!(f, "  1Q gates: {}", self.count_1q())?;
        writeln!(f, "  2Q gates: {}", self.count_2q())?;
        writeln!(f, "  Barriers: {}", self.count_barriers())?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bell() -> Circuit {
        let mut circuit = Circuit::with_name(2, "bell").with_clbits(2);
        circuit.add_gate(Gate::H(0)).unwrap();
        circuit.add_gate(Gate::Cnot(0, 1)).unwrap();
        circuit
    }

    #[test]
    fn test_circuit_new() {
        let circuit = Circuit::new(5);
        assert_eq!(circuit.num_qubits(), 5);
        assert_eq!(circuit.num_clbits(), 0);
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_add_gate_out_of_range() {
        let mut circuit = Circuit::new(3);
        assert!(matches!(
            circuit.add_gate(Gate::H(5)),
            Err(ZneError::GateQubitMismatch { qubit: 5, num_qubits: 3 })
        ));
    }

    #[test]
    fn test_copy_empty_like_preserves_layout() {
        let empty = bell().copy_empty_like();
        assert!(empty.is_empty());
        assert_eq!(empty.num_qubits(), 2);
        assert_eq!(empty.num_clbits(), 2);
        assert_eq!(empty.name(), Some("bell"));
    }

    #[test]
    fn test_barrier_idempotent() {
        let mut circuit = bell();
        assert!(circuit.add_barrier(vec![0, 1]).unwrap());
        assert!(!circuit.add_barrier(vec![1, 0]).unwrap());
        assert!(!circuit.add_barrier(vec![]).unwrap());
        assert!(circuit.add_barrier(vec![0]).unwrap());
        assert_eq!(circuit.count_barriers(), 2);
    }

    #[test]
    fn test_inverse() {
        let mut circuit = Circuit::new(2);
        circuit.add_gate(Gate::S(0)).unwrap();
        circuit.add_gate(Gate::Cnot(0, 1)).unwrap();
        circuit.add_gate(Gate::Rz(1, 0.4)).unwrap();

        let inverse = circuit.inverse().unwrap();
        assert_eq!(
            inverse.gates(),
            &[Gate::Rz(1, -0.4), Gate::Cnot(0, 1), Gate::Sdg(0)]
        );
    }

    #[test]
    fn test_inverse_with_measurement_fails() {
        let mut circuit = bell();
        circuit.add_gate(Gate::Measure(0)).unwrap();
        assert!(matches!(
            circuit.inverse(),
            Err(ZneError::UnsupportedInstruction(_))
        ));
    }

    #[test]
    fn test_count_ops() {
        let mut circuit = bell();
        circuit.add_gate(Gate::Cnot(0, 1)).unwrap();
        let counts = circuit.count_ops();
        assert_eq!(counts.get("cx"), Some(&2));
        assert_eq!(counts.get("h"), Some(&1));
        assert_eq!(circuit.count_2q(), 2);
    }

    #[test]
    fn test_equivalent_ignoring_barriers() {
        let mut fenced = bell().copy_empty_like();
        fenced.add_barrier_all().unwrap();
        fenced.append(&bell()).unwrap();
        fenced.add_barrier_all().unwrap();

        assert!(fenced.equivalent_ignoring_barriers(&bell()));
        assert_ne!(fenced, bell());
    }
}
