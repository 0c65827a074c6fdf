//! Instruction dependency graph
//!
//! Gantree: L1_Circuit → InstructionDag
//!
//! One node per instruction and one edge per shared wire to the previous
//! instruction on that wire. Node indices follow insertion order, so the
//! smallest-index-first topological order reproduces the source circuit.

use crate::circuit::Circuit;
use crate::error::{ZneError, ZneResult};
use crate::gate::Gate;
use crate::types::QubitId;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// DAG node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagNode {
    /// Instruction
    pub gate: Gate,

    /// Direct predecessors (sorted, deduplicated)
    pub predecessors: Vec<usize>,

    /// Direct successors (sorted, deduplicated)
    pub successors: Vec<usize>,
}

/// Instruction DAG
/// Gantree: InstructionDag // dependency graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionDag {
    num_qubits: usize,
    num_clbits: usize,
    name: Option<String>,
    nodes: Vec<DagNode>,

    /// Last node on each wire
    frontier: Vec<Option<usize>>,
}

impl InstructionDag {
    /// Create an empty DAG
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            num_clbits: 0,
            name: None,
            nodes: Vec::new(),
            frontier: vec![None; num_qubits],
        }
    }

    /// Empty DAG with the same registers and name
    pub fn copy_empty_like(&self) -> Self {
        Self {
            num_qubits: self.num_qubits,
            num_clbits: self.num_clbits,
            name: self.name.clone(),
            nodes: Vec::new(),
            frontier: vec![None; self.num_qubits],
        }
    }

    /// Build from a circuit
    /// Gantree: from_circuit(&Circuit) -> Self
    pub fn from_circuit(circuit: &Circuit) -> Self {
        let mut dag = Self::new(circuit.num_qubits());
        dag.num_clbits = circuit.num_clbits();
        dag.name = circuit.name().map(str::to_string);
        for gate in circuit.gates() {
            dag.push_unchecked(gate.clone());
        }
        dag
    }

    /// Convert back to a circuit in topological order
    /// Gantree: to_circuit(&self) -> Result<Circuit>
    pub fn to_circuit(&self) -> ZneResult<Circuit> {
        let mut circuit = match &self.name {
            Some(name) => Circuit::with_name(self.num_qubits, name.clone()),
            None => Circuit::new(self.num_qubits),
        }
        .with_clbits(self.num_clbits);

        for index in self.topological_order() {
            circuit.add_gate(self.nodes[index].gate.clone())?;
        }
        Ok(circuit)
    }

    /// Append an instruction at the back of the graph
    pub fn push(&mut self, gate: Gate) -> ZneResult<usize> {
        if let Some(&qubit) = gate.qubits().iter().find(|&&q| q >= self.num_qubits) {
            return Err(ZneError::GateQubitMismatch {
                qubit,
                num_qubits: self.num_qubits,
            });
        }
        Ok(self.push_unchecked(gate))
    }

    fn push_unchecked(&mut self, gate: Gate) -> usize {
        let index = self.nodes.len();
        let wires = self.wires(&gate);

        let mut predecessors: Vec<usize> = wires
            .iter()
            .filter_map(|&q| self.frontier.get(q).copied().flatten())
            .collect();
        predecessors.sort_unstable();
        predecessors.dedup();

        for &p in &predecessors {
            self.nodes[p].successors.push(index);
        }
        for &q in &wires {
            if let Some(slot) = self.frontier.get_mut(q) {
                *slot = Some(index);
            }
        }

        self.nodes.push(DagNode {
            gate,
            predecessors,
            successors: Vec::new(),
        });
        index
    }

    /// Wires touched by an instruction; full-register directives touch all
    fn wires(&self, gate: &Gate) -> Vec<QubitId> {
        let qubits = gate.qubits();
        if qubits.is_empty() {
            (0..self.num_qubits).collect()
        } else {
            qubits
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// No nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node by index
    pub fn node(&self, index: usize) -> Option<&DagNode> {
        self.nodes.get(index)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> &[DagNode] {
        &self.nodes
    }

    /// Nodes without predecessors
    pub fn roots(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.nodes[i].predecessors.is_empty())
            .collect()
    }

    /// Kahn's algorithm, lowest available index first
    pub fn topological_order(&self) -> Vec<usize> {
        let mut in_degree: Vec<usize> = self.nodes.iter().map(|n| n.predecessors.len()).collect();
        let mut ready: BinaryHeap<Reverse<usize>> =
            self.roots().into_iter().map(Reverse).collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(Reverse(index)) = ready.pop() {
            order.push(index);
            for &s in &self.nodes[index].successors {
                in_degree[s] -= 1;
                if in_degree[s] == 0 {
                    ready.push(Reverse(s));
                }
            }
        }

        order
    }
}

impl From<&Circuit> for InstructionDag {
    fn from(circuit: &Circuit) -> Self {
        Self::from_circuit(circuit)
    }
}

// ============================================================================
// Tests
// ============================================================================
