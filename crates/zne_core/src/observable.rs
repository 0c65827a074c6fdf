//! Pauli observables
//!
//! Gantree: L1_Circuit → Observable
//!
//! Real linear combinations of Pauli strings. Labels are read left to right
//! with character `i` acting on qubit `i`.

use crate::error::{ZneError, ZneResult};
use crate::types::QubitId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Single-qubit Pauli operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity
    I,
    /// Pauli-X
    X,
    /// Pauli-Y
    Y,
    /// Pauli-Z
    Z,
}

impl TryFrom<char> for Pauli {
    type Error = ZneError;

    fn try_from(c: char) -> ZneResult<Self> {
        match c.to_ascii_uppercase() {
            'I' => Ok(Pauli::I),
            'X' => Ok(Pauli::X),
            'Y' => Ok(Pauli::Y),
            'Z' => Ok(Pauli::Z),
            other => Err(ZneError::InvalidObservable(format!(
                "unknown Pauli '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        };
        write!(f, "{}", c)
    }
}

/// Weighted Pauli string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliTerm {
    /// Real coefficient
    pub coefficient: f64,

    /// One Pauli per qubit
    pub paulis: Vec<Pauli>,
}

impl PauliTerm {
    /// Parse a label such as `"ZZI"`
    pub fn new(coefficient: f64, label: &str) -> ZneResult<Self> {
        if !coefficient.is_finite() {
            return Err(ZneError::InvalidObservable(format!(
                "non-finite coefficient {}",
                coefficient
            )));
        }
        let paulis = label
            .chars()
            .map(Pauli::try_from)
            .collect::<ZneResult<Vec<_>>>()?;
        Ok(Self {
            coefficient,
            paulis,
        })
    }

    /// Qubits acted on non-trivially
    pub fn support(&self) -> Vec<QubitId> {
        self.paulis
            .iter()
            .enumerate()
            .filter(|(_, p)| **p != Pauli::I)
            .map(|(q, _)| q)
            .collect()
    }

    /// Label string
    pub fn label(&self) -> String {
        self.paulis.iter().map(|p| p.to_string()).collect()
    }
}

/// Observable: sum of weighted Pauli strings on a fixed register
/// Gantree: Observable // Σ c·P
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observable {
    num_qubits: usize,
    terms: Vec<PauliTerm>,
}

impl Observable {
    /// Empty observable
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            terms: Vec::new(),
        }
    }

    /// Observable from weighted labels
    pub fn from_terms<'a>(
        num_qubits: usize,
        terms: impl IntoIterator<Item = (f64, &'a str)>,
    ) -> ZneResult<Self> {
        terms
            .into_iter()
            .try_fold(Self::new(num_qubits), |obs, (c, label)| obs.with_term(c, label))
    }

    /// Single Z on one qubit
    pub fn z(qubit: QubitId, num_qubits: usize) -> ZneResult<Self> {
        let label: String = (0..num_qubits)
            .map(|q| if q == qubit { 'Z' } else { 'I' })
            .collect();
        if qubit >= num_qubits {
            return Err(ZneError::GateQubitMismatch { qubit, num_qubits });
        }
        Self::new(num_qubits).with_term(1.0, &label)
    }

    /// Add a term
    pub fn with_term(mut self, coefficient: f64, label: &str) -> ZneResult<Self> {
        let term = PauliTerm::new(coefficient, label)?;
        if term.paulis.len() != self.num_qubits {
            return Err(ZneError::InvalidObservable(format!(
                "label '{}' has {} qubits, observable has {}",
                label,
                term.paulis.len(),
                self.num_qubits
            )));
        }
        self.terms.push(term);
        Ok(self)
    }

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Terms
    pub fn terms(&self) -> &[PauliTerm] {
        &self.terms
    }

    /// Sum of |coefficient|, an upper bound on |⟨O⟩|
    pub fn norm_bound(&self) -> f64 {
        self.terms.iter().map(|t| t.coefficient.abs()).sum()
    }
}

impl FromStr for Observable {
    type Err = ZneError;

    /// Parse a single unit-weight label, e.g. `"ZZ"`
    fn from_str(s: &str) -> ZneResult<Self> {
        let label = s.trim();
        if label.is_empty() {
            return Err(ZneError::InvalidObservable("empty label".into()));
        }
        Observable::new(label.chars().count()).with_term(1.0, label)
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .terms
            .iter()
            .map(|t| format!("{}*{}", t.coefficient, t.label()))
            .collect();
        write!(f, "{}", terms.join(" + "))
    }
}

// ============================================================================
// Tests
// ============================================================================
