//! Gate selection for folding
//!
//! Gantree: L3_Amplification → GateSelector
//!
//! Decides which instructions are folding candidates. Barriers,
//! measurements and resets never are.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use zne_core::{Gate, ZneError, ZneResult};

/// Candidate filter
/// Gantree: GateSelector // all | names ∪ qubit counts | multi-qubit
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateSelector {
    /// Every unitary gate
    #[default]
    All,

    /// Union of gates with one of `names` and gates on one of `num_qubits`
    Matching {
        /// Gate names, e.g. `"cx"`
        names: BTreeSet<String>,

        /// Qubit counts, e.g. `2` for all two-qubit gates
        num_qubits: BTreeSet<usize>,
    },

    /// Gates on more than one qubit
    MultiQubit,
}

impl GateSelector {
    /// Select gates by name
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GateSelector::Matching {
            names: names.into_iter().map(Into::into).collect(),
            num_qubits: BTreeSet::new(),
        }
    }

    /// Select gates by qubit count
    pub fn num_qubits(counts: impl IntoIterator<Item = usize>) -> ZneResult<Self> {
        GateSelector::Matching {
            names: BTreeSet::new(),
            num_qubits: BTreeSet::new(),
        }
        .with_num_qubits(counts)
    }

    /// Add names to the union
    pub fn with_names<I, S>(self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self {
            GateSelector::Matching {
                mut names,
                num_qubits,
            } => {
                names.extend(extra.into_iter().map(Into::into));
                GateSelector::Matching { names, num_qubits }
            }
            other => other,
        }
    }

    /// Add qubit counts to the union
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for a count of zero.
    pub fn with_num_qubits(self, counts: impl IntoIterator<Item = usize>) -> ZneResult<Self> {
        match self {
            GateSelector::Matching {
                names,
                mut num_qubits,
            } => {
                for count in counts {
                    if count < 1 {
                        return Err(ZneError::InvalidConfiguration(
                            "gate qubit counts must be at least one".into(),
                        ));
                    }
                    num_qubits.insert(count);
                }
                Ok(GateSelector::Matching { names, num_qubits })
            }
            other => Ok(other),
        }
    }

    /// Check if a gate is a folding candidate
    /// Gantree: matches(&Gate) -> bool
    pub fn matches(&self, gate: &Gate) -> bool {
        if !gate.is_unitary() {
            return false;
        }
        match self {
            GateSelector::All => true,
            GateSelector::MultiQubit => gate.num_qubits() > 1,
            GateSelector::Matching { names, num_qubits } => {
                names.contains(gate.name()) || num_qubits.contains(&gate.num_qubits())
            }
        }
    }

    /// Positions of the candidates in an instruction list
    pub fn candidates(&self, gates: &[Gate]) -> Vec<usize> {
        gates
            .iter()
            .enumerate()
            .filter(|(_, g)| self.matches(g))
            .map(|(i, _)| i)
            .collect()
    }

    /// JSON form for metadata (`null` for all gates)
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            GateSelector::All => serde_json::Value::Null,
            GateSelector::MultiQubit => serde_json::json!("multi_qubit"),
            GateSelector::Matching { names, num_qubits } => {
                let mut entries: Vec<serde_json::Value> =
                    num_qubits.iter().map(|&n| serde_json::json!(n)).collect();
                entries.extend(names.iter().map(|n| serde_json::json!(n)));
                serde_json::Value::Array(entries)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_excludes_directives() {
        let selector = GateSelector::All;
        assert!(selector.matches(&Gate::H(0)));
        assert!(!selector.matches(&Gate::Barrier(vec![0])));
        assert!(!selector.matches(&Gate::Measure(0)));
        assert!(!selector.matches(&Gate::Reset(0)));
    }

    #[test]
    fn test_union() {
        let selector = GateSelector::num_qubits([2])
            .unwrap()
            .with_names(["h", "x"]);
        assert!(selector.matches(&Gate::Cz(0, 1)));
        assert!(selector.matches(&Gate::H(0)));
        assert!(selector.matches(&Gate::X(0)));
        assert!(!selector.matches(&Gate::Y(0)));
        assert!(!selector.matches(&Gate::Ccx(0, 1, 2)));
    }

    #[test]
    fn test_multi_qubit() {
        let selector = GateSelector::MultiQubit;
        assert!(selector.matches(&Gate::Cnot(0, 1)));
        assert!(selector.matches(&Gate::Ccx(0, 1, 2)));
        assert!(!selector.matches(&Gate::Rz(0, 0.1)));
    }

    #[test]
    fn test_invalid_count() {
        assert!(matches!(
            GateSelector::num_qubits([0]),
            Err(ZneError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_candidates() {
        let gates = [
            Gate::H(0),
            Gate::Cnot(0, 1),
            Gate::Barrier(vec![0, 1]),
            Gate::Cnot(1, 0),
        ];
        assert_eq!(GateSelector::names(["cx"]).candidates(&gates), vec![1, 3]);
    }

    #[test]
    fn test_to_json() {
        let selector = GateSelector::names(["cx"]).with_num_qubits([3]).unwrap();
        assert_eq!(selector.to_json(), serde_json::json!([3, "cx"]));
        assert!(GateSelector::All.to_json().is_null());
    }
}
