//! # ZNE Core
//!
//! Errors, circuits, instructions and observables shared by every ZNE crate.
//!
//! ## Gantree Architecture
//!
//! ```text
//! zne_core // L0+L1: Foundation + Circuit
//!     L0_Foundation // base types, constants, errors
//!         CoreTypes // noise factor validation, approximation warning
//!         Constants // strategy defaults, numeric thresholds
//!         Errors // ZneError
//!     L1_Circuit // circuit model
//!         Gate // instruction enum with inverses
//!         Circuit // ordered instruction list
//!         InstructionDag // dependency graph form
//!         CircuitBuilder // fluent builder
//!         Observable // Pauli sums
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use zne_core::prelude::*;
//!
//! let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).build();
//! let inverse = circuit.inverse().unwrap();
//!
//! assert_eq!(inverse.gates()[0], Gate::Cnot(0, 1));
//! assert_eq!(inverse.gates()[1], Gate::H(0));
//! ```
//!
//! ## DAG Form
//!
//! ```rust
//! use zne_core::prelude::*;
//!
//! let circuit = CircuitBuilder::new(3).h(0).x(2).cx(0, 1).build();
//! let dag = InstructionDag::from_circuit(&circuit);
//!
//! assert_eq!(dag.roots(), vec![0, 1]);
//! assert_eq!(dag.to_circuit().unwrap(), circuit);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types (Gantree: L0_Foundation → CoreTypes)
pub mod types;

/// Constants (Gantree: L0_Foundation → Constants)
pub mod constants;

/// Error types (Gantree: L0_Foundation → Errors)
pub mod error;

/// Quantum gates (Gantree: L1_Circuit → Gate)
pub mod gate;

/// Circuit structure (Gantree: L1_Circuit → Circuit)
pub mod circuit;

/// Instruction DAG (Gantree: L1_Circuit → InstructionDag)
pub mod dag;

/// Circuit builder (Gantree: L1_Circuit → CircuitBuilder)
pub mod builder;

/// Pauli observables (Gantree: L1_Circuit → Observable)
pub mod observable;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::CircuitBuilder;
pub use circuit::Circuit;
pub use constants::{numeric, zne};
pub use dag::{DagNode, InstructionDag};
pub use error::{ZneError, ZneResult};
pub use gate::{Gate, OpaqueGate};
pub use observable::{Observable, Pauli, PauliTerm};
pub use types::{
    validate_noise_factor, Angle, NoiseFactor, NoiseFactorApproximationWarning, QubitId,
};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use zne_core::prelude::*;
    //! ```

    pub use crate::builder::CircuitBuilder;
    pub use crate::circuit::Circuit;
    pub use crate::constants::{numeric, zne};
    pub use crate::dag::InstructionDag;
    pub use crate::error::{ZneError, ZneResult};
    pub use crate::gate::{Gate, OpaqueGate};
    pub use crate::observable::{Observable, Pauli};
    pub use crate::types::{
        validate_noise_factor, Angle, NoiseFactor, NoiseFactorApproximationWarning, QubitId,
    };
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_inverse_of_ansatz_round_trips() {
        let params = [0.3, -0.7, 1.1, 0.2, 0.9, -0.4];
        let circuit = CircuitBuilder::new(3).hea_layer(&params, 0).build();

        let twice = circuit.inverse().unwrap().inverse().unwrap();
        assert_eq!(twice, circuit);
    }

    #[test]
    fn test_dag_preserves_layout() {
        let circuit = CircuitBuilder::with_name(4, "ghz")
            .clbits(4)
            .h(0)
            .cx_chain()
            .barrier()
            .build();

        let back = InstructionDag::from_circuit(&circuit).to_circuit().unwrap();
        assert_eq!(back.name(), Some("ghz"));
        assert_eq!(back.num_clbits(), 4);
        assert_eq!(back, circuit);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(zne::DEFAULT_NOISE_FACTORS, [1.0, 3.0, 5.0]);
        assert!(validate_noise_factor(zne::DEFAULT_NOISE_FACTORS[2]).is_ok());
        assert_eq!(zne::DEFAULT_RELATIVE_TOLERANCE, 0.01);
    }

    #[test]
    fn test_observable_matches_register() {
        let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).build();
        let obs: Observable = "ZZ".parse().unwrap();
        assert_eq!(obs.num_qubits(), circuit.num_qubits());
    }
}
