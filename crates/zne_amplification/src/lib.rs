//! # ZNE Amplification
//!
//! Gate-folding noise amplifiers.
//!
//! ## Gantree Architecture
//!
//! ```text
//! zne_amplification // L3: Amplification
//!     Folding // fold_instruction, fold_block
//!     FoldingPlan // (full, sub) counts, realized factor, warning
//!     NoiseAmplifier // trait, circuit and DAG entry points
//!     GateSelector // folding candidates
//!     GlobalFoldingAmplifier // C (C⁻¹ C)^k S⁻¹ S
//!     LocalFoldingAmplifier // G (G⁻¹ G)^k per gate
//!     Presets // Cx, TwoQubit, MultiQubit
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use zne_amplification::prelude::*;
//! use zne_core::CircuitBuilder;
//!
//! let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).build();
//! let ctx = AmplificationContext::default();
//!
//! let amplified = MultiQubitAmplifier::new()
//!     .amplify_circuit_noise(&circuit, 3.0, &ctx)
//!     .unwrap();
//!
//! assert_eq!(amplified.output.count_2q(), 3);
//! assert_eq!(amplified.realized(), 3.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Folding primitive (Gantree: L3_Amplification → Folding)
pub mod folding;

/// Fold counts (Gantree: L3_Amplification → FoldingPlan)
pub mod plan;

/// Amplifier trait (Gantree: L3_Amplification → NoiseAmplifier)
pub mod amplifier;

/// Candidate selection (Gantree: L3_Amplification → GateSelector)
pub mod selector;

/// Global folding (Gantree: L3_Amplification → GlobalFoldingAmplifier)
pub mod global;

/// Local folding (Gantree: L3_Amplification → LocalFoldingAmplifier)
pub mod local;

/// Local folding presets (Gantree: L3_Amplification → Presets)
pub mod presets;

// ============================================================================
// Re-exports
// ============================================================================

pub use amplifier::{AmplificationContext, AmplificationLevel, Amplified, NoiseAmplifier};
pub use folding::{fold_block, fold_instruction};
pub use global::GlobalFoldingAmplifier;
pub use local::LocalFoldingAmplifier;
pub use plan::{FoldingPlan, SubFoldingOption};
pub use presets::{CxAmplifier, MultiQubitAmplifier, TwoQubitAmplifier};
pub use selector::GateSelector;

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use zne_amplification::prelude::*;
    //! ```

    pub use crate::amplifier::{
        AmplificationContext, AmplificationLevel, Amplified, NoiseAmplifier,
    };
    pub use crate::global::GlobalFoldingAmplifier;
    pub use crate::local::LocalFoldingAmplifier;
    pub use crate::plan::{FoldingPlan, SubFoldingOption};
    pub use crate::presets::{CxAmplifier, MultiQubitAmplifier, TwoQubitAmplifier};
    pub use crate::selector::GateSelector;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use proptest::prelude::*;
    use zne_backend::StateVector;
    use zne_core::{Circuit, CircuitBuilder, Gate, ZneError};

    fn ansatz() -> Circuit {
        CircuitBuilder::new(3)
            .hea_layer(&[0.3, -0.7, 1.1, 0.4, 0.9, -0.2], 0)
            .s(1)
            .t(2)
            .crz(0, 2, 0.8)
            .iswap(1, 2)
            .sx(0)
            .build()
    }

    fn assert_equivalent(base: &Circuit, noisy: &Circuit) {
        let a = StateVector::from_circuit(base).unwrap();
        let b = StateVector::from_circuit(noisy).unwrap();
        let fidelity = a.fidelity(&b);
        assert!((fidelity - 1.0).abs() < 1e-9, "fidelity {}", fidelity);
    }

    fn amplifiers() -> Vec<Box<dyn NoiseAmplifier>> {
        vec![
            Box::new(GlobalFoldingAmplifier::new()),
            Box::new(GlobalFoldingAmplifier::new().with_sub_folding(SubFoldingOption::Random)),
            Box::new(LocalFoldingAmplifier::new().with_sub_folding(SubFoldingOption::FromLast)),
            Box::new(CxAmplifier::new()),
            Box::new(TwoQubitAmplifier::new()),
            Box::new(MultiQubitAmplifier::new().with_sub_folding(SubFoldingOption::Random)),
        ]
    }

    #[test]
    fn test_amplified_circuits_are_equivalent() {
        let base = ansatz();
        let ctx = AmplificationContext::default().with_seed(3);
        for amplifier in amplifiers() {
            for &f in &[1.0, 1.5, 2.2, 3.0, 4.7, 5.0] {
                let amplified = amplifier.amplify_circuit_noise(&base, f, &ctx).unwrap();
                assert_equivalent(&base, &amplified.output);
            }
        }
    }

    #[test]
    fn test_base_circuit_untouched() {
        let base = ansatz();
        let snapshot = base.clone();
        let ctx = AmplificationContext::default();
        for amplifier in amplifiers() {
            amplifier.amplify_circuit_noise(&base, 3.0, &ctx).unwrap();
        }
        assert_eq!(base, snapshot);
    }

    #[test]
    fn test_no_adjacent_duplicate_barriers() {
        let base = ansatz();
        let ctx = AmplificationContext::default();
        for amplifier in amplifiers() {
            let output = amplifier.amplify_circuit_noise(&base, 5.0, &ctx).unwrap().output;
            for pair in output.gates().windows(2) {
                if let (Gate::Barrier(a), Gate::Barrier(b)) = (&pair[0], &pair[1]) {
                    assert_ne!(a, b, "{} duplicated a barrier", amplifier.name());
                }
            }
        }
    }

    #[test]
    fn test_folding_scales_candidate_count() {
        let base = ansatz();
        let ctx = AmplificationContext::default().with_barriers(false);
        let n_2q = base.count_2q();
        for k in 0..4usize {
            let f = (2 * k + 1) as f64;
            let output = TwoQubitAmplifier::new()
                .amplify_circuit_noise(&base, f, &ctx)
                .unwrap()
                .output;
            assert_eq!(output.count_2q(), (2 * k + 1) * n_2q);
            assert_eq!(output.count_1q(), base.count_1q());
        }
    }

    #[test]
    fn test_measurement_blocks_global_folding() {
        let base = CircuitBuilder::new(1).h(0).measure(0).build();
        let ctx = AmplificationContext::default();
        assert!(matches!(
            GlobalFoldingAmplifier::new().amplify_circuit_noise(&base, 3.0, &ctx),
            Err(ZneError::UnsupportedInstruction(_))
        ));

        // Local folding leaves the measurement alone
        let local = LocalFoldingAmplifier::new()
            .amplify_circuit_noise(&base, 3.0, &ctx)
            .unwrap();
        assert_eq!(local.output.count_measurements(), 1);
    }

    #[test]
    fn test_huge_noise_factor_is_an_error() {
        let base = CircuitBuilder::new(2).h(0).cx(0, 1).build();
        let ctx = AmplificationContext::default();
        for amplifier in amplifiers() {
            let result = amplifier.amplify_circuit_noise(&base, 1e30, &ctx);
            assert!(
                matches!(result, Err(ZneError::InvalidNoiseFactor(_))),
                "{} accepted 1e30",
                amplifier.name()
            );
        }
    }

    #[test]
    fn test_random_sub_folding_depends_on_disambiguator() {
        let base = CircuitBuilder::new(4)
            .h_layer()
            .cx_chain()
            .h_layer()
            .cx_chain()
            .build();
        let amplifier = LocalFoldingAmplifier::new().with_sub_folding(SubFoldingOption::Random);
        let ctx = AmplificationContext::default().with_seed(5);

        let runs: Vec<Circuit> = (0..8)
            .map(|d| {
                amplifier
                    .amplify_circuit_noise(&base, 1.4, &ctx.with_disambiguator(d))
                    .unwrap()
                    .output
            })
            .collect();
        assert!(runs.windows(2).any(|w| w[0] != w[1]));

        let again = amplifier
            .amplify_circuit_noise(&base, 1.4, &ctx.with_disambiguator(0))
            .unwrap()
            .output;
        assert_eq!(again, runs[0]);
    }

    fn arb_gate() -> impl Strategy<Value = Gate> {
        prop_oneof![
            (0..3usize).prop_map(Gate::H),
            (0..3usize).prop_map(Gate::S),
            (0..3usize).prop_map(Gate::Tdg),
            (0..3usize, -3.0..3.0f64).prop_map(|(q, a)| Gate::Ry(q, a)),
            (0..3usize, -3.0..3.0f64).prop_map(|(q, a)| Gate::Rz(q, a)),
            (0..3usize, 1..3usize).prop_map(|(c, d)| Gate::Cnot(c, (c + d) % 3)),
            (0..3usize, 1..3usize, -2.0..2.0f64).prop_map(|(c, d, a)| Gate::Crz(c, (c + d) % 3, a)),
        ]
    }

    proptest! {
        #[test]
        fn prop_fold_round_trip(
            gates in proptest::collection::vec(arb_gate(), 1..12),
            f in 1.0..6.0f64,
            seed in any::<u64>(),
        ) {
            let base = Circuit::from_gates(3, gates).unwrap();
            let ctx = AmplificationContext::default().with_seed(seed);
            let amplifier = LocalFoldingAmplifier::new().with_sub_folding(SubFoldingOption::Random);
            let output = amplifier.amplify_circuit_noise(&base, f, &ctx).unwrap().output;

            let a = StateVector::from_circuit(&base).unwrap();
            let b = StateVector::from_circuit(&output).unwrap();
            prop_assert!((a.fidelity(&b) - 1.0).abs() < 1e-9);
        }

        #[test]
        fn prop_fold_counts_monotonic(n in 1..50usize, f in 1.0..8.0f64, df in 0.0..2.0f64) {
            let low = FoldingPlan::compute(f, n, 0.01).unwrap();
            let high = FoldingPlan::compute(f + df, n, 0.01).unwrap();
            prop_assert!(high.num_foldings() >= low.num_foldings());
            prop_assert!(low.sub < n);
            // Rounding error on num_foldings is at most one half
            prop_assert!((low.realized - f).abs() <= 1.0 / n as f64 + 1e-12);
        }
    }
}
