//! Local folding presets
//!
//! Gantree: L3_Amplification → Presets // cx | two-qubit | multi-qubit

use crate::amplifier::{AmplificationContext, AmplificationLevel, Amplified, NoiseAmplifier};
use crate::local::LocalFoldingAmplifier;
use crate::plan::SubFoldingOption;
use crate::selector::GateSelector;
use std::collections::BTreeSet;
use zne_core::{Circuit, NoiseFactor, ZneResult};

macro_rules! local_preset {
    ($(#[$doc:meta])* $name:ident, $label:literal, $selector:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            inner: LocalFoldingAmplifier,
        }

        impl $name {
            /// Amplifier name
            pub const NAME: &'static str = $label;

            /// Create with default sub-folding
            pub fn new() -> Self {
                Self {
                    inner: LocalFoldingAmplifier::new().with_selector($selector),
                }
            }

            /// Set the sub-folding option
            pub fn with_sub_folding(self, sub_folding: SubFoldingOption) -> Self {
                Self {
                    inner: self.inner.with_sub_folding(sub_folding),
                }
            }

            /// Underlying local amplifier
            pub fn local(&self) -> &LocalFoldingAmplifier {
                &self.inner
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl NoiseAmplifier for $name {
            fn name(&self) -> &str {
                Self::NAME
            }

            fn options(&self) -> serde_json::Value {
                self.inner.options()
            }

            fn native_level(&self) -> Option<AmplificationLevel> {
                Some(AmplificationLevel::Circuit)
            }

            fn amplify_circuit_noise(
                &self,
                circuit: &Circuit,
                noise_factor: NoiseFactor,
                ctx: &AmplificationContext,
            ) -> ZneResult<Amplified<Circuit>> {
                self.inner
                    .amplify_named(Self::NAME, circuit, noise_factor, ctx)
            }
        }
    };
}

local_preset!(
    /// Folds CX gates only
    CxAmplifier,
    "CxAmplifier",
    GateSelector::names(["cx"])
);

local_preset!(
    /// Folds two-qubit gates only
    TwoQubitAmplifier,
    "TwoQubitAmplifier",
    GateSelector::Matching {
        names: BTreeSet::new(),
        num_qubits: BTreeSet::from([2]),
    }
);

local_preset!(
    /// Folds gates acting on more than one qubit, the default amplifier
    MultiQubitAmplifier,
    "MultiQubitAmplifier",
    GateSelector::MultiQubit
);

// ============================================================================
// Tests
// ============================================================================
