//! Local folding amplifier
//!
//! Gantree: L3_Amplification → LocalFoldingAmplifier
//!
//! Every candidate gate is replaced in place by `G (G⁻¹ G)^k`, where `k`
//! is the full fold count plus one if the gate was picked for sub-folding.

use crate::amplifier::{AmplificationContext, AmplificationLevel, Amplified, NoiseAmplifier};
use crate::folding::{fold_instruction, push_instructions};
use crate::plan::{FoldingPlan, SubFoldingOption};
use crate::selector::GateSelector;
use serde::{Deserialize, Serialize};
use zne_core::{Circuit, NoiseFactor, ZneResult};

/// Folds selected gates in place
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalFoldingAmplifier {
    selector: GateSelector,
    sub_folding: SubFoldingOption,
}

impl LocalFoldingAmplifier {
    /// Amplifier name
    pub const NAME: &'static str = "LocalFoldingAmplifier";

    /// Fold every unitary gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold only the gates matched by `selector`
    pub fn with_selector(mut self, selector: GateSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Set the sub-folding option
    pub fn with_sub_folding(mut self, sub_folding: SubFoldingOption) -> Self {
        self.sub_folding = sub_folding;
        self
    }

    /// Candidate selector
    pub fn selector(&self) -> &GateSelector {
        &self.selector
    }

    /// Sub-folding option
    pub fn sub_folding(&self) -> SubFoldingOption {
        self.sub_folding
    }

    /// Fold counts for each instruction of `circuit`, zero for non-candidates
    pub fn foldings_per_gate(
        &self,
        circuit: &Circuit,
        noise_factor: NoiseFactor,
        ctx: &AmplificationContext,
    ) -> ZneResult<(Vec<usize>, FoldingPlan)> {
        let candidates = self.selector.candidates(circuit.gates());
        let plan = FoldingPlan::compute(
            noise_factor,
            candidates.len(),
            ctx.noise_factor_relative_tolerance,
        )?;
        let picked = self
            .sub_folding
            .select(candidates.len(), plan.sub, ctx.call_seed());

        let mut foldings = vec![0; circuit.gates().len()];
        for (&index, folds) in candidates.iter().zip(plan.folds_per_candidate(&picked)) {
            foldings[index] = folds;
        }
        Ok((foldings, plan))
    }

    pub(crate) fn amplify_named(
        &self,
        name: &str,
        circuit: &Circuit,
        noise_factor: NoiseFactor,
        ctx: &AmplificationContext,
    ) -> ZneResult<Amplified<Circuit>> {
        ctx.validate()?;
        let (foldings, plan) = self.foldings_per_gate(circuit, noise_factor, ctx)?;
        plan.log(name);

        let mut noisy = circuit.copy_empty_like();
        for (gate, &folds) in circuit.gates().iter().zip(&foldings) {
            let folded = fold_instruction(gate, folds, ctx.insert_barriers)?;
            push_instructions(&mut noisy, folded)?;
        }

        Ok(Amplified::new(noisy, plan))
    }
}

impl NoiseAmplifier for LocalFoldingAmplifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({
            "sub_folding_option": self.sub_folding.as_str(),
            "gates_to_fold": self.selector.to_json(),
        })
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
        self.amplify_named(Self::NAME, circuit, noise_factor, ctx)
    }
}

// ============================================================================
// Tests
// ============================================================================
