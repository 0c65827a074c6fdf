//! Global folding amplifier
//!
//! Gantree: L3_Amplification → GlobalFoldingAmplifier
//!
//! Output is `C (C⁻¹ C)^full` followed by `S⁻¹ S`, where `S` is the ordered
//! subset of `sub` candidate instructions. With barriers enabled every block
//! is fenced across the whole register.
//!
//! `N` counts only the instructions the selector matches. When it matches
//! none, the circuit is returned unfolded for every factor and the result
//! carries a [`zne_core::NoiseFactorApproximationWarning`] reporting a
//! realized factor of 1.

use crate::amplifier::{AmplificationContext, AmplificationLevel, Amplified, NoiseAmplifier};
use crate::folding::{fold_block, push_instructions};
use crate::plan::{FoldingPlan, SubFoldingOption};
use crate::selector::GateSelector;
use serde::{Deserialize, Serialize};
use zne_core::{Circuit, Gate, NoiseFactor, QubitId, ZneResult};

/// Folds the whole circuit, sub-folding a subset of its gates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalFoldingAmplifier {
    selector: GateSelector,
    sub_folding: SubFoldingOption,
}

impl GlobalFoldingAmplifier {
    /// Amplifier name
    pub const NAME: &'static str = "GlobalFoldingAmplifier";

    /// Create with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict sub-folding candidates
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
}

impl NoiseAmplifier for GlobalFoldingAmplifier {
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
        ctx.validate()?;
        let candidates = self.selector.candidates(circuit.gates());
        let plan = FoldingPlan::compute(
            noise_factor,
            candidates.len(),
            ctx.noise_factor_relative_tolerance,
        )?;
        plan.log(self.name());

        // Empty span fences the whole register
        let all_qubits: &[QubitId] = &[];
        let fence = ctx.insert_barriers.then_some(all_qubits);
        let mut noisy = circuit.copy_empty_like();
        push_instructions(&mut noisy, fold_block(circuit.gates(), plan.full, fence)?)?;

        if plan.sub > 0 {
            let picked = self
                .sub_folding
                .select(candidates.len(), plan.sub, ctx.call_seed());
            let sub_block: Vec<Gate> = picked
                .iter()
                .map(|&p| circuit.gates()[candidates[p]].clone())
                .collect();
            let sub_inverse = sub_block
                .iter()
                .rev()
                .map(Gate::inverse)
                .collect::<ZneResult<Vec<_>>>()?;

            let fence = fence.map(|qs| Gate::Barrier(qs.to_vec()));
            push_instructions(
                &mut noisy,
                fence
                    .clone()
                    .into_iter()
                    .chain(sub_inverse)
                    .chain(fence.clone())
                    .chain(sub_block)
                    .chain(fence),
            )?;
        }

        Ok(Amplified::new(noisy, plan))
    }
}

// ============================================================================
// Tests
// ============================================================================
