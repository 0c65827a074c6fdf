//! Gate folding primitive
//!
//! Gantree: L3_Amplification → Folding
//!
//! Replaces a gate `G` by `G (G⁻¹ G)^k`, an odd-length sequence that is
//! logically the identity on top of `G` but carries `2k+1` times its noise.

use zne_core::{Circuit, Gate, QubitId, ZneError, ZneResult};

/// Fold a single instruction `num_folds` times
///
/// With `barriers` set, a barrier on the gate's qubits surrounds the folded
/// sequence and separates every `G`/`G⁻¹` pair. `num_folds = 0` returns just
/// the gate, without barriers.
///
/// # Errors
///
/// `UnsupportedInstruction` if the gate has no known inverse and
/// `num_folds > 0`.
///
/// # Example
///
/// ```rust
/// use zne_amplification::folding::fold_instruction;
/// use zne_core::Gate;
///
/// let folded = fold_instruction(&Gate::S(0), 1, false).unwrap();
/// assert_eq!(folded, vec![Gate::S(0), Gate::Sdg(0), Gate::S(0)]);
/// ```
pub fn fold_instruction(gate: &Gate, num_folds: usize, barriers: bool) -> ZneResult<Vec<Gate>> {
    let qubits = gate.qubits();
    let fence = if barriers { Some(qubits.as_slice()) } else { None };
    fold_block(std::slice::from_ref(gate), num_folds, fence)
}

/// Fold a contiguous block of instructions `num_folds` times
///
/// The block inverse is the reversed sequence of element-wise inverses.
/// `barrier` is the span of the fences placed around and between blocks
/// (`None` for no fences, an empty slice for the whole register).
pub fn fold_block(
    block: &[Gate],
    num_folds: usize,
    barrier: Option<&[QubitId]>,
) -> ZneResult<Vec<Gate>> {
    if num_folds == 0 {
        return Ok(block.to_vec());
    }

    let inverse = block
        .iter()
        .rev()
        .map(Gate::inverse)
        .collect::<ZneResult<Vec<_>>>()?;

    let capacity = num_folds
        .checked_mul(2)
        .and_then(|c| c.checked_add(1))
        .and_then(|c| c.checked_mul(block.len() + 1))
        .and_then(|c| c.checked_add(1))
        .ok_or_else(|| {
            ZneError::InvalidConfiguration(format!(
                "folding {} instructions {} times overflows",
                block.len(),
                num_folds
            ))
        })?;

    let fence = barrier.map(|qs| Gate::Barrier(qs.to_vec()));
    let mut folded = Vec::with_capacity(capacity);

    folded.extend(fence.clone());
    folded.extend_from_slice(block);
    for _ in 0..num_folds {
        folded.extend(fence.clone());
        folded.extend_from_slice(&inverse);
        folded.extend(fence.clone());
        folded.extend_from_slice(block);
    }
    folded.extend(fence);

    Ok(folded)
}

/// Push instructions into a circuit, deduplicating adjacent barriers
pub fn push_instructions(
    circuit: &mut Circuit,
    instructions: impl IntoIterator<Item = Gate>,
) -> ZneResult<()> {
    for gate in instructions {
        match gate {
            Gate::Barrier(qubits) => {
                circuit.add_barrier(qubits)?;
            }
            other => circuit.add_gate(other)?,
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
