//! Fold-count computation and sub-folding selection
//!
//! Gantree: L3_Amplification → FoldingPlan
//!
//! For `N` candidate instructions and noise factor `f`:
//! `num_foldings = round_half_even(N·(f−1)/2)`, `full = num_foldings / N`,
//! `sub = num_foldings % N`, realized factor `1 + 2·num_foldings/N`.

use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zne_core::constants::zne::MAX_NUM_FOLDINGS;
use zne_core::types::folding_to_noise_factor;
use zne_core::{
    validate_noise_factor, NoiseFactor, NoiseFactorApproximationWarning, ZneError, ZneResult,
};

// ============================================================================
// Sub-Folding Option
// ============================================================================

/// Which candidates receive the extra fold when the factor is fractional
/// Gantree: SubFoldingOption // from_first | from_last | random
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubFoldingOption {
    /// The first `sub` candidates in circuit order
    #[default]
    FromFirst,

    /// The last `sub` candidates in circuit order
    FromLast,

    /// A uniform sample of `sub` candidates without replacement
    Random,
}

impl SubFoldingOption {
    /// Pick `num_sub` of `num_candidates` positions, ascending
    ///
    /// `seed` only matters for [`SubFoldingOption::Random`]; `None` draws
    /// from OS entropy.
    pub fn select(&self, num_candidates: usize, num_sub: usize, seed: Option<u64>) -> Vec<usize> {
        let num_sub = num_sub.min(num_candidates);
        match self {
            SubFoldingOption::FromFirst => (0..num_sub).collect(),
            SubFoldingOption::FromLast => (num_candidates - num_sub..num_candidates).collect(),
            SubFoldingOption::Random => {
                let mut rng = match seed {
                    Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                    None => ChaCha8Rng::from_entropy(),
                };
                let mut picked = index::sample(&mut rng, num_candidates, num_sub).into_vec();
                picked.sort_unstable();
                picked
            }
        }
    }

    /// Option name
    pub fn as_str(&self) -> &'static str {
        match self {
            SubFoldingOption::FromFirst => "from_first",
            SubFoldingOption::FromLast => "from_last",
            SubFoldingOption::Random => "random",
        }
    }
}

impl FromStr for SubFoldingOption {
    type Err = ZneError;

    fn from_str(s: &str) -> ZneResult<Self> {
        match s.to_lowercase().as_str() {
            "from_first" => Ok(SubFoldingOption::FromFirst),
            "from_last" => Ok(SubFoldingOption::FromLast),
            "random" => Ok(SubFoldingOption::Random),
            other => Err(ZneError::InvalidConfiguration(format!(
                "sub-folding option must be 'from_first', 'from_last' or 'random', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SubFoldingOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Folding Plan
// ============================================================================

/// Fold counts for one amplification
/// Gantree: FoldingPlan // (full, sub), realized factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldingPlan {
    /// Number of candidate instructions `N`
    pub num_candidates: usize,

    /// Full folds applied to every candidate
    pub full: usize,

    /// Candidates that get one extra fold
    pub sub: usize,

    /// Factor asked for
    pub requested: NoiseFactor,

    /// Factor realized by `(full, sub)`
    pub realized: NoiseFactor,

    /// Present when `realized` misses `requested` beyond tolerance
    pub warning: Option<NoiseFactorApproximationWarning>,
}

impl FoldingPlan {
    /// Compute the plan
    ///
    /// # Errors
    ///
    /// `InvalidNoiseFactor` for factors below one, not finite, or needing
    /// more than [`MAX_NUM_FOLDINGS`] folds over `num_candidates`.
    /// Gantree: compute(f, N, tol) -> Result<FoldingPlan>
    pub fn compute(
        noise_factor: NoiseFactor,
        num_candidates: usize,
        tolerance: f64,
    ) -> ZneResult<Self> {
        let requested = validate_noise_factor(noise_factor)?;

        if num_candidates == 0 {
            let warning = (requested > 1.0).then(|| NoiseFactorApproximationWarning {
                requested,
                realized: 1.0,
                relative_error: (requested - 1.0) / requested,
                tolerance,
            });
            return Ok(Self {
                num_candidates,
                full: 0,
                sub: 0,
                requested,
                realized: 1.0,
                warning,
            });
        }

        let n = num_candidates as f64;
        let folds = (n * (requested - 1.0) / 2.0).round_ties_even();
        if folds > MAX_NUM_FOLDINGS as f64 {
            return Err(ZneError::InvalidNoiseFactor(requested));
        }
        let num_foldings = folds as usize;
        let realized = folding_to_noise_factor(num_foldings as f64 / n);

        Ok(Self {
            num_candidates,
            full: num_foldings / num_candidates,
            sub: num_foldings % num_candidates,
            requested,
            realized,
            warning: NoiseFactorApproximationWarning::check(requested, realized, tolerance),
        })
    }

    /// Total number of folds across all candidates
    pub fn num_foldings(&self) -> usize {
        self.full * self.num_candidates + self.sub
    }

    /// Fold count per candidate position, given the sub-folded positions
    pub fn folds_per_candidate(&self, sub_positions: &[usize]) -> Vec<usize> {
        let mut folds = vec![self.full; self.num_candidates];
        for &p in sub_positions {
            if let Some(f) = folds.get_mut(p) {
                *f += 1;
            }
        }
        folds
    }

    /// Log the plan and any approximation warning
    pub fn log(&self, amplifier: &str) {
        log::debug!(
            "{}: noise factor {} over {} candidates -> full={}, sub={}, realized={:.4}",
            amplifier,
            self.requested,
            self.num_candidates,
            self.full,
            self.sub,
            self.realized
        );
        if self.num_candidates == 0 && self.requested > 1.0 {
            log::warn!(
                "{}: noise amplification is not performed since none of the gates are folded",
                amplifier
            );
        } else if let Some(warning) = &self.warning {
            log::warn!("{}: {}", amplifier, warning);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compute_folding_nums() {
        // (noise_factor, N) -> (full, sub)
        let table = [
            (1.0, 10, 0, 0),
            (3.0, 10, 1, 0),
            (5.0, 10, 2, 0),
            (1.5, 10, 0, 2),  // 2.5 rounds to 2
            (2.0, 10, 0, 5),
            (3.5, 4, 1, 1),
            (1.5, 3, 0, 1),   // 0.75 rounds to 1
            (1.5, 1, 0, 0),   // 0.25 rounds to 0
        ];

        for (f, n, full, sub) in table {
            let plan = FoldingPlan::compute(f, n, 0.01).unwrap();
            assert_eq!((plan.full, plan.sub), (full, sub), "f={}, N={}", f, n);
        }
    }

    #[test]
    fn test_round_half_even() {
        // 10·(1.5−1)/2 = 2.5 -> 2
        assert_eq!(FoldingPlan::compute(1.5, 10, 1.0).unwrap().num_foldings(), 2);
        // 14·(1.5−1)/2 = 3.5 -> 4
        assert_eq!(FoldingPlan::compute(1.5, 14, 1.0).unwrap().num_foldings(), 4);
    }

    #[test]
    fn test_realized_factor_and_warning() {
        let plan = FoldingPlan::compute(1.5, 10, 0.01).unwrap();
        assert_relative_eq!(plan.realized, 1.4);
        assert!(plan.warning.is_some());

        let exact = FoldingPlan::compute(3.0, 7, 0.01).unwrap();
        assert_relative_eq!(exact.realized, 3.0);
        assert!(exact.warning.is_none());
    }

    #[test]
    fn test_no_candidates() {
        let plan = FoldingPlan::compute(3.0, 0, 0.01).unwrap();
        assert_eq!((plan.full, plan.sub), (0, 0));
        assert_relative_eq!(plan.realized, 1.0);
        assert!(plan.warning.is_some());

        assert!(FoldingPlan::compute(1.0, 0, 0.01).unwrap().warning.is_none());
    }

    #[test]
    fn test_invalid_noise_factor() {
        assert!(matches!(
            FoldingPlan::compute(0.5, 4, 0.01),
            Err(ZneError::InvalidNoiseFactor(_))
        ));
        assert!(FoldingPlan::compute(f64::NAN, 4, 0.01).is_err());
    }

    #[test]
    fn test_sub_folding_selection() {
        assert_eq!(SubFoldingOption::FromFirst.select(5, 2, None), vec![0, 1]);
        assert_eq!(SubFoldingOption::FromLast.select(5, 2, None), vec![3, 4]);

        let a = SubFoldingOption::Random.select(10, 4, Some(7));
        let b = SubFoldingOption::Random.select(10, 4, Some(7));
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        assert!(a.windows(2).all(|w| w[0] < w[1]));
        assert!(a.iter().all(|&i| i < 10));
    }

    #[test]
    fn test_folds_per_candidate() {
        let plan = FoldingPlan::compute(3.5, 4, 1.0).unwrap();
        assert_eq!(plan.folds_per_candidate(&[3]), vec![1, 1, 1, 2]);
    }

    #[test]
    fn test_huge_factor_rejected() {
        assert!(matches!(
            FoldingPlan::compute(1e30, 2, 0.01),
            Err(ZneError::InvalidNoiseFactor(_))
        ));

        // Ceiling scales with the number of candidates
        let limit = folding_to_noise_factor(MAX_NUM_FOLDINGS as f64);
        assert!(FoldingPlan::compute(limit, 1, 0.01).is_ok());
        assert!(FoldingPlan::compute(limit, 2, 0.01).is_err());
    }

    #[test]
    fn test_option_parsing() {
        assert_eq!(
            "from_last".parse::<SubFoldingOption>().unwrap(),
            SubFoldingOption::FromLast
        );
        assert!("middle".parse::<SubFoldingOption>().is_err());
        assert_eq!(
            serde_json::to_string(&SubFoldingOption::Random).unwrap(),
            "\"random\""
        );
    }
}
