//! ZNE strategy configuration
//!
//! Gantree: L5_Engine → ZneStrategy
//!
//! Immutable binding of noise amplifier, noise factors and extrapolator,
//! validated once by [`ZneStrategyBuilder::build`].

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use zne_amplification::{AmplificationContext, MultiQubitAmplifier, NoiseAmplifier};
use zne_core::constants::zne::{
    DEFAULT_INSERT_BARRIERS, DEFAULT_NOISE_FACTORS, DEFAULT_RELATIVE_TOLERANCE,
};
use zne_core::{validate_noise_factor, NoiseFactor, ZneError, ZneResult};
use zne_extrapolation::{Extrapolator, PolynomialExtrapolator};

// ============================================================================
// Mode
// ============================================================================

/// Whether the strategy mitigates at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyMode {
    /// Raw results pass through unchanged
    Noop,

    /// Amplify, estimate and extrapolate
    Active,
}

// ============================================================================
// Strategy
// ============================================================================

/// Validated ZNE configuration
/// Gantree: ZneStrategy // amplifier, factors, extrapolator, mode
#[derive(Debug, Clone)]
pub struct ZneStrategy {
    noise_amplifier: Option<Arc<dyn NoiseAmplifier>>,
    noise_factors: Vec<NoiseFactor>,
    extrapolator: Arc<dyn Extrapolator>,
    insert_barriers: bool,
    noise_factor_relative_tolerance: f64,
    random_seed: Option<u64>,
    mode: StrategyMode,
}

impl ZneStrategy {
    /// Start a builder with default settings
    pub fn builder() -> ZneStrategyBuilder {
        ZneStrategyBuilder::default()
    }

    /// Strategy that never mitigates
    pub fn noop() -> Self {
        Self {
            noise_amplifier: None,
            noise_factors: vec![1.0],
            extrapolator: Arc::new(PolynomialExtrapolator::linear()),
            insert_barriers: DEFAULT_INSERT_BARRIERS,
            noise_factor_relative_tolerance: DEFAULT_RELATIVE_TOLERANCE,
            random_seed: None,
            mode: StrategyMode::Noop,
        }
    }

    /// Mode fixed at build time
    pub fn mode(&self) -> StrategyMode {
        self.mode
    }

    /// Check for noop mode
    pub fn is_noop(&self) -> bool {
        self.mode == StrategyMode::Noop
    }

    /// Check for active mode
    pub fn is_active(&self) -> bool {
        self.mode == StrategyMode::Active
    }

    /// Configured amplifier
    pub fn noise_amplifier(&self) -> Option<&Arc<dyn NoiseAmplifier>> {
        self.noise_amplifier.as_ref()
    }

    /// Sorted, distinct noise factors
    pub fn noise_factors(&self) -> &[NoiseFactor] {
        &self.noise_factors
    }

    /// Number of noise factors
    pub fn num_noise_factors(&self) -> usize {
        self.noise_factors.len()
    }

    /// Configured extrapolator
    pub fn extrapolator(&self) -> &Arc<dyn Extrapolator> {
        &self.extrapolator
    }

    /// Barrier insertion flag
    pub fn insert_barriers(&self) -> bool {
        self.insert_barriers
    }

    /// Allowed relative deviation of realized noise factors
    pub fn noise_factor_relative_tolerance(&self) -> f64 {
        self.noise_factor_relative_tolerance
    }

    /// Seed for random sub-folding
    pub fn random_seed(&self) -> Option<u64> {
        self.random_seed
    }

    /// Amplification context for one `(problem, factor)` pair
    pub fn amplification_context(&self, problem: usize, factor: usize) -> AmplificationContext {
        let mut ctx = AmplificationContext::default()
            .with_barriers(self.insert_barriers)
            .with_tolerance(self.noise_factor_relative_tolerance)
            .with_disambiguator(((problem as u64) << 32) | factor as u64);
        ctx.random_seed = self.random_seed;
        ctx
    }

    /// Executions needed for `num_problems` problems
    pub fn total_executions(&self, num_problems: usize) -> usize {
        match self.mode {
            StrategyMode::Noop => num_problems,
            StrategyMode::Active => num_problems * self.noise_factors.len(),
        }
    }
}

impl Default for ZneStrategy {
    fn default() -> Self {
        ZneStrategyBuilder::default().build_default()
    }
}

impl fmt::Display for ZneStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amplifier = self
            .noise_amplifier
            .as_ref()
            .map_or("none", |a| a.name());
        write!(
            f,
            "ZneStrategy({:?}, amplifier={}, factors={:?}, extrapolator={})",
            self.mode,
            amplifier,
            self.noise_factors,
            self.extrapolator.name()
        )
    }
}

#[derive(Serialize)]
struct ComponentView<'a> {
    name: &'a str,
    options: serde_json::Value,
}

#[derive(Serialize)]
struct StrategyView<'a> {
    mode: StrategyMode,
    noise_amplifier: Option<ComponentView<'a>>,
    noise_factors: &'a [NoiseFactor],
    extrapolator: ComponentView<'a>,
    insert_barriers: bool,
    noise_factor_relative_tolerance: f64,
    random_seed: Option<u64>,
}

impl Serialize for ZneStrategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StrategyView {
            mode: self.mode,
            noise_amplifier: self.noise_amplifier.as_ref().map(|a| ComponentView {
                name: a.name(),
                options: a.options(),
            }),
            noise_factors: &self.noise_factors,
            extrapolator: ComponentView {
                name: self.extrapolator.name(),
                options: self.extrapolator.options(),
            },
            insert_barriers: self.insert_barriers,
            noise_factor_relative_tolerance: self.noise_factor_relative_tolerance,
            random_seed: self.random_seed,
        }
        .serialize(serializer)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ZneStrategy`]
#[derive(Debug, Clone)]
pub struct ZneStrategyBuilder {
    noise_amplifier: Option<Arc<dyn NoiseAmplifier>>,
    noise_factors: Vec<NoiseFactor>,
    extrapolator: Arc<dyn Extrapolator>,
    insert_barriers: bool,
    noise_factor_relative_tolerance: f64,
    random_seed: Option<u64>,
}

impl Default for ZneStrategyBuilder {
    fn default() -> Self {
        Self {
            noise_amplifier: Some(Arc::new(MultiQubitAmplifier::new())),
            noise_factors: DEFAULT_NOISE_FACTORS.to_vec(),
            extrapolator: Arc::new(PolynomialExtrapolator::linear()),
            insert_barriers: DEFAULT_INSERT_BARRIERS,
            noise_factor_relative_tolerance: DEFAULT_RELATIVE_TOLERANCE,
            random_seed: None,
        }
    }
}

impl ZneStrategyBuilder {
    /// Set the noise amplifier
    pub fn noise_amplifier(mut self, amplifier: impl NoiseAmplifier + 'static) -> Self {
        self.noise_amplifier = Some(Arc::new(amplifier));
        self
    }

    /// Set a shared noise amplifier
    pub fn shared_noise_amplifier(mut self, amplifier: Arc<dyn NoiseAmplifier>) -> Self {
        self.noise_amplifier = Some(amplifier);
        self
    }

    /// Remove the noise amplifier, forcing noop mode
    pub fn without_noise_amplifier(mut self) -> Self {
        self.noise_amplifier = None;
        self
    }

    /// Set the noise factors
    pub fn noise_factors(mut self, factors: impl IntoIterator<Item = NoiseFactor>) -> Self {
        self.noise_factors = factors.into_iter().collect();
        self
    }

    /// Set the extrapolator
    pub fn extrapolator(mut self, extrapolator: impl Extrapolator + 'static) -> Self {
        self.extrapolator = Arc::new(extrapolator);
        self
    }

    /// Set a shared extrapolator
    pub fn shared_extrapolator(mut self, extrapolator: Arc<dyn Extrapolator>) -> Self {
        self.extrapolator = extrapolator;
        self
    }

    /// Set barrier insertion
    pub fn insert_barriers(mut self, insert_barriers: bool) -> Self {
        self.insert_barriers = insert_barriers;
        self
    }

    /// Set relative tolerance for realized noise factors
    pub fn noise_factor_relative_tolerance(mut self, tolerance: f64) -> Self {
        self.noise_factor_relative_tolerance = tolerance;
        self
    }

    /// Set the seed for random sub-folding
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Validate and build
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` for empty factors, a bad tolerance, or fewer
    ///   factors than the extrapolator needs
    /// - `InvalidNoiseFactor` for factors below one or not finite
    /// Gantree: build() -> Result<ZneStrategy>
    pub fn build(self) -> ZneResult<ZneStrategy> {
        if self.noise_factors.is_empty() {
            return Err(ZneError::InvalidConfiguration(
                "noise factors must not be empty".into(),
            ));
        }
        for &factor in &self.noise_factors {
            validate_noise_factor(factor)?;
        }

        AmplificationContext::default()
            .with_tolerance(self.noise_factor_relative_tolerance)
            .validate()?;

        let noise_factors = normalize_noise_factors(self.noise_factors.clone());

        let mode = self.mode_for(&noise_factors);

        if mode == StrategyMode::Active && noise_factors.len() < self.extrapolator.min_points() {
            return Err(ZneError::InvalidConfiguration(format!(
                "{} needs at least {} noise factors, got {}",
                self.extrapolator.name(),
                self.extrapolator.min_points(),
                noise_factors.len()
            )));
        }

        Ok(self.assemble(noise_factors, mode))
    }

    /// Assemble without validation; the builder defaults are always valid
    fn build_default(self) -> ZneStrategy {
        let noise_factors = self.noise_factors.clone();
        let mode = self.mode_for(&noise_factors);
        self.assemble(noise_factors, mode)
    }

    fn mode_for(&self, noise_factors: &[NoiseFactor]) -> StrategyMode {
        match &self.noise_amplifier {
            Some(_) if noise_factors.iter().any(|&f| f > 1.0) => StrategyMode::Active,
            _ => StrategyMode::Noop,
        }
    }

    fn assemble(self, noise_factors: Vec<NoiseFactor>, mode: StrategyMode) -> ZneStrategy {
        ZneStrategy {
            noise_amplifier: self.noise_amplifier,
            noise_factors,
            extrapolator: self.extrapolator,
            insert_barriers: self.insert_barriers,
            noise_factor_relative_tolerance: self.noise_factor_relative_tolerance,
            random_seed: self.random_seed,
            mode,
        }
    }
}

/// Sort ascending and drop duplicates, warning when either changes the input
fn normalize_noise_factors(factors: Vec<NoiseFactor>) -> Vec<NoiseFactor> {
    let mut sorted = factors.clone();
    sorted.sort_by(f64::total_cmp);
    if sorted != factors {
        log::warn!("Unordered noise factors detected and rearranged: {:?}", factors);
    }

    let len = sorted.len();
    sorted.dedup();
    if sorted.len() != len {
        log::warn!("Duplicate noise factors detected and erased: {:?}", sorted);
    }
    sorted
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use zne_amplification::{CxAmplifier, GlobalFoldingAmplifier};
    use zne_extrapolation::MultiExponentialExtrapolator;

    #[test]
    fn test_defaults() {
        let strategy = ZneStrategy::builder().build().unwrap();
        assert!(strategy.is_active());
        assert_eq!(strategy.noise_factors(), &[1.0, 3.0, 5.0]);
        assert_eq!(strategy.noise_amplifier().unwrap().name(), "MultiQubitAmplifier");
        assert_eq!(strategy.extrapolator().name(), "LinearExtrapolator");
        assert!(strategy.insert_barriers());
        assert_eq!(strategy.noise_factor_relative_tolerance(), 0.01);
        assert_eq!(strategy.random_seed(), None);
    }

    #[test]
    fn test_default_matches_builder() {
        let a = serde_json::to_value(ZneStrategy::default()).unwrap();
        let b = serde_json::to_value(ZneStrategy::builder().build().unwrap()).unwrap();
        assert_eq!(a, b);

        let strategy = ZneStrategy::default();
        assert!(strategy.is_active());
        assert_eq!(strategy.noise_factors(), &[1.0, 3.0, 5.0]);
        assert_eq!(strategy.mode(), ZneStrategy::builder().build().unwrap().mode());
    }

    #[test]
    fn test_sort_and_dedup() {
        let strategy = ZneStrategy::builder()
            .noise_factors([5.0, 1.0, 3.0, 3.0])
            .build()
            .unwrap();
        assert_eq!(strategy.noise_factors(), &[1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_invalid_factors() {
        assert!(matches!(
            ZneStrategy::builder().noise_factors(Vec::new()).build(),
            Err(ZneError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            ZneStrategy::builder().noise_factors([1.0, 0.5]).build(),
            Err(ZneError::InvalidNoiseFactor(_))
        ));
        assert!(matches!(
            ZneStrategy::builder().noise_factors([1.0, f64::INFINITY]).build(),
            Err(ZneError::InvalidNoiseFactor(_))
        ));
    }

    #[test]
    fn test_noop_modes() {
        assert!(ZneStrategy::noop().is_noop());

        let ones = ZneStrategy::builder().noise_factors([1.0]).build().unwrap();
        assert!(ones.is_noop());

        let unamplified = ZneStrategy::builder()
            .without_noise_amplifier()
            .build()
            .unwrap();
        assert!(unamplified.is_noop());
        assert_eq!(unamplified.total_executions(4), 4);
    }

    #[test]
    fn test_min_points_enforced() {
        let err = ZneStrategy::builder()
            .noise_factors([1.0, 3.0])
            .extrapolator(MultiExponentialExtrapolator::mono())
            .build()
            .unwrap_err();
        assert!(err.is_configuration_error());

        // Noop skips the check
        assert!(ZneStrategy::builder()
            .noise_factors([1.0])
            .extrapolator(MultiExponentialExtrapolator::bi())
            .build()
            .is_ok());
    }

    #[test]
    fn test_bad_tolerance() {
        assert!(ZneStrategy::builder()
            .noise_factor_relative_tolerance(-1.0)
            .build()
            .is_err());
    }

    #[test]
    fn test_amplification_context() {
        let strategy = ZneStrategy::builder()
            .noise_amplifier(GlobalFoldingAmplifier::new())
            .insert_barriers(false)
            .random_seed(9)
            .build()
            .unwrap();
        let ctx = strategy.amplification_context(2, 1);
        assert!(!ctx.insert_barriers);
        assert_eq!(ctx.random_seed, Some(9));
        assert_eq!(ctx.disambiguator, (2u64 << 32) | 1);
        assert_ne!(
            ctx.call_seed(),
            strategy.amplification_context(1, 2).call_seed()
        );
    }

    #[test]
    fn test_serialize() {
        let strategy = ZneStrategy::builder()
            .noise_amplifier(CxAmplifier::new())
            .noise_factors([1.0, 2.0, 3.0])
            .build()
            .unwrap();
        let json = serde_json::to_value(&strategy).unwrap();
        assert_eq!(json["mode"], "active");
        assert_eq!(json["noise_amplifier"]["name"], "CxAmplifier");
        assert_eq!(json["extrapolator"]["options"]["degree"], 1);
        assert_eq!(json["noise_factors"], serde_json::json!([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_total_executions() {
        let strategy = ZneStrategy::builder().build().unwrap();
        assert_eq!(strategy.total_executions(4), 12);
    }
}
