//! Mitigation metadata
//!
//! Gantree: L5_Engine → ZneMetadata
//!
//! Serialized shape:
//!
//! ```text
//! { "std_error": f64,
//!   "zne": {
//!     "noise_amplification": { "noise_amplifier", "noise_factors", "values",
//!                              "variance", "shots", "realized_noise_factors" },
//!     "extrapolation": { "extrapolator", ...fit statistics } } }
//! ```

use crate::orchestrator::NoiseAmplificationRecord;
use crate::strategy::ZneStrategy;
use serde::{Deserialize, Serialize};
use zne_core::NoiseFactor;

/// Name and options of a pipeline component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInfo {
    /// Component name
    pub name: String,

    /// Component options
    pub options: serde_json::Value,
}

/// Noise amplification section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseAmplificationMetadata {
    /// Amplifier used
    pub noise_amplifier: ComponentInfo,

    /// Requested noise factors
    pub noise_factors: Vec<NoiseFactor>,

    /// Noisy expectation value per factor
    pub values: Vec<f64>,

    /// Single-shot variance per factor
    pub variance: Vec<f64>,

    /// Shots per factor
    pub shots: Vec<u64>,

    /// Noise factors realized by folding
    pub realized_noise_factors: Vec<NoiseFactor>,
}

/// Extrapolation section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrapolationMetadata {
    /// Extrapolator used
    pub extrapolator: ComponentInfo,

    /// Fit statistics reported by the extrapolator
    #[serde(flatten)]
    pub fit: serde_json::Map<String, serde_json::Value>,
}

/// `zne` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZneSection {
    /// Amplification details
    pub noise_amplification: NoiseAmplificationMetadata,

    /// Extrapolation details
    pub extrapolation: ExtrapolationMetadata,
}

/// Metadata attached to a mitigated result
/// Gantree: ZneMetadata // std_error + zne.{noise_amplification, extrapolation}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZneMetadata {
    /// Std error of the mitigated value
    pub std_error: f64,

    /// Mitigation details
    pub zne: ZneSection,
}

impl ZneMetadata {
    /// Assemble from a strategy, its amplification record and fit statistics
    pub fn new(
        strategy: &ZneStrategy,
        record: &NoiseAmplificationRecord,
        std_error: f64,
        fit: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let noise_amplifier = strategy
            .noise_amplifier()
            .map_or_else(
                || ComponentInfo {
                    name: "none".into(),
                    options: serde_json::Value::Null,
                },
                |a| ComponentInfo {
                    name: a.name().to_string(),
                    options: a.options(),
                },
            );
        let extrapolator = strategy.extrapolator();

        Self {
            std_error,
            zne: ZneSection {
                noise_amplification: NoiseAmplificationMetadata {
                    noise_amplifier,
                    noise_factors: record.noise_factors.clone(),
                    values: record.values(),
                    variance: record.measurements.iter().map(|m| m.variance).collect(),
                    shots: record.measurements.iter().map(|m| m.shots).collect(),
                    realized_noise_factors: record.realized_noise_factors.clone(),
                },
                extrapolation: ExtrapolationMetadata {
                    extrapolator: ComponentInfo {
                        name: extrapolator.name().to_string(),
                        options: extrapolator.options(),
                    },
                    fit,
                },
            },
        }
    }

    /// Requested noise factors
    pub fn noise_factors(&self) -> &[NoiseFactor] {
        &self.zne.noise_amplification.noise_factors
    }

    /// Noisy values per factor
    pub fn values(&self) -> &[f64] {
        &self.zne.noise_amplification.values
    }
}
