//! Configuration for the evaluation engine.
//!
//! Every field has a default, so an empty `.evalmap.toml` (or none at all)
//! yields the reference weights and thresholds.

pub mod loader;
pub mod scoring;

pub use loader::{load_config, load_config_from_path, parse_and_validate_config};
pub use scoring::{AgreementBonusConfig, ScoringConfig, MAX_AGREEMENT_BONUS};

use serde::{Deserialize, Serialize};

/// File name searched for in the working directory and its ancestors
pub const CONFIG_FILE_NAME: &str = ".evalmap.toml";

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalmapConfig {
    /// Compute independent analyses in parallel
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Expertise weight assumed when an evaluator did not report one
    #[serde(default = "default_expertise_weight")]
    pub default_expertise_weight: f64,

    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl Default for EvalmapConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            default_expertise_weight: default_expertise_weight(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl EvalmapConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.default_expertise_weight.is_finite() || self.default_expertise_weight < 0.0 {
            return Err(format!(
                "default_expertise_weight must be a non-negative number, got {}",
                self.default_expertise_weight
            ));
        }
        self.scoring.validate()
    }

    /// Serialize to the TOML written by `evalmap init`
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn default_parallel() -> bool {
    true
}

fn default_expertise_weight() -> f64 {
    1.0
}
