//! Scoring configuration for final score composition
//!
//! This module contains:
//! - Blend weights between the automated metric and the human rating
//! - The expertise multiplier range
//! - The agreement bonus curve parameters

use serde::{Deserialize, Serialize};

/// Upper bound for the agreement bonus; configuration cannot raise it
pub const MAX_AGREEMENT_BONUS: f64 = 0.10;

/// Blend weights and multiplier range used by the score composer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Weight of the automated score (0.0-1.0)
    #[serde(default = "default_automated_weight")]
    pub automated_weight: f64,

    /// Weight of the expertise-scaled human rating (0.0-1.0)
    #[serde(default = "default_human_weight")]
    pub human_weight: f64,

    /// Multiplier at the lowest expertise weight bound
    #[serde(default = "default_min_multiplier")]
    pub min_multiplier: f64,

    /// Multiplier at the highest expertise weight bound
    #[serde(default = "default_max_multiplier")]
    pub max_multiplier: f64,

    #[serde(default)]
    pub agreement_bonus: AgreementBonusConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            automated_weight: default_automated_weight(),
            human_weight: default_human_weight(),
            min_multiplier: default_min_multiplier(),
            max_multiplier: default_max_multiplier(),
            agreement_bonus: AgreementBonusConfig::default(),
        }
    }
}

impl ScoringConfig {
    // Pure function: Check if a weight is in valid range
    pub fn is_valid_weight(weight: f64) -> bool {
        (0.0..=1.0).contains(&weight)
    }

    // Pure function: Validate a single weight with name
    pub fn validate_weight(weight: f64, name: &str) -> Result<(), String> {
        if Self::is_valid_weight(weight) {
            Ok(())
        } else {
            Err(format!("{} weight must be between 0.0 and 1.0", name))
        }
    }

    // Pure function: Validate blend weights sum to 1.0
    pub fn validate_weights_sum(automated: f64, human: f64) -> Result<(), String> {
        let sum = automated + human;
        if (sum - 1.0).abs() > 0.001 {
            Err(format!(
                "Scoring weights (automated, human) must sum to 1.0, but sum to {:.3}",
                sum
            ))
        } else {
            Ok(())
        }
    }

    /// Validate weights, multiplier range and bonus curve
    pub fn validate(&self) -> Result<(), String> {
        Self::validate_weight(self.automated_weight, "Automated")?;
        Self::validate_weight(self.human_weight, "Human")?;
        Self::validate_weights_sum(self.automated_weight, self.human_weight)?;

        if !(self.min_multiplier > 0.0 && self.min_multiplier <= self.max_multiplier) {
            return Err(format!(
                "Multiplier range must satisfy 0 < min <= max, got [{}, {}]",
                self.min_multiplier, self.max_multiplier
            ));
        }

        self.agreement_bonus.validate()
    }

    /// Normalize blend weights to ensure they sum to 1.0
    pub fn normalize(&mut self) {
        let sum = self.automated_weight + self.human_weight;
        if sum > 0.0 && (sum - 1.0).abs() > f64::EPSILON {
            self.automated_weight /= sum;
            self.human_weight /= sum;
        }
    }
}

/// Parameters of the agreement bonus curve.
///
/// `bonus(d) = max_bonus * max(0, 1 - d / tolerance)` where `d` is the
/// absolute gap between the automated score and the normalized rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementBonusConfig {
    #[serde(default = "default_bonus_enabled")]
    pub enabled: bool,

    /// Bonus granted at perfect agreement (at most 0.10)
    #[serde(default = "default_max_bonus")]
    pub max_bonus: f64,

    /// Gap at which the bonus reaches zero
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for AgreementBonusConfig {
    fn default() -> Self {
        Self {
            enabled: default_bonus_enabled(),
            max_bonus: default_max_bonus(),
            tolerance: default_tolerance(),
        }
    }
}

impl AgreementBonusConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=MAX_AGREEMENT_BONUS).contains(&self.max_bonus) {
            return Err(format!(
                "Agreement bonus must be between 0.0 and {MAX_AGREEMENT_BONUS}, got {}",
                self.max_bonus
            ));
        }
        if !(self.tolerance > 0.0 && self.tolerance <= 1.0) {
            return Err(format!(
                "Agreement bonus tolerance must be in (0.0, 1.0], got {}",
                self.tolerance
            ));
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_automated_weight() -> f64 {
    0.6
}
fn default_human_weight() -> f64 {
    0.4
}
fn default_min_multiplier() -> f64 {
    0.8
}
fn default_max_multiplier() -> f64 {
    1.5
}
fn default_bonus_enabled() -> bool {
    true
}
fn default_max_bonus() -> f64 {
    MAX_AGREEMENT_BONUS
}
fn default_tolerance() -> f64 {
    0.25
}
