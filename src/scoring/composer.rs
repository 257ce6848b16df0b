//! Final score composition.
//!
//! Blends an automated metric with an expertise-scaled human rating into one
//! score in [0, 1]:
//!
//! ```text
//! final = clamp(0.6 * automated + 0.4 * (rating * multiplier))
//! multiplier = 0.8 + (weight / 10) * 0.7
//! ```
//!
//! An optional agreement bonus rewards convergent evidence when the automated
//! score and the normalized rating are close.
//!
//! # Examples
//!
//! ```rust
//! use evalmap::scoring::composer::{expertise_multiplier, final_score};
//!
//! assert!((expertise_multiplier(10.0) - 1.5).abs() < 1e-12);
//! let score = final_score(Some(0.8), Some(1.0), 1.0).unwrap();
//! assert!((score - 0.88).abs() < 1e-12);
//! ```

use crate::config::{AgreementBonusConfig, ScoringConfig};
use crate::core::stats::clamp_unit;

/// Lowest self-reported expertise weight
pub const MIN_EXPERTISE_WEIGHT: f64 = 1.0;
/// Highest self-reported expertise weight
pub const MAX_EXPERTISE_WEIGHT: f64 = 10.0;

/// Map an expertise weight in [1, 10] to a multiplier in [0.8, 1.5].
///
/// Weights outside the range are clamped; a non-finite weight counts as the
/// minimum.
pub fn expertise_multiplier(weight: f64) -> f64 {
    multiplier_in_range(weight, 0.8, 1.5)
}

fn multiplier_in_range(weight: f64, min: f64, max: f64) -> f64 {
    let weight = if weight.is_finite() {
        weight.clamp(MIN_EXPERTISE_WEIGHT, MAX_EXPERTISE_WEIGHT)
    } else {
        MIN_EXPERTISE_WEIGHT
    };
    min + (weight / MAX_EXPERTISE_WEIGHT) * (max - min)
}

/// Blend with the reference 0.6 / 0.4 weights and no bonus.
pub fn final_score(
    automated: Option<f64>,
    user_rating: Option<f64>,
    multiplier: f64,
) -> Option<f64> {
    blend(automated, user_rating, multiplier, 0.6, 0.4)
}

fn blend(
    automated: Option<f64>,
    user_rating: Option<f64>,
    multiplier: f64,
    automated_weight: f64,
    human_weight: f64,
) -> Option<f64> {
    match (automated, user_rating) {
        (None, None) => None,
        (Some(auto), None) => Some(clamp_unit(auto)),
        // Only human evidence is available
        (None, Some(rating)) => Some(clamp_unit(rating * multiplier)),
        (Some(auto), Some(rating)) => Some(clamp_unit(
            auto * automated_weight + rating * multiplier * human_weight,
        )),
    }
}

/// Agreement bonus for an (automated, normalized rating) pair.
///
/// `max_bonus * max(0, 1 - |automated - rating| / tolerance)`: monotone
/// non-increasing in the gap and bounded in `[0, max_bonus]`. Zero when either
/// input is missing or the bonus is disabled.
pub fn agreement_bonus(
    automated: Option<f64>,
    user_rating: Option<f64>,
    config: &AgreementBonusConfig,
) -> f64 {
    if !config.enabled {
        return 0.0;
    }
    let (Some(auto), Some(rating)) = (automated, user_rating) else {
        return 0.0;
    };
    let gap = (auto - rating).abs();
    let ramp = (1.0 - gap / config.tolerance).max(0.0);
    (config.max_bonus * ramp).clamp(0.0, config.max_bonus)
}

/// Score composer bound to a scoring configuration.
#[derive(Debug, Clone, Default)]
pub struct ScoreComposer {
    config: ScoringConfig,
}

impl ScoreComposer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Expertise multiplier under the configured range
    pub fn multiplier(&self, expertise_weight: f64) -> f64 {
        multiplier_in_range(
            expertise_weight,
            self.config.min_multiplier,
            self.config.max_multiplier,
        )
    }

    /// Final score for one component, bonus included, always within [0, 1]
    pub fn compose(
        &self,
        automated: Option<f64>,
        user_rating: Option<f64>,
        expertise_weight: f64,
    ) -> Option<f64> {
        let base = blend(
            automated,
            user_rating,
            self.multiplier(expertise_weight),
            self.config.automated_weight,
            self.config.human_weight,
        )?;
        let bonus = agreement_bonus(automated, user_rating, &self.config.agreement_bonus);
        Some((base + bonus).min(1.0))
    }
}
