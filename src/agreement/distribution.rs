//! Rating distribution and cross-paper consistency.

use super::kappa::{bin_label, score_bin, BIN_COUNT};
use crate::core::stats::{mean, median, population_variance, shape_moments, std_dev};
use crate::core::Component;
use crate::extraction::{ScoreMatrix, ScoreSelector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionBin {
    pub range: String,
    pub count: usize,
    /// Share of all scores, 0-100
    pub percentage: f64,
}

/// Descriptive statistics over a score population; all `None` when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
    pub skewness: Option<f64>,
    /// Excess kurtosis
    pub kurtosis: Option<f64>,
}

impl DistributionStats {
    pub fn from_scores(scores: &[f64]) -> Self {
        let moments = shape_moments(scores);
        Self {
            count: scores.len(),
            mean: mean(scores),
            variance: population_variance(scores),
            std_dev: std_dev(scores),
            min: scores.iter().copied().reduce(f64::min),
            max: scores.iter().copied().reduce(f64::max),
            median: median(scores),
            skewness: moments.map(|(skew, _)| skew),
            kurtosis: moments.map(|(_, kurt)| kurt),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingDistribution {
    pub bins: Vec<DistributionBin>,
    pub stats: DistributionStats,
}

/// Bin scores into the five kappa categories and describe them.
///
/// The report feeds this the latest overall score of each evaluator on each
/// paper, so a superseded re-evaluation is not counted.
pub fn rating_distribution(scores: &[f64]) -> RatingDistribution {
    let mut counts = [0usize; BIN_COUNT];
    for &score in scores {
        counts[score_bin(score)] += 1;
    }
    let total = scores.len();
    let bins = counts
        .iter()
        .enumerate()
        .map(|(bin, &count)| DistributionBin {
            range: bin_label(bin),
            count,
            percentage: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            },
        })
        .collect();

    RatingDistribution {
        bins,
        stats: DistributionStats::from_scores(scores),
    }
}

/// Corpus consistency band by coefficient of variation (percent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsistencyLevel {
    High,
    Moderate,
    Low,
    #[serde(rename = "Very Low")]
    VeryLow,
}

impl ConsistencyLevel {
    pub fn from_cv(cv: f64) -> Self {
        if cv < 15.0 {
            ConsistencyLevel::High
        } else if cv < 25.0 {
            ConsistencyLevel::Moderate
        } else if cv < 35.0 {
            ConsistencyLevel::Low
        } else {
            ConsistencyLevel::VeryLow
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConsistencyLevel::High => "High",
            ConsistencyLevel::Moderate => "Moderate",
            ConsistencyLevel::Low => "Low",
            ConsistencyLevel::VeryLow => "Very Low",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `std / mean * 100`; undefined for fewer than two values or a zero mean.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mu = mean(values)?;
    if mu.abs() < f64::EPSILON {
        return None;
    }
    Some(std_dev(values)? / mu * 100.0)
}

/// Spread of per-paper mean scores across the corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossPaperConsistency {
    pub papers: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub coefficient_of_variation: Option<f64>,
    pub consistency: Option<ConsistencyLevel>,
    /// Coefficient of variation of per-paper accuracy means per component
    pub by_component: BTreeMap<Component, Option<f64>>,
    pub interpretation: String,
}

fn paper_means(matrix: &ScoreMatrix, selector: ScoreSelector) -> Vec<f64> {
    matrix
        .series(selector)
        .values()
        .filter_map(|row| {
            let scores: Vec<f64> = row.values().copied().collect();
            mean(&scores)
        })
        .collect()
}

pub fn cross_paper_consistency(matrix: &ScoreMatrix) -> CrossPaperConsistency {
    let means = paper_means(matrix, ScoreSelector::Overall);
    let cv = coefficient_of_variation(&means);
    let consistency = cv.map(ConsistencyLevel::from_cv);

    let by_component = Component::ALL
        .iter()
        .map(|&component| {
            let component_means = paper_means(matrix, ScoreSelector::Accuracy(component));
            (component, coefficient_of_variation(&component_means))
        })
        .collect();

    let interpretation = match (cv, consistency) {
        (Some(cv), Some(level)) => format!(
            "{} consistency across {} papers (CV {:.1}%)",
            level,
            means.len(),
            cv
        ),
        _ => format!(
            "Insufficient data: need at least 2 papers with a non-zero mean score (found {})",
            means.len()
        ),
    };

    CrossPaperConsistency {
        papers: means.len(),
        mean: mean(&means),
        std_dev: std_dev(&means),
        coefficient_of_variation: cv,
        consistency,
        by_component,
        interpretation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_bins_and_percentages() {
        let dist = rating_distribution(&[0.1, 0.2, 0.5, 0.8, 1.0]);
        let counts: Vec<usize> = dist.bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 0, 2]);
        assert!((dist.bins[4].percentage - 40.0).abs() < EPS);
        assert_eq!(dist.bins[0].range, "0.0-0.2");
        assert_eq!(dist.stats.count, 5);
        assert_eq!(dist.stats.min, Some(0.1));
        assert_eq!(dist.stats.max, Some(1.0));
        assert_eq!(dist.stats.median, Some(0.5));
    }

    #[test]
    fn test_empty_distribution() {
        let dist = rating_distribution(&[]);
        assert_eq!(dist.stats, DistributionStats::default());
        assert!(dist.bins.iter().all(|b| b.count == 0 && b.percentage == 0.0));
    }

    #[test]
    fn test_point_distribution_has_zero_shape() {
        let stats = DistributionStats::from_scores(&[0.6, 0.6, 0.6]);
        assert_eq!(stats.variance, Some(0.0));
        assert_eq!(stats.skewness, Some(0.0));
        assert_eq!(stats.kurtosis, Some(0.0));
    }

    #[test]
    fn test_symmetric_sample_moments() {
        let stats = DistributionStats::from_scores(&[0.0, 1.0]);
        assert!((stats.skewness.unwrap()).abs() < EPS);
        // Two-point symmetric distribution has kurtosis 1, excess -2
        assert!((stats.kurtosis.unwrap() + 2.0).abs() < EPS);
    }

    #[test]
    fn test_consistency_bands() {
        assert_eq!(ConsistencyLevel::from_cv(14.9), ConsistencyLevel::High);
        assert_eq!(ConsistencyLevel::from_cv(15.0), ConsistencyLevel::Moderate);
        assert_eq!(ConsistencyLevel::from_cv(25.0), ConsistencyLevel::Low);
        assert_eq!(ConsistencyLevel::from_cv(35.0), ConsistencyLevel::VeryLow);
        assert_eq!(
            serde_json::to_value(ConsistencyLevel::VeryLow).unwrap(),
            serde_json::json!("Very Low")
        );
    }

    #[test]
    fn test_coefficient_of_variation() {
        assert_eq!(coefficient_of_variation(&[0.5]), None);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), None);
        // mean 0.5, std 0.1
        assert!((coefficient_of_variation(&[0.4, 0.6]).unwrap() - 20.0).abs() < 1e-6);
    }
}
