//! Fleiss' Kappa over binned continuous scores.
//!
//! Scores are discretized into five ordered bins and papers act as subjects.
//! Papers rated by fewer than two evaluators are excluded; with fewer than two
//! qualifying papers kappa is `None` and the interpretation carries the reason.

use crate::core::{Component, EvaluatorId, PaperId};
use crate::extraction::{ScoreMatrix, ScoreSelector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of score categories
pub const BIN_COUNT: usize = 5;

/// Minimum papers with at least [`MIN_RATERS`] evaluators
pub const MIN_QUALIFYING_PAPERS: usize = 2;

/// Minimum evaluators for a paper to count as a subject
pub const MIN_RATERS: usize = 2;

const DEGENERATE_EXPECTED_AGREEMENT: f64 = 1.0 - 1e-12;

/// Bin of a score: `[0,.2) [.2,.4) [.4,.6) [.6,.8) [.8,1]`.
///
/// Out-of-range values fall into the nearest end bin.
pub fn score_bin(score: f64) -> usize {
    if score < 0.2 {
        0
    } else if score < 0.4 {
        1
    } else if score < 0.6 {
        2
    } else if score < 0.8 {
        3
    } else {
        4
    }
}

/// Label of a bin, e.g. `0.2-0.4`
pub fn bin_label(bin: usize) -> String {
    let lower = bin as f64 * 0.2;
    format!("{:.1}-{:.1}", lower, lower + 0.2)
}

/// Category counts of one subject
pub fn bin_counts(scores: &[f64]) -> [usize; BIN_COUNT] {
    scores.iter().fold([0; BIN_COUNT], |mut counts, &score| {
        counts[score_bin(score)] += 1;
        counts
    })
}

/// Qualitative band of a kappa value (Landis and Koch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KappaInterpretation {
    Poor,
    Slight,
    Fair,
    Moderate,
    Substantial,
    #[serde(rename = "Almost Perfect")]
    AlmostPerfect,
}

impl KappaInterpretation {
    pub fn from_kappa(kappa: f64) -> Self {
        match kappa {
            k if k < 0.0 => KappaInterpretation::Poor,
            k if k < 0.2 => KappaInterpretation::Slight,
            k if k < 0.4 => KappaInterpretation::Fair,
            k if k < 0.6 => KappaInterpretation::Moderate,
            k if k < 0.8 => KappaInterpretation::Substantial,
            _ => KappaInterpretation::AlmostPerfect,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            KappaInterpretation::Poor => "Poor",
            KappaInterpretation::Slight => "Slight",
            KappaInterpretation::Fair => "Fair",
            KappaInterpretation::Moderate => "Moderate",
            KappaInterpretation::Substantial => "Substantial",
            KappaInterpretation::AlmostPerfect => "Almost Perfect",
        }
    }
}

impl fmt::Display for KappaInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fleiss' Kappa result.
///
/// `kappa`, `p_bar` and `p_e` are `None` together when the sample is too
/// small; `interpretation` then holds the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleissKappa {
    pub kappa: Option<f64>,
    pub interpretation: String,
    #[serde(rename = "P_bar")]
    pub p_bar: Option<f64>,
    #[serde(rename = "P_e")]
    pub p_e: Option<f64>,
    /// Qualifying papers
    pub n: usize,
    /// Minimum evaluators per qualifying paper
    pub k: Option<usize>,
    /// Marginal proportion of each bin
    pub category_proportions: Vec<f64>,
}

impl FleissKappa {
    fn insufficient(found: usize) -> Self {
        Self {
            kappa: None,
            interpretation: format!(
                "Insufficient data: need at least {MIN_QUALIFYING_PAPERS} papers with {MIN_RATERS} or more evaluators (found {found})"
            ),
            p_bar: None,
            p_e: None,
            n: found,
            k: None,
            category_proportions: Vec::new(),
        }
    }

    pub fn is_computed(&self) -> bool {
        self.kappa.is_some()
    }
}

/// Fleiss' Kappa from per-subject category counts.
pub fn fleiss_kappa_from_counts(subjects: &[[usize; BIN_COUNT]]) -> FleissKappa {
    let qualifying: Vec<(&[usize; BIN_COUNT], usize)> = subjects
        .iter()
        .map(|counts| (counts, counts.iter().sum::<usize>()))
        .filter(|(_, raters)| *raters >= MIN_RATERS)
        .collect();

    if qualifying.len() < MIN_QUALIFYING_PAPERS {
        return FleissKappa::insufficient(qualifying.len());
    }

    let k = qualifying
        .iter()
        .map(|(_, raters)| *raters)
        .min()
        .unwrap_or(0);
    if k < MIN_RATERS {
        return FleissKappa::insufficient(qualifying.len());
    }

    let subject_agreement = |counts: &[usize; BIN_COUNT], raters: usize| -> f64 {
        let agreeing: usize = counts.iter().map(|&c| c * c.saturating_sub(1)).sum();
        agreeing as f64 / (raters * (raters - 1)) as f64
    };

    let n = qualifying.len();
    let p_bar = qualifying
        .iter()
        .map(|(counts, raters)| subject_agreement(counts, *raters))
        .sum::<f64>()
        / n as f64;

    let total_ratings: usize = qualifying.iter().map(|(_, raters)| raters).sum();
    let proportions: Vec<f64> = (0..BIN_COUNT)
        .map(|bin| {
            let in_bin: usize = qualifying.iter().map(|(counts, _)| counts[bin]).sum();
            in_bin as f64 / total_ratings as f64
        })
        .collect();
    let p_e: f64 = proportions.iter().map(|p| p * p).sum();

    let kappa = if p_e >= DEGENERATE_EXPECTED_AGREEMENT {
        // Every rating fell into one category
        1.0
    } else {
        ((p_bar - p_e) / (1.0 - p_e)).clamp(-1.0, 1.0)
    };

    FleissKappa {
        kappa: Some(kappa),
        interpretation: KappaInterpretation::from_kappa(kappa).label().to_string(),
        p_bar: Some(p_bar),
        p_e: Some(p_e),
        n,
        k: Some(k),
        category_proportions: proportions,
    }
}

/// Fleiss' Kappa over per-paper score lists.
pub fn fleiss_kappa(papers: &[Vec<f64>]) -> FleissKappa {
    let counts: Vec<[usize; BIN_COUNT]> = papers
        .iter()
        .map(|scores| {
            let finite: Vec<f64> = scores.iter().copied().filter(|s| s.is_finite()).collect();
            bin_counts(&finite)
        })
        .collect();
    fleiss_kappa_from_counts(&counts)
}

fn series_scores(series: &BTreeMap<PaperId, BTreeMap<EvaluatorId, f64>>) -> Vec<Vec<f64>> {
    series
        .values()
        .map(|row| row.values().copied().collect())
        .collect()
}

/// Kappa over the selected score of every paper in the matrix
pub fn kappa_for(matrix: &ScoreMatrix, selector: ScoreSelector) -> FleissKappa {
    fleiss_kappa(&series_scores(&matrix.series(selector)))
}

/// Overall-score kappa
pub fn overall_kappa(matrix: &ScoreMatrix) -> FleissKappa {
    kappa_for(matrix, ScoreSelector::Overall)
}

/// Kappa per component over its accuracy scores.
///
/// Each component is evaluated independently; one with too few qualifying
/// papers reports `None` without affecting the others.
pub fn component_kappa(matrix: &ScoreMatrix) -> BTreeMap<Component, FleissKappa> {
    Component::ALL
        .iter()
        .map(|&component| {
            let result = kappa_for(matrix, ScoreSelector::Accuracy(component));
            tracing::debug!(
                "Component kappa {}: {:?} over {} papers",
                component,
                result.kappa,
                result.n
            );
            (component, result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_bin_boundaries_are_half_open() {
        assert_eq!(score_bin(0.0), 0);
        assert_eq!(score_bin(0.19999), 0);
        assert_eq!(score_bin(0.2), 1);
        assert_eq!(score_bin(0.4), 2);
        assert_eq!(score_bin(0.6), 3);
        assert_eq!(score_bin(0.79999), 3);
        assert_eq!(score_bin(0.8), 4);
        assert_eq!(score_bin(1.0), 4);
        assert_eq!(score_bin(1.3), 4);
        assert_eq!(score_bin(-0.1), 0);
    }

    #[test]
    fn test_bin_labels() {
        assert_eq!(bin_label(0), "0.0-0.2");
        assert_eq!(bin_label(4), "0.8-1.0");
    }

    #[test]
    fn test_unanimous_top_bin_is_perfect_agreement() {
        let papers = vec![vec![0.9, 0.85, 1.0], vec![0.8, 0.95, 0.9]];
        let result = fleiss_kappa(&papers);
        assert_eq!(result.kappa, Some(1.0));
        assert_eq!(result.p_bar, Some(1.0));
        assert_eq!(result.p_e, Some(1.0));
        assert_eq!(result.n, 2);
        assert_eq!(result.k, Some(3));
        assert_eq!(result.interpretation, "Almost Perfect");
    }

    #[test]
    fn test_reference_table() {
        // Classic 10 subjects x 14 raters example, kappa ~ 0.210
        let subjects = [
            [0, 0, 0, 0, 14],
            [0, 2, 6, 4, 2],
            [0, 0, 3, 5, 6],
            [0, 3, 9, 2, 0],
            [2, 2, 8, 1, 1],
            [7, 7, 0, 0, 0],
            [3, 2, 6, 3, 0],
            [2, 5, 3, 2, 2],
            [6, 5, 2, 1, 0],
            [0, 2, 2, 3, 7],
        ];
        let result = fleiss_kappa_from_counts(&subjects);
        assert!((result.p_bar.unwrap() - 0.378).abs() < 1e-3);
        assert!((result.p_e.unwrap() - 0.213).abs() < 1e-3);
        assert!((result.kappa.unwrap() - 0.210).abs() < 1e-3);
        assert_eq!(result.interpretation, "Fair");
    }

    #[test]
    fn test_single_rater_papers_do_not_qualify() {
        let papers = vec![vec![0.5], vec![0.1, 0.9], vec![0.3]];
        let result = fleiss_kappa(&papers);
        assert_eq!(result.kappa, None);
        assert_eq!(result.n, 1);
        assert_eq!(
            result.interpretation,
            "Insufficient data: need at least 2 papers with 2 or more evaluators (found 1)"
        );
    }

    #[test]
    fn test_variable_rater_counts_report_minimum_k() {
        let papers = vec![vec![0.1, 0.1], vec![0.5, 0.5, 0.9, 0.1]];
        let result = fleiss_kappa(&papers);
        assert_eq!(result.k, Some(2));
        assert!(result.kappa.is_some());
    }

    #[test]
    fn test_systematic_disagreement_is_negative() {
        let papers = vec![vec![0.1, 0.9], vec![0.1, 0.9], vec![0.1, 0.9]];
        let result = fleiss_kappa(&papers);
        // P_bar = 0, P_e = 0.5
        assert!((result.kappa.unwrap() + 1.0).abs() < EPS);
        assert_eq!(result.interpretation, "Poor");
    }

    #[test]
    fn test_uniform_random_bins_give_kappa_near_zero() {
        // Fixed-seed LCG, 2000 papers x 4 raters spread evenly over the five bins
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        let papers: Vec<Vec<f64>> = (0..2000)
            .map(|_| {
                (0..4)
                    .map(|_| {
                        state = state
                            .wrapping_mul(6364136223846793005)
                            .wrapping_add(1442695040888963407);
                        ((state >> 33) % 5) as f64 * 0.2 + 0.1
                    })
                    .collect()
            })
            .collect();

        let result = fleiss_kappa(&papers);
        assert_eq!(result.n, 2000);
        assert_eq!(result.k, Some(4));
        assert!(result.kappa.unwrap().abs() < 0.02, "kappa = {:?}", result.kappa);
        assert!((result.p_e.unwrap() - 0.2).abs() < 0.01);
        for proportion in &result.category_proportions {
            assert!((proportion - 0.2).abs() < 0.02);
        }
    }

    #[test]
    fn test_interpretation_bands() {
        assert_eq!(KappaInterpretation::from_kappa(-0.01), KappaInterpretation::Poor);
        assert_eq!(KappaInterpretation::from_kappa(0.0), KappaInterpretation::Slight);
        assert_eq!(KappaInterpretation::from_kappa(0.2), KappaInterpretation::Fair);
        assert_eq!(KappaInterpretation::from_kappa(0.4), KappaInterpretation::Moderate);
        assert_eq!(KappaInterpretation::from_kappa(0.6), KappaInterpretation::Substantial);
        assert_eq!(KappaInterpretation::from_kappa(0.8), KappaInterpretation::AlmostPerfect);
        assert_eq!(KappaInterpretation::from_kappa(1.0), KappaInterpretation::AlmostPerfect);
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(fleiss_kappa(&[vec![0.1, 0.1], vec![0.3, 0.3]])).unwrap();
        assert!(value.get("P_bar").is_some());
        assert!(value.get("P_e").is_some());
        assert!(value.get("categoryProportions").is_some());
    }

    proptest! {
        #[test]
        fn prop_kappa_bounded(
            papers in prop::collection::vec(prop::collection::vec(0.0f64..=1.0, 0..6), 0..12)
        ) {
            let result = fleiss_kappa(&papers);
            if let Some(kappa) = result.kappa {
                prop_assert!((-1.0..=1.0).contains(&kappa));
                let p_e = result.p_e.unwrap();
                prop_assert!(p_e > 0.0 && p_e <= 1.0 + EPS);
                let p_bar = result.p_bar.unwrap();
                prop_assert!((0.0..=1.0).contains(&p_bar));
            } else {
                prop_assert!(result.n < MIN_QUALIFYING_PAPERS);
            }
        }
    }
}
