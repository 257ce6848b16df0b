//! Variance-based agreement.
//!
//! A deliberately simple proxy: the population variance of the evaluators'
//! scores on a paper, mapped to `1 - min(variance * 10, 1)`. Used next to
//! kappa and as the main signal when too few papers have multiple raters.

use super::kappa::MIN_QUALIFYING_PAPERS;
use crate::core::stats::{mean, population_variance};
use crate::core::{Component, EvaluatorId, PaperId};
use crate::extraction::{ScoreMatrix, ScoreSelector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Variance at which agreement reaches 0
const VARIANCE_SCALE: f64 = 10.0;

/// Scores per paper per evaluator
pub type ScoreSeries = BTreeMap<PaperId, BTreeMap<EvaluatorId, f64>>;

/// Map a variance to an agreement scalar in [0, 1].
pub fn agreement_from_variance(variance: f64) -> f64 {
    1.0 - (variance.max(0.0) * VARIANCE_SCALE).min(1.0)
}

/// Consensus band of one paper by score variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConsensusLevel {
    High,
    Medium,
    Low,
    Disagreement,
}

impl ConsensusLevel {
    pub const ALL: [ConsensusLevel; 4] = [
        ConsensusLevel::High,
        ConsensusLevel::Medium,
        ConsensusLevel::Low,
        ConsensusLevel::Disagreement,
    ];

    pub fn from_variance(variance: f64) -> Self {
        if variance < 0.01 {
            ConsensusLevel::High
        } else if variance < 0.05 {
            ConsensusLevel::Medium
        } else if variance < 0.1 {
            ConsensusLevel::Low
        } else {
            ConsensusLevel::Disagreement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConsensusLevel::High => "High",
            ConsensusLevel::Medium => "Medium",
            ConsensusLevel::Low => "Low",
            ConsensusLevel::Disagreement => "Disagreement",
        }
    }
}

impl fmt::Display for ConsensusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether enough papers have multiple raters for inter-rater statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisMode {
    #[serde(rename = "inter-rater")]
    InterRater,
    #[serde(rename = "cross-paper")]
    CrossPaper,
}

impl AnalysisMode {
    pub fn from_qualifying_papers(count: usize) -> Self {
        if count >= MIN_QUALIFYING_PAPERS {
            AnalysisMode::InterRater
        } else {
            AnalysisMode::CrossPaper
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::InterRater => f.write_str("inter-rater"),
            AnalysisMode::CrossPaper => f.write_str("cross-paper"),
        }
    }
}

/// Variance statistics of one paper with at least two scores
#[derive(Debug, Clone, PartialEq)]
pub struct PaperVariance {
    pub paper_id: PaperId,
    pub evaluator_count: usize,
    pub mean: f64,
    pub variance: f64,
    pub agreement: f64,
    pub consensus: ConsensusLevel,
}

fn paper_variance(paper_id: &PaperId, scores: &[f64]) -> Option<PaperVariance> {
    if scores.len() < 2 {
        return None;
    }
    let mu = mean(scores)?;
    let variance = population_variance(scores)?;
    Some(PaperVariance {
        paper_id: paper_id.clone(),
        evaluator_count: scores.len(),
        mean: mu,
        variance,
        agreement: agreement_from_variance(variance),
        consensus: ConsensusLevel::from_variance(variance),
    })
}

/// Variance of every paper with at least two scores, in paper order
pub fn paper_variances(series: &ScoreSeries) -> Vec<PaperVariance> {
    series
        .iter()
        .filter_map(|(paper, row)| {
            let scores: Vec<f64> = row.values().copied().collect();
            paper_variance(paper, &scores)
        })
        .collect()
}

/// Number of papers in each consensus band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub disagreement: usize,
}

impl ConsensusCounts {
    pub fn from_papers(papers: &[PaperVariance]) -> Self {
        papers.iter().fold(Self::default(), |mut counts, paper| {
            match paper.consensus {
                ConsensusLevel::High => counts.high += 1,
                ConsensusLevel::Medium => counts.medium += 1,
                ConsensusLevel::Low => counts.low += 1,
                ConsensusLevel::Disagreement => counts.disagreement += 1,
            }
            counts
        })
    }

    pub fn get(&self, level: ConsensusLevel) -> usize {
        match level {
            ConsensusLevel::High => self.high,
            ConsensusLevel::Medium => self.medium,
            ConsensusLevel::Low => self.low,
            ConsensusLevel::Disagreement => self.disagreement,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low + self.disagreement
    }
}

/// Corpus-level variance agreement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VarianceAgreement {
    /// Mean agreement over papers with at least two scores
    pub overall: Option<f64>,
    pub mean_variance: Option<f64>,
    pub papers_analyzed: usize,
    pub by_component: BTreeMap<Component, Option<f64>>,
    pub consensus: ConsensusCounts,
}

/// Agreement of a group of evaluators restricted to their own scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAgreement {
    /// `None` when fewer than two papers were scored by two group members
    pub agreement: Option<f64>,
    pub mean_variance: Option<f64>,
    pub evaluators: usize,
    pub qualifying_papers: usize,
}

/// Mean agreement over a set of per-paper variances
fn mean_agreement(papers: &[PaperVariance]) -> Option<f64> {
    let agreements: Vec<f64> = papers.iter().map(|p| p.agreement).collect();
    mean(&agreements)
}

fn mean_variance(papers: &[PaperVariance]) -> Option<f64> {
    let variances: Vec<f64> = papers.iter().map(|p| p.variance).collect();
    mean(&variances)
}

/// Variance agreement over overall scores plus a per-component map
pub fn variance_agreement(matrix: &ScoreMatrix) -> VarianceAgreement {
    let papers = paper_variances(&matrix.series(ScoreSelector::Overall));

    let by_component = Component::ALL
        .iter()
        .map(|&component| {
            let component_papers =
                paper_variances(&matrix.series(ScoreSelector::Accuracy(component)));
            (component, mean_agreement(&component_papers))
        })
        .collect();

    VarianceAgreement {
        overall: mean_agreement(&papers),
        mean_variance: mean_variance(&papers),
        papers_analyzed: papers.len(),
        by_component,
        consensus: ConsensusCounts::from_papers(&papers),
    }
}

/// Within-group agreement: only scores by members count.
///
/// A paper qualifies when at least two members scored it; the group needs at
/// least two qualifying papers.
pub fn group_agreement<F>(series: &ScoreSeries, is_member: F) -> GroupAgreement
where
    F: Fn(&EvaluatorId) -> bool,
{
    let restricted: ScoreSeries = series
        .iter()
        .map(|(paper, row)| {
            let members = row
                .iter()
                .filter(|(evaluator, _)| is_member(evaluator))
                .map(|(evaluator, score)| (evaluator.clone(), *score))
                .collect();
            (paper.clone(), members)
        })
        .collect();

    let evaluators = restricted
        .values()
        .flat_map(|row| row.keys())
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    let papers = paper_variances(&restricted);

    let agreement = if papers.len() >= MIN_QUALIFYING_PAPERS {
        mean_agreement(&papers)
    } else {
        None
    };

    GroupAgreement {
        agreement,
        mean_variance: agreement.and(mean_variance(&papers)),
        evaluators,
        qualifying_papers: papers.len(),
    }
}
