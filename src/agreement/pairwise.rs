//! Pairwise evaluator agreement and per-evaluator consistency.

use super::tiers::ExpertiseTier;
use super::variance::{agreement_from_variance, ScoreSeries};
use crate::core::stats::{mean, population_variance, present};
use crate::core::{EvaluatorId, PaperId};
use crate::extraction::Corpus;
use serde::Serialize;
use std::collections::BTreeMap;

/// Agreement of every evaluator with every other.
///
/// Both directions are stored so `matrix[a][b]` always resolves; a cell is
/// `None` when the pair shares no paper and the diagonal is always `1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairwiseAgreement {
    pub matrix: BTreeMap<EvaluatorId, BTreeMap<EvaluatorId, Option<f64>>>,
    pub evaluator_ids: Vec<EvaluatorId>,
}

impl PairwiseAgreement {
    pub fn get(&self, a: &EvaluatorId, b: &EvaluatorId) -> Option<f64> {
        self.matrix.get(a).and_then(|row| row.get(b)).copied().flatten()
    }

    /// Mean agreement of `id` with everybody it shares a paper with
    pub fn agreement_with_others(&self, id: &EvaluatorId) -> Option<f64> {
        let row = self.matrix.get(id)?;
        let values = present(
            row.iter()
                .filter(|(other, _)| *other != id)
                .map(|(_, cell)| *cell),
        );
        mean(&values)
    }
}

/// Scores per evaluator per paper
fn by_evaluator(series: &ScoreSeries) -> BTreeMap<&EvaluatorId, BTreeMap<&PaperId, f64>> {
    let mut transposed: BTreeMap<&EvaluatorId, BTreeMap<&PaperId, f64>> = BTreeMap::new();
    for (paper, row) in series {
        for (evaluator, score) in row {
            transposed.entry(evaluator).or_default().insert(paper, *score);
        }
    }
    transposed
}

/// Mean of `1 - |a - b|` over papers both evaluators scored
fn pair_agreement(a: &BTreeMap<&PaperId, f64>, b: &BTreeMap<&PaperId, f64>) -> Option<f64> {
    let agreements: Vec<f64> = a
        .iter()
        .filter_map(|(paper, score_a)| {
            b.get(paper)
                .map(|score_b| (1.0 - (score_a - score_b).abs()).clamp(0.0, 1.0))
        })
        .collect();
    mean(&agreements)
}

/// Build the pairwise matrix over `evaluators`.
///
/// Evaluators without any score still get a row: `1` on the diagonal and
/// `None` elsewhere.
pub fn pairwise_agreement<I>(series: &ScoreSeries, evaluators: I) -> PairwiseAgreement
where
    I: IntoIterator<Item = EvaluatorId>,
{
    let mut evaluator_ids: Vec<EvaluatorId> = evaluators.into_iter().collect();
    evaluator_ids.sort();
    evaluator_ids.dedup();

    let scores = by_evaluator(series);
    let empty = BTreeMap::new();
    let mut matrix: BTreeMap<EvaluatorId, BTreeMap<EvaluatorId, Option<f64>>> = evaluator_ids
        .iter()
        .map(|id| (id.clone(), BTreeMap::from([(id.clone(), Some(1.0))])))
        .collect();

    for (i, a) in evaluator_ids.iter().enumerate() {
        let a_scores = scores.get(a).unwrap_or(&empty);
        for b in &evaluator_ids[i + 1..] {
            let b_scores = scores.get(b).unwrap_or(&empty);
            let cell = pair_agreement(a_scores, b_scores);
            if let Some(row) = matrix.get_mut(a) {
                row.insert(b.clone(), cell);
            }
            if let Some(row) = matrix.get_mut(b) {
                row.insert(a.clone(), cell);
            }
        }
    }

    PairwiseAgreement {
        matrix,
        evaluator_ids,
    }
}

/// Self-consistency of one evaluator and their agreement with others.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorConsistency {
    pub name: String,
    pub expertise_weight: f64,
    pub tier: ExpertiseTier,
    pub has_orkg_experience: bool,
    pub papers_evaluated: usize,
    pub evaluation_count: usize,
    pub mean_score: Option<f64>,
    pub variance: Option<f64>,
    /// `1 - min(variance * 10, 1)` over the evaluator's own scores
    pub self_consistency: Option<f64>,
    pub agreement_with_others: Option<f64>,
}

pub fn evaluator_consistency(
    corpus: &Corpus,
    pairwise: &PairwiseAgreement,
) -> BTreeMap<EvaluatorId, EvaluatorConsistency> {
    corpus
        .evaluators
        .values()
        .map(|evaluator| {
            let history = &evaluator.score_history;
            let variance = if history.len() >= 2 {
                population_variance(history)
            } else {
                None
            };
            let consistency = EvaluatorConsistency {
                name: evaluator.name.clone(),
                expertise_weight: evaluator.expertise_weight,
                tier: ExpertiseTier::of(evaluator),
                has_orkg_experience: evaluator.has_orkg_experience(),
                papers_evaluated: evaluator.papers.len(),
                evaluation_count: history.len(),
                mean_score: mean(history),
                variance,
                self_consistency: variance.map(agreement_from_variance),
                agreement_with_others: pairwise.agreement_with_others(&evaluator.id),
            };
            (evaluator.id.clone(), consistency)
        })
        .collect()
}
