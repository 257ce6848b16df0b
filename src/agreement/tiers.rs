//! Agreement stratified by evaluator expertise and ORKG experience.

use super::variance::{group_agreement, GroupAgreement, ScoreSeries};
use crate::core::stats::mean;
use crate::core::EvaluatorId;
use crate::extraction::{Corpus, Evaluator};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Expertise bracket by self-reported expertise weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpertiseTier {
    /// Weight >= 4.0
    Expert,
    /// Weight in [3.0, 4.0)
    Senior,
    /// Weight in [2.0, 3.0)
    Intermediate,
    /// Weight below 2.0
    Junior,
}

impl ExpertiseTier {
    pub const ALL: [ExpertiseTier; 4] = [
        ExpertiseTier::Expert,
        ExpertiseTier::Senior,
        ExpertiseTier::Intermediate,
        ExpertiseTier::Junior,
    ];

    /// Classify a weight; non-finite weights count as Junior.
    pub fn from_weight(weight: f64) -> Self {
        if !weight.is_finite() {
            return ExpertiseTier::Junior;
        }
        if weight >= 4.0 {
            ExpertiseTier::Expert
        } else if weight >= 3.0 {
            ExpertiseTier::Senior
        } else if weight >= 2.0 {
            ExpertiseTier::Intermediate
        } else {
            ExpertiseTier::Junior
        }
    }

    pub fn of(evaluator: &Evaluator) -> Self {
        Self::from_weight(evaluator.expertise_weight)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExpertiseTier::Expert => "Expert",
            ExpertiseTier::Senior => "Senior",
            ExpertiseTier::Intermediate => "Intermediate",
            ExpertiseTier::Junior => "Junior",
        }
    }
}

impl fmt::Display for ExpertiseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Expert vs Junior agreement on shared papers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossTierAgreement {
    /// `1 - min(meanAbsDiff, 1)`, `None` without a shared paper
    pub agreement: Option<f64>,
    pub mean_abs_diff: Option<f64>,
    pub papers_compared: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertiseAgreement {
    pub within_tier: BTreeMap<ExpertiseTier, GroupAgreement>,
    pub cross_tier: CrossTierAgreement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrkgAgreement {
    pub with_orkg: GroupAgreement,
    pub without_orkg: GroupAgreement,
}

/// Evaluator ids per tier
pub fn tier_members(corpus: &Corpus) -> BTreeMap<ExpertiseTier, BTreeSet<EvaluatorId>> {
    corpus
        .evaluators
        .values()
        .fold(BTreeMap::new(), |mut tiers, evaluator| {
            tiers
                .entry(ExpertiseTier::of(evaluator))
                .or_insert_with(BTreeSet::new)
                .insert(evaluator.id.clone());
            tiers
        })
}

/// Within-tier agreement for every tier plus Expert vs Junior agreement
pub fn expertise_agreement(corpus: &Corpus, series: &ScoreSeries) -> ExpertiseAgreement {
    let members = tier_members(corpus);
    let empty = BTreeSet::new();

    let within_tier = ExpertiseTier::ALL
        .iter()
        .map(|&tier| {
            let tier_ids = members.get(&tier).unwrap_or(&empty);
            (tier, group_agreement(series, |id| tier_ids.contains(id)))
        })
        .collect();

    let experts = members.get(&ExpertiseTier::Expert).unwrap_or(&empty);
    let juniors = members.get(&ExpertiseTier::Junior).unwrap_or(&empty);

    ExpertiseAgreement {
        within_tier,
        cross_tier: cross_group_agreement(series, experts, juniors),
    }
}

/// Mean absolute difference of two groups' per-paper mean scores.
pub fn cross_group_agreement(
    series: &ScoreSeries,
    left: &BTreeSet<EvaluatorId>,
    right: &BTreeSet<EvaluatorId>,
) -> CrossTierAgreement {
    let group_mean = |row: &BTreeMap<EvaluatorId, f64>, group: &BTreeSet<EvaluatorId>| {
        let scores: Vec<f64> = row
            .iter()
            .filter(|(id, _)| group.contains(*id))
            .map(|(_, score)| *score)
            .collect();
        mean(&scores)
    };

    let diffs: Vec<f64> = series
        .values()
        .filter_map(|row| {
            let l = group_mean(row, left)?;
            let r = group_mean(row, right)?;
            Some((l - r).abs())
        })
        .collect();

    let mean_abs_diff = mean(&diffs);
    CrossTierAgreement {
        agreement: mean_abs_diff.map(|d| 1.0 - d.min(1.0)),
        mean_abs_diff,
        papers_compared: diffs.len(),
    }
}

/// Within-group agreement of evaluators with and without ORKG experience
pub fn orkg_agreement(corpus: &Corpus, series: &ScoreSeries) -> OrkgAgreement {
    let (with, without): (Vec<&Evaluator>, Vec<&Evaluator>) = corpus
        .evaluators
        .values()
        .partition(|evaluator| evaluator.has_orkg_experience());
    let ids = |group: Vec<&Evaluator>| -> BTreeSet<EvaluatorId> {
        group.into_iter().map(|evaluator| evaluator.id.clone()).collect()
    };
    let (with, without) = (ids(with), ids(without));

    OrkgAgreement {
        with_orkg: group_agreement(series, |id| with.contains(id)),
        without_orkg: group_agreement(series, |id| without.contains(id)),
    }
}
