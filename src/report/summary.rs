//! The aggregate result object and the engine entry points.
//!
//! [`analyze`] never fails: every statistic that lacks data is `None` with a
//! reason. Only [`analyze_json`] can return an error, for input whose shape
//! violates the caller contract.

use crate::agreement::{
    component_kappa, cross_paper_consistency, evaluator_consistency, expertise_agreement,
    orkg_agreement, overall_kappa, pairwise_agreement, rating_distribution, variance_agreement,
    AnalysisMode, ConsensusLevel, CrossPaperConsistency, EvaluatorConsistency, ExpertiseAgreement,
    ExpertiseTier, FleissKappa, OrkgAgreement, PairwiseAgreement, RatingDistribution,
    VarianceAgreement,
};
use crate::agreement::variance::paper_variances;
use crate::config::EvalmapConfig;
use crate::core::stats::mean;
use crate::core::{Component, ComponentScore, EvaluatorId, PaperId, PaperRecord};
use crate::errors::Result;
use crate::extraction::{parse_papers, Corpus, ScoreSelector};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Paper-level counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    /// Input session records
    pub total_papers: usize,
    /// Papers after merging sessions by normalized DOI
    pub unique_papers: usize,
    pub papers_with_multiple_evaluators: usize,
    pub single_evaluator_papers: usize,
    pub total_evaluations: usize,
    pub unique_evaluators: usize,
    pub average_evaluations_per_paper: Option<f64>,
    pub mean_overall_score: Option<f64>,
}

/// One evaluator's scores on one paper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorScoreDetail {
    pub evaluator_id: EvaluatorId,
    pub name: String,
    pub expertise_weight: f64,
    pub tier: ExpertiseTier,
    pub overall: Option<f64>,
    pub components: BTreeMap<Component, ComponentScore>,
}

/// Agreement detail of one multi-rater paper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperAgreement {
    pub paper_id: PaperId,
    pub doi: Option<String>,
    pub evaluator_count: usize,
    pub mean: f64,
    pub variance: f64,
    pub agreement: f64,
    pub consensus: ConsensusLevel,
    pub evaluators: Vec<EvaluatorScoreDetail>,
}

/// Papers bucketed by consensus level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperAnalysis {
    pub high: Vec<PaperAgreement>,
    pub medium: Vec<PaperAgreement>,
    pub low: Vec<PaperAgreement>,
    pub disagreement: Vec<PaperAgreement>,
    /// Papers with fewer than two scored evaluators
    pub single_evaluator: Vec<PaperId>,
}

impl PaperAnalysis {
    pub fn bucket(&self, level: ConsensusLevel) -> &[PaperAgreement] {
        match level {
            ConsensusLevel::High => &self.high,
            ConsensusLevel::Medium => &self.medium,
            ConsensusLevel::Low => &self.low,
            ConsensusLevel::Disagreement => &self.disagreement,
        }
    }

    fn push(&mut self, paper: PaperAgreement) {
        match paper.consensus {
            ConsensusLevel::High => self.high.push(paper),
            ConsensusLevel::Medium => self.medium.push(paper),
            ConsensusLevel::Low => self.low.push(paper),
            ConsensusLevel::Disagreement => self.disagreement.push(paper),
        }
    }
}

/// Everything the presentation layer shows, recomputed on every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementMetrics {
    pub analysis_mode: AnalysisMode,
    pub fleiss_kappa: FleissKappa,
    pub component_kappa: BTreeMap<Component, FleissKappa>,
    pub variance_agreement: VarianceAgreement,
    pub expertise_agreement: ExpertiseAgreement,
    pub orkg_agreement: OrkgAgreement,
    pub paper_analysis: PaperAnalysis,
    pub evaluator_consistency: BTreeMap<EvaluatorId, EvaluatorConsistency>,
    pub pairwise_agreement: PairwiseAgreement,
    pub rating_distribution: RatingDistribution,
    pub cross_paper_consistency: CrossPaperConsistency,
    pub overall_stats: OverallStats,
}

/// Validate raw JSON input and analyze it.
pub fn analyze_json(input: &Value, config: &EvalmapConfig) -> Result<AgreementMetrics> {
    let papers = parse_papers(input)?;
    Ok(analyze(&papers, config))
}

/// Analyze a set of paper records.
pub fn analyze(papers: &[PaperRecord], config: &EvalmapConfig) -> AgreementMetrics {
    let span = tracing::info_span!("analyze", sessions = papers.len());
    let _enter = span.enter();

    let corpus = {
        let _span = tracing::info_span!("normalize").entered();
        Corpus::build(papers, config)
    };
    analyze_corpus(&corpus, config)
}

/// Run every analysis over an already built corpus.
pub fn analyze_corpus(corpus: &Corpus, config: &EvalmapConfig) -> AgreementMetrics {
    let overall = corpus.matrix.series(ScoreSelector::Overall);

    let kappa_phase = || {
        let _span = tracing::info_span!("kappa").entered();
        (overall_kappa(&corpus.matrix), component_kappa(&corpus.matrix))
    };
    let variance_phase = || {
        let _span = tracing::info_span!("variance").entered();
        (variance_agreement(&corpus.matrix), paper_analysis(corpus))
    };
    let tier_phase = || {
        let _span = tracing::info_span!("tiers").entered();
        (
            expertise_agreement(corpus, &overall),
            orkg_agreement(corpus, &overall),
        )
    };
    let pairwise_phase = || {
        let _span = tracing::info_span!("pairwise").entered();
        let pairwise = pairwise_agreement(&overall, corpus.evaluators.keys().cloned());
        let consistency = evaluator_consistency(corpus, &pairwise);
        (pairwise, consistency)
    };
    let distribution_phase = || {
        let _span = tracing::info_span!("distribution").entered();
        let scores: Vec<f64> = overall.values().flat_map(|row| row.values().copied()).collect();
        (
            rating_distribution(&scores),
            cross_paper_consistency(&corpus.matrix),
        )
    };

    let (
        ((fleiss_kappa, component_kappa), (variance_agreement, paper_analysis)),
        ((expertise_agreement, orkg_agreement), (pairwise, consistency), (distribution, cross_paper)),
    ) = if config.parallel {
        rayon::join(
            || rayon::join(kappa_phase, variance_phase),
            || {
                let ((tiers, pairs), dist) =
                    rayon::join(|| rayon::join(tier_phase, pairwise_phase), distribution_phase);
                (tiers, pairs, dist)
            },
        )
    } else {
        (
            (kappa_phase(), variance_phase()),
            (tier_phase(), pairwise_phase(), distribution_phase()),
        )
    };

    let analysis_mode = AnalysisMode::from_qualifying_papers(fleiss_kappa.n);
    let overall_stats = overall_stats(corpus, &paper_analysis);

    tracing::info!(
        "Analyzed {} unique papers ({} sessions), mode {}, kappa {:?}",
        overall_stats.unique_papers,
        overall_stats.total_papers,
        analysis_mode,
        fleiss_kappa.kappa
    );

    AgreementMetrics {
        analysis_mode,
        fleiss_kappa,
        component_kappa,
        variance_agreement,
        expertise_agreement,
        orkg_agreement,
        paper_analysis,
        evaluator_consistency: consistency,
        pairwise_agreement: pairwise,
        rating_distribution: distribution,
        cross_paper_consistency: cross_paper,
        overall_stats,
    }
}

/// Bucket every multi-rater paper by consensus level with per-evaluator detail
pub fn paper_analysis(corpus: &Corpus) -> PaperAnalysis {
    let overall = corpus.matrix.series(ScoreSelector::Overall);
    let variances = paper_variances(&overall);
    let mut analysis = PaperAnalysis::default();

    for variance in variances {
        let evaluators = corpus
            .matrix
            .row(&variance.paper_id)
            .map(|row| {
                row.values()
                    .map(|evaluation| {
                        let profile = corpus.evaluator(&evaluation.evaluator_id);
                        let weight = profile.map_or(0.0, |e| e.expertise_weight);
                        EvaluatorScoreDetail {
                            evaluator_id: evaluation.evaluator_id.clone(),
                            name: profile.map(|e| e.name.clone()).unwrap_or_default(),
                            expertise_weight: weight,
                            tier: ExpertiseTier::from_weight(weight),
                            overall: evaluation.scores.overall,
                            components: evaluation.scores.components.clone(),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        analysis.push(PaperAgreement {
            doi: corpus
                .papers
                .get(&variance.paper_id)
                .and_then(|paper| paper.doi.clone()),
            paper_id: variance.paper_id,
            evaluator_count: variance.evaluator_count,
            mean: variance.mean,
            variance: variance.variance,
            agreement: variance.agreement,
            consensus: variance.consensus,
            evaluators,
        });
    }

    analysis.single_evaluator = corpus
        .papers
        .keys()
        .filter(|id| overall.get(*id).map_or(true, |row| row.len() < 2))
        .cloned()
        .collect();

    analysis
}

fn overall_stats(corpus: &Corpus, paper_analysis: &PaperAnalysis) -> OverallStats {
    let unique_papers = corpus.papers.len();
    let total_evaluations = corpus.evaluation_count();
    let multi: usize = ConsensusLevel::ALL
        .iter()
        .map(|&level| paper_analysis.bucket(level).len())
        .sum();
    let overall_scores: Vec<f64> = corpus
        .matrix
        .series(ScoreSelector::Overall)
        .values()
        .flat_map(|row| row.values().copied())
        .collect();

    OverallStats {
        total_papers: corpus.session_count,
        unique_papers,
        papers_with_multiple_evaluators: multi,
        single_evaluator_papers: paper_analysis.single_evaluator.len(),
        total_evaluations,
        unique_evaluators: corpus.evaluators.len(),
        average_evaluations_per_paper: (unique_papers > 0)
            .then(|| total_evaluations as f64 / unique_papers as f64),
        mean_overall_score: mean(&overall_scores),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sequential() -> EvalmapConfig {
        EvalmapConfig {
            parallel: false,
            ..Default::default()
        }
    }

    fn eval(first: &str, weight: f64, score: f64) -> Value {
        json!({
            "userInfo": { "firstName": first, "lastName": "X", "expertiseWeight": weight },
            "evaluationMetrics": { "overallScore": score }
        })
    }

    fn sample() -> Value {
        json!([
            { "doi": "10.1/a", "userEvaluations": [eval("a", 5.0, 0.9), eval("b", 1.0, 0.85), eval("c", 3.0, 0.95)] },
            { "doi": "https://doi.org/10.1/B", "userEvaluations": [eval("a", 5.0, 0.8), eval("b", 1.0, 0.9), eval("c", 3.0, 1.0)] },
            { "doi": "10.1/c", "userEvaluations": [eval("a", 5.0, 0.3)] }
        ])
    }

    #[test]
    fn test_unanimous_top_bin_reports_perfect_kappa() {
        let metrics = analyze_json(&sample(), &sequential()).unwrap();
        assert_eq!(metrics.analysis_mode, AnalysisMode::InterRater);
        assert_eq!(metrics.fleiss_kappa.kappa, Some(1.0));
        assert_eq!(metrics.fleiss_kappa.p_bar, Some(1.0));
        assert_eq!(metrics.fleiss_kappa.n, 2);
    }

    #[test]
    fn test_single_evaluator_paper_counted_but_excluded() {
        let metrics = analyze_json(&sample(), &sequential()).unwrap();
        assert_eq!(metrics.overall_stats.total_papers, 3);
        assert_eq!(metrics.overall_stats.unique_papers, 3);
        assert_eq!(metrics.overall_stats.papers_with_multiple_evaluators, 2);
        assert_eq!(metrics.overall_stats.single_evaluator_papers, 1);
        assert_eq!(metrics.variance_agreement.papers_analyzed, 2);
        assert_eq!(
            metrics.paper_analysis.single_evaluator,
            vec![PaperId::new("10.1/c")]
        );
        assert_eq!(metrics.overall_stats.total_evaluations, 7);
    }

    #[test]
    fn test_paper_analysis_detail() {
        let metrics = analyze_json(&sample(), &sequential()).unwrap();
        let high = &metrics.paper_analysis.high;
        assert_eq!(high.len(), 2);
        assert_eq!(high[0].evaluators.len(), 3);
        assert_eq!(high[0].evaluators[0].tier, ExpertiseTier::Expert);
        assert_eq!(high[0].doi.as_deref(), Some("10.1/a"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential_run = analyze_json(&sample(), &sequential()).unwrap();
        let parallel_run = analyze_json(&sample(), &EvalmapConfig::default()).unwrap();
        assert_eq!(
            serde_json::to_string(&sequential_run).unwrap(),
            serde_json::to_string(&parallel_run).unwrap()
        );
    }

    #[test]
    fn test_empty_input_degrades_gracefully() {
        let metrics = analyze(&[], &sequential());
        assert_eq!(metrics.analysis_mode, AnalysisMode::CrossPaper);
        assert_eq!(metrics.fleiss_kappa.kappa, None);
        assert_eq!(metrics.overall_stats.average_evaluations_per_paper, None);
        assert_eq!(metrics.rating_distribution.stats.mean, None);
        assert!(metrics.pairwise_agreement.evaluator_ids.is_empty());
    }

    #[test]
    fn test_malformed_evaluations_fail_fast() {
        let err = analyze_json(&json!([{ "doi": "x", "userEvaluations": {} }]), &sequential())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_output_field_names() {
        let metrics = analyze_json(&sample(), &sequential()).unwrap();
        let value = serde_json::to_value(&metrics).unwrap();
        for key in [
            "analysisMode",
            "fleissKappa",
            "componentKappa",
            "varianceAgreement",
            "expertiseAgreement",
            "orkgAgreement",
            "paperAnalysis",
            "evaluatorConsistency",
            "pairwiseAgreement",
            "ratingDistribution",
            "crossPaperConsistency",
            "overallStats",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["analysisMode"], json!("inter-rater"));
        assert!(value["expertiseAgreement"]["withinTier"]["expert"].is_object());
        assert!(value["pairwiseAgreement"]["matrix"]["a_x"]["b_x"].is_number());
    }
}
