//! End-to-end agreement analysis over JSON exports.

mod common;

use common::{orkg_eval, overall_eval, sequential_config, session, synthetic_export};
use evalmap::agreement::{AnalysisMode, ConsensusLevel, ExpertiseTier};
use evalmap::config::EvalmapConfig;
use evalmap::core::{EvaluatorId, PaperId};
use evalmap::report::analyze_json;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const EPS: f64 = 1e-9;

fn approx(actual: Option<f64>, expected: f64) {
    let actual = actual.unwrap_or_else(|| panic!("expected {expected}, got None"));
    assert!(
        (actual - expected).abs() < EPS,
        "expected {expected}, got {actual}"
    );
}

fn unanimous_export() -> Value {
    json!([
        session("10.1/a", vec![
            overall_eval("ada", 5.0, 0.85),
            overall_eval("bo", 1.0, 0.9),
            overall_eval("cy", 3.0, 0.95),
        ]),
        session("10.1/b", vec![
            overall_eval("ada", 5.0, 0.9),
            overall_eval("bo", 1.0, 0.95),
            overall_eval("cy", 3.0, 1.0),
        ]),
        session("10.1/c", vec![overall_eval("ada", 5.0, 0.2)]),
    ])
}

#[test]
fn test_unanimous_bin_yields_perfect_kappa() {
    let metrics = analyze_json(&unanimous_export(), &sequential_config()).unwrap();

    assert_eq!(metrics.analysis_mode, AnalysisMode::InterRater);
    assert_eq!(metrics.fleiss_kappa.kappa, Some(1.0));
    assert_eq!(metrics.fleiss_kappa.p_bar, Some(1.0));
    assert_eq!(metrics.fleiss_kappa.n, 2);
    assert_eq!(metrics.fleiss_kappa.k, Some(3));
    assert_eq!(metrics.fleiss_kappa.interpretation, "Almost Perfect");
}

#[test]
fn test_single_evaluator_paper_is_counted_but_excluded() {
    let metrics = analyze_json(&unanimous_export(), &sequential_config()).unwrap();
    let stats = &metrics.overall_stats;

    assert_eq!(stats.total_papers, 3);
    assert_eq!(stats.unique_papers, 3);
    assert_eq!(stats.papers_with_multiple_evaluators, 2);
    assert_eq!(stats.single_evaluator_papers, 1);
    assert_eq!(stats.total_evaluations, 7);
    assert_eq!(stats.unique_evaluators, 3);
    assert_eq!(
        metrics.paper_analysis.single_evaluator,
        vec![PaperId::new("10.1/c")]
    );
    assert_eq!(metrics.variance_agreement.papers_analyzed, 2);
    // Both multi-rater papers have variance 0.05^2 * 2/3
    assert_eq!(metrics.variance_agreement.consensus.high, 2);
    assert_eq!(metrics.paper_analysis.high.len(), 2);
}

#[test]
fn test_one_multi_rater_paper_is_cross_paper_mode() {
    let export = json!([
        session("10.1/a", vec![overall_eval("ada", 5.0, 0.9), overall_eval("bo", 2.0, 0.4)]),
        session("10.1/b", vec![overall_eval("ada", 5.0, 0.7)]),
    ]);
    let metrics = analyze_json(&export, &sequential_config()).unwrap();

    assert_eq!(metrics.analysis_mode, AnalysisMode::CrossPaper);
    assert_eq!(metrics.fleiss_kappa.kappa, None);
    assert!(!metrics.fleiss_kappa.is_computed());
    // Variance agreement still reports the one qualifying paper
    assert_eq!(metrics.variance_agreement.papers_analyzed, 1);
    assert_eq!(
        metrics.paper_analysis.bucket(ConsensusLevel::Low).len(),
        1,
        "variance 0.0625 falls in the low band"
    );
}

#[test]
fn test_sessions_merge_across_doi_spellings() {
    let export = json!([
        {
            "doi": "10.5555/Merge",
            "userEvaluations": [
                {
                    "userInfo": { "firstName": "Ada" },
                    "evaluationMetrics": { "overallScore": 0.2 },
                    "timestamp": "2024-01-01T10:00:00Z"
                },
                {
                    "userInfo": { "firstName": "Bo" },
                    "evaluationMetrics": { "overallScore": 0.9 }
                }
            ]
        },
        {
            "doi": "https://doi.org/10.5555/MERGE",
            "userEvaluations": [
                {
                    "userInfo": { "firstName": "Ada" },
                    "evaluationMetrics": { "overallScore": 0.9 },
                    "timestamp": "2024-06-01T10:00:00Z"
                }
            ]
        }
    ]);
    let metrics = analyze_json(&export, &sequential_config()).unwrap();

    assert_eq!(metrics.overall_stats.total_papers, 2);
    assert_eq!(metrics.overall_stats.unique_papers, 1);
    assert_eq!(metrics.overall_stats.total_evaluations, 3);

    // Ada's later re-evaluation replaces the earlier one
    let paper = &metrics.paper_analysis.high[0];
    assert_eq!(paper.paper_id, PaperId::new("10.5555/merge"));
    assert_eq!(paper.evaluator_count, 2);
    approx(Some(paper.variance), 0.0);
}

#[test]
fn test_distribution_counts_latest_score_per_evaluator() {
    let export = json!([
        {
            "doi": "10.5555/Again",
            "userEvaluations": [
                {
                    "userInfo": { "firstName": "Ada" },
                    "evaluationMetrics": { "overallScore": 0.2 },
                    "timestamp": "2024-01-01T10:00:00Z"
                },
                {
                    "userInfo": { "firstName": "Bo" },
                    "evaluationMetrics": { "overallScore": 0.9 }
                }
            ]
        },
        {
            "doi": "doi:10.5555/again",
            "userEvaluations": [
                {
                    "userInfo": { "firstName": "Ada" },
                    "evaluationMetrics": { "overallScore": 0.9 },
                    "timestamp": "2024-06-01T10:00:00Z"
                }
            ]
        }
    ]);
    let metrics = analyze_json(&export, &sequential_config()).unwrap();

    assert_eq!(metrics.overall_stats.total_evaluations, 3);
    let distribution = &metrics.rating_distribution;
    assert_eq!(distribution.stats.count, 2);
    assert_eq!(distribution.bins[1].count, 0);
    assert_eq!(distribution.bins[4].count, 2);
    approx(distribution.stats.mean, 0.9);
    approx(metrics.overall_stats.mean_overall_score, 0.9);
}

#[test]
fn test_cross_tier_and_within_tier_agreement() {
    let export = json!([
        session("10.1/a", vec![
            overall_eval("e1", 5.0, 0.9),
            overall_eval("e2", 4.0, 0.9),
            overall_eval("j1", 1.0, 0.6),
            overall_eval("j2", 1.5, 0.6),
        ]),
        session("10.1/b", vec![
            overall_eval("e1", 5.0, 0.9),
            overall_eval("e2", 4.0, 0.9),
            overall_eval("j1", 1.0, 0.6),
            overall_eval("j2", 1.5, 0.6),
        ]),
    ]);
    let metrics = analyze_json(&export, &sequential_config()).unwrap();
    let expertise = &metrics.expertise_agreement;

    approx(expertise.cross_tier.mean_abs_diff, 0.3);
    approx(expertise.cross_tier.agreement, 0.7);
    assert_eq!(expertise.cross_tier.papers_compared, 2);

    let experts = &expertise.within_tier[&ExpertiseTier::Expert];
    approx(experts.agreement, 1.0);
    assert_eq!(experts.evaluators, 2);
    assert_eq!(experts.qualifying_papers, 2);

    let seniors = &expertise.within_tier[&ExpertiseTier::Senior];
    assert_eq!(seniors.agreement, None);
    assert_eq!(seniors.qualifying_papers, 0);
}

#[test]
fn test_missing_expertise_weight_uses_default() {
    let export = json!([session("10.1/a", vec![
        json!({ "userInfo": { "firstName": "Nemo" }, "evaluationMetrics": { "overallScore": 0.5 } }),
    ])]);
    let config = EvalmapConfig {
        default_expertise_weight: 3.5,
        ..sequential_config()
    };
    let metrics = analyze_json(&export, &config).unwrap();
    let nemo = &metrics.evaluator_consistency[&EvaluatorId::new("nemo")];

    assert_eq!(nemo.expertise_weight, 3.5);
    assert_eq!(nemo.tier, ExpertiseTier::Senior);
}

#[test]
fn test_orkg_groups_treat_never_and_blank_as_inexperienced() {
    let export = json!([
        session("10.1/a", vec![
            orkg_eval("a", "daily", 0.8),
            orkg_eval("b", "Weekly", 0.8),
            orkg_eval("c", "never", 0.2),
            orkg_eval("d", "", 0.6),
        ]),
        session("10.1/b", vec![
            orkg_eval("a", "daily", 0.7),
            orkg_eval("b", "Weekly", 0.7),
            orkg_eval("c", "NEVER", 0.3),
            orkg_eval("d", "", 0.3),
        ]),
    ]);
    let metrics = analyze_json(&export, &sequential_config()).unwrap();
    let orkg = &metrics.orkg_agreement;

    assert_eq!(orkg.with_orkg.evaluators, 2);
    assert_eq!(orkg.without_orkg.evaluators, 2);
    approx(orkg.with_orkg.agreement, 1.0);
    // Paper a: variance 0.04 -> 0.6, paper b: 0 -> 1.0
    approx(orkg.without_orkg.agreement, 0.8);
}

#[test]
fn test_pairwise_matrix_is_symmetric_with_unit_diagonal() {
    let metrics = analyze_json(&synthetic_export(6, 4), &sequential_config()).unwrap();
    let pairwise = &metrics.pairwise_agreement;

    assert_eq!(pairwise.evaluator_ids.len(), 4);
    for a in &pairwise.evaluator_ids {
        assert_eq!(pairwise.get(a, a), Some(1.0));
        for b in &pairwise.evaluator_ids {
            assert_eq!(pairwise.get(a, b), pairwise.get(b, a));
        }
    }
}

#[test]
fn test_parallel_and_sequential_results_match() {
    let export = synthetic_export(25, 5);
    let parallel = EvalmapConfig::default();
    assert!(parallel.parallel);

    let a = analyze_json(&export, &parallel).unwrap();
    let b = analyze_json(&export, &sequential_config()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_repeated_runs_serialize_identically() {
    let export = synthetic_export(12, 3);
    let first = serde_json::to_string(&analyze_json(&export, &sequential_config()).unwrap()).unwrap();
    let second =
        serde_json::to_string(&analyze_json(&export, &sequential_config()).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_report_uses_camel_case_field_names() {
    let metrics = analyze_json(&unanimous_export(), &sequential_config()).unwrap();
    let report = serde_json::to_value(&metrics).unwrap();

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
        assert!(report.get(key).is_some(), "missing {key}");
    }
    assert_eq!(report["analysisMode"], "inter-rater");
}

#[test]
fn test_empty_export_produces_empty_report() {
    let metrics = analyze_json(&json!([]), &sequential_config()).unwrap();

    assert_eq!(metrics.analysis_mode, AnalysisMode::CrossPaper);
    assert_eq!(metrics.overall_stats.total_papers, 0);
    assert_eq!(metrics.overall_stats.average_evaluations_per_paper, None);
    assert_eq!(metrics.overall_stats.mean_overall_score, None);
    assert_eq!(metrics.rating_distribution.stats.count, 0);
    assert!(metrics.pairwise_agreement.evaluator_ids.is_empty());
}
