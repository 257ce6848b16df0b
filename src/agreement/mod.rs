//! Reliability analyses over the normalized score matrix.
//!
//! Every analysis is a pure function of a [`crate::extraction::Corpus`] (or
//! its score series), so they can run in any order or in parallel.

pub mod distribution;
pub mod kappa;
pub mod pairwise;
pub mod tiers;
pub mod variance;

pub use distribution::{
    cross_paper_consistency, rating_distribution, ConsistencyLevel, CrossPaperConsistency,
    DistributionStats, RatingDistribution,
};
pub use kappa::{component_kappa, fleiss_kappa, overall_kappa, score_bin, FleissKappa, KappaInterpretation};
pub use pairwise::{evaluator_consistency, pairwise_agreement, EvaluatorConsistency, PairwiseAgreement};
pub use tiers::{expertise_agreement, orkg_agreement, ExpertiseAgreement, ExpertiseTier, OrkgAgreement};
pub use variance::{
    variance_agreement, AnalysisMode, ConsensusCounts, ConsensusLevel, GroupAgreement,
    ScoreSeries, VarianceAgreement,
};
