//! Aggregate reporting: the [`summary::AgreementMetrics`] snapshot and an
//! optional memoization layer in front of it.

pub mod cache;
pub mod summary;

pub use cache::{MetricsCache, MetricsCacheKey};
pub use summary::{
    analyze, analyze_corpus, analyze_json, AgreementMetrics, OverallStats, PaperAgreement,
    PaperAnalysis,
};
