//! Evaluation aggregation and inter-rater agreement analytics.
//!
//! Human experts rate machine-generated paper annotations. This crate turns
//! their schema-drifted evaluation records into canonical per-component
//! scores and reports how reliably the evaluators agree: Fleiss' Kappa
//! (overall and per component), variance-based agreement, expertise-tier and
//! ORKG-experience agreement, a pairwise evaluator matrix and distribution
//! statistics.
//!
//! ```rust
//! use evalmap::config::EvalmapConfig;
//! use evalmap::report::analyze_json;
//! use serde_json::json;
//!
//! let input = json!([{
//!     "doi": "https://doi.org/10.1/ABC",
//!     "userEvaluations": [
//!         { "userInfo": { "firstName": "Ada" }, "evaluationMetrics": { "overallScore": 0.9 } },
//!         { "userInfo": { "firstName": "Bo" }, "evaluationMetrics": { "overallScore": 0.85 } }
//!     ]
//! }]);
//! let metrics = analyze_json(&input, &EvalmapConfig::default()).unwrap();
//! assert_eq!(metrics.overall_stats.papers_with_multiple_evaluators, 1);
//! // One multi-rater paper is not enough for kappa
//! assert!(metrics.fleiss_kappa.kappa.is_none());
//! ```

pub mod agreement;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod errors;
pub mod extraction;
pub mod io;
pub mod report;
pub mod scoring;

pub use crate::config::EvalmapConfig;
pub use crate::core::{
    normalize_doi, Component, ComponentScore, EvaluatorId, PaperId, PaperRecord, RawEvaluation,
    UserInfo,
};
pub use crate::errors::{Error, Result};
pub use crate::extraction::{parse_papers, Corpus};
pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};
pub use crate::report::{analyze, analyze_json, AgreementMetrics, MetricsCache};
pub use crate::scoring::{expertise_multiplier, final_score, ScoreComposer};
