//! Extraction of canonical scores from schema-drifted evaluation records.
//!
//! - [`paths`]: declarative per-component field path priority lists
//! - [`resolver`]: generic first-match resolver over JSON
//! - [`normalizer`]: per-evaluation component scores
//! - [`corpus`]: input validation, session merge and the score matrix

pub mod corpus;
pub mod normalizer;
pub mod paths;
pub mod resolver;

pub use corpus::{
    parse_papers, Corpus, Evaluation, Evaluator, Paper, ScoreMatrix, ScoreSelector,
};
pub use normalizer::{normalize_evaluation, NormalizedEvaluation};
pub use paths::{extraction_spec, FieldPath, Scale};
