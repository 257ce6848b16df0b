pub mod doi;
pub mod stats;
pub mod types;

pub use doi::{normalize_doi, paper_id};
pub use types::{
    Component, ComponentScore, EvaluatorId, PaperId, PaperRecord, RawEvaluation, UserInfo,
};
