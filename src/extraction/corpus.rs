//! Corpus assembly: input validation, session merging and the score matrix.
//!
//! Raw sessions are keyed by normalized DOI so that differently formatted
//! DOIs of one paper land in a single [`Paper`]. Each evaluation is
//! normalized once; every analysis afterwards reads the [`ScoreMatrix`].

use super::normalizer::{normalize_evaluation, NormalizedEvaluation};
use super::resolver::as_score;
use crate::config::EvalmapConfig;
use crate::core::{paper_id, Component, EvaluatorId, PaperId, PaperRecord, RawEvaluation, UserInfo};
use crate::errors::{Error, Result};
use crate::scoring::ScoreComposer;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Validate and convert raw input into paper records.
///
/// Accepts an array of papers or an object with a `papers` array. Shape
/// violations that indicate a caller bug (non-array input, non-object paper,
/// non-array `userEvaluations`) fail fast; anything else degrades to missing
/// data.
pub fn parse_papers(value: &Value) -> Result<Vec<PaperRecord>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("papers") {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(Error::validation("papers must be an array")),
            None => {
                return Err(Error::validation(
                    "expected an array of papers or an object with a `papers` array",
                ))
            }
        },
        _ => {
            return Err(Error::validation(
                "expected an array of papers or an object with a `papers` array",
            ))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_paper(index, item))
        .collect()
}

fn parse_paper(index: usize, item: &Value) -> Result<PaperRecord> {
    let object = item
        .as_object()
        .ok_or_else(|| Error::validation(format!("papers[{index}] must be an object")))?;

    let evaluations = match object.get("userEvaluations") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(evaluations)) => evaluations
            .iter()
            .enumerate()
            .filter_map(|(eval_index, evaluation)| {
                let parsed = parse_evaluation(evaluation);
                if parsed.is_none() {
                    tracing::warn!(
                        "Skipping papers[{}].userEvaluations[{}]: not an object",
                        index,
                        eval_index
                    );
                }
                parsed
            })
            .collect(),
        Some(_) => {
            return Err(Error::validation(format!(
                "papers[{index}].userEvaluations must be an array"
            )))
        }
    };

    Ok(PaperRecord {
        doi: string_field(object.get("doi")),
        token: string_field(object.get("token")),
        ground_truth: non_null(object.get("groundTruth")),
        system_output: non_null(object.get("systemOutput")),
        user_evaluations: evaluations,
    })
}

fn parse_evaluation(value: &Value) -> Option<RawEvaluation> {
    let object = value.as_object()?;
    Some(RawEvaluation {
        user_info: object
            .get("userInfo")
            .map(user_info_from_value)
            .unwrap_or_default(),
        evaluation_metrics: object
            .get("evaluationMetrics")
            .cloned()
            .unwrap_or(Value::Null),
        timestamp: string_field(object.get("timestamp")),
    })
}

fn user_info_from_value(value: &Value) -> UserInfo {
    UserInfo {
        first_name: string_field(value.get("firstName")).unwrap_or_default(),
        last_name: string_field(value.get("lastName")).unwrap_or_default(),
        role: string_field(value.get("role")),
        domain_expertise: string_field(value.get("domainExpertise")),
        orkg_experience: string_field(value.get("orkgExperience")),
        expertise_weight: value.get("expertiseWeight").and_then(as_score),
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_null(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

/// Which score of an evaluation an analysis reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreSelector {
    Overall,
    Accuracy(Component),
}

impl ScoreSelector {
    pub fn pick(self, scores: &NormalizedEvaluation) -> Option<f64> {
        match self {
            ScoreSelector::Overall => scores.overall,
            ScoreSelector::Accuracy(component) => scores.accuracy(component),
        }
    }
}

/// One evaluator's normalized assessment of one paper.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub evaluator_id: EvaluatorId,
    pub timestamp: Option<DateTime<Utc>>,
    pub scores: NormalizedEvaluation,
}

/// Evaluator profile plus the papers and scores attributed to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluator {
    pub id: EvaluatorId,
    pub name: String,
    pub profile: UserInfo,
    /// Reported expertise weight, or the configured default
    pub expertise_weight: f64,
    pub papers: BTreeSet<PaperId>,
    /// Overall score of every evaluation, in input order
    pub score_history: Vec<f64>,
}

impl Evaluator {
    fn new(id: EvaluatorId, profile: &UserInfo, default_weight: f64) -> Self {
        let name = format!("{} {}", profile.first_name.trim(), profile.last_name.trim())
            .trim()
            .to_string();
        Self {
            id,
            name,
            profile: profile.clone(),
            expertise_weight: effective_weight(profile, default_weight),
            papers: BTreeSet::new(),
            score_history: Vec::new(),
        }
    }

    pub fn has_orkg_experience(&self) -> bool {
        self.profile.has_orkg_experience()
    }
}

fn effective_weight(profile: &UserInfo, default_weight: f64) -> f64 {
    profile
        .expertise_weight
        .filter(|w| w.is_finite())
        .unwrap_or(default_weight)
}

/// One paper with every session merged into it.
#[derive(Debug, Clone, PartialEq)]
pub struct Paper {
    pub id: PaperId,
    pub doi: Option<String>,
    pub tokens: Vec<String>,
    pub ground_truth: Option<Value>,
    pub system_output: Option<Value>,
    /// Evaluations in chronological order (undated first, input order kept)
    pub evaluations: Vec<Evaluation>,
    pub sessions: usize,
}

impl Paper {
    fn new(id: PaperId) -> Self {
        Self {
            id,
            doi: None,
            tokens: Vec::new(),
            ground_truth: None,
            system_output: None,
            evaluations: Vec::new(),
            sessions: 0,
        }
    }
}

/// Latest evaluation per (paper, evaluator).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreMatrix {
    rows: BTreeMap<PaperId, BTreeMap<EvaluatorId, Evaluation>>,
}

impl ScoreMatrix {
    /// Record an evaluation; a later timestamp (or later input on a tie)
    /// replaces an earlier evaluation by the same evaluator.
    fn record(&mut self, paper: &PaperId, evaluation: Evaluation) {
        let row = self.rows.entry(paper.clone()).or_default();
        match row.get(&evaluation.evaluator_id) {
            Some(existing) if existing.timestamp > evaluation.timestamp => {}
            _ => {
                row.insert(evaluation.evaluator_id.clone(), evaluation);
            }
        }
    }

    fn ensure_paper(&mut self, paper: &PaperId) {
        self.rows.entry(paper.clone()).or_default();
    }

    pub fn paper_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&PaperId, &BTreeMap<EvaluatorId, Evaluation>)> {
        self.rows.iter()
    }

    pub fn row(&self, paper: &PaperId) -> Option<&BTreeMap<EvaluatorId, Evaluation>> {
        self.rows.get(paper)
    }

    /// Present scores per paper for the selector; papers with no present
    /// score are omitted.
    pub fn series(&self, selector: ScoreSelector) -> BTreeMap<PaperId, BTreeMap<EvaluatorId, f64>> {
        self.rows
            .iter()
            .filter_map(|(paper, row)| {
                let scores: BTreeMap<EvaluatorId, f64> = row
                    .iter()
                    .filter_map(|(evaluator, evaluation)| {
                        selector
                            .pick(&evaluation.scores)
                            .filter(|v| v.is_finite())
                            .map(|score| (evaluator.clone(), score))
                    })
                    .collect();
                (!scores.is_empty()).then(|| (paper.clone(), scores))
            })
            .collect()
    }
}

/// Everything the analyses read, built once per input snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    pub papers: BTreeMap<PaperId, Paper>,
    pub evaluators: BTreeMap<EvaluatorId, Evaluator>,
    pub matrix: ScoreMatrix,
    /// Number of input session records
    pub session_count: usize,
}

impl Corpus {
    pub fn build(records: &[PaperRecord], config: &EvalmapConfig) -> Self {
        let _span = tracing::debug_span!("build_corpus", sessions = records.len()).entered();
        let composer = ScoreComposer::new(config.scoring.clone());
        let default_weight = config.default_expertise_weight;

        let normalize_record = |record: &PaperRecord| -> Vec<NormalizedEvaluation> {
            record
                .user_evaluations
                .iter()
                .map(|evaluation| {
                    let weight = effective_weight(&evaluation.user_info, default_weight);
                    normalize_evaluation(&evaluation.evaluation_metrics, weight, &composer)
                })
                .collect()
        };

        let normalized: Vec<Vec<NormalizedEvaluation>> = if config.parallel {
            records.par_iter().map(normalize_record).collect()
        } else {
            records.iter().map(normalize_record).collect()
        };

        let mut corpus = Corpus {
            session_count: records.len(),
            ..Default::default()
        };

        for (index, (record, scores)) in records.iter().zip(normalized).enumerate() {
            corpus.merge_session(index, record, scores, default_weight);
        }

        for paper in corpus.papers.values_mut() {
            paper.evaluations.sort_by_key(|evaluation| evaluation.timestamp);
        }

        tracing::debug!(
            "Corpus: {} sessions, {} unique papers, {} evaluators",
            corpus.session_count,
            corpus.papers.len(),
            corpus.evaluators.len()
        );
        corpus
    }

    fn merge_session(
        &mut self,
        index: usize,
        record: &PaperRecord,
        scores: Vec<NormalizedEvaluation>,
        default_weight: f64,
    ) {
        let id = paper_id(record).unwrap_or_else(|| {
            tracing::debug!("Session {} has neither DOI nor token", index);
            PaperId::new(format!("session:{index}"))
        });

        let paper = self
            .papers
            .entry(id.clone())
            .or_insert_with(|| Paper::new(id.clone()));
        paper.sessions += 1;
        if paper.doi.is_none() {
            paper.doi = record
                .doi
                .as_deref()
                .map(crate::core::normalize_doi)
                .filter(|doi| !doi.is_empty());
        }
        if let Some(token) = record.token.as_deref().map(str::trim) {
            if !token.is_empty() && !paper.tokens.iter().any(|t| t == token) {
                paper.tokens.push(token.to_string());
            }
        }
        if paper.ground_truth.is_none() {
            paper.ground_truth = record.ground_truth.clone();
        }
        if paper.system_output.is_none() {
            paper.system_output = record.system_output.clone();
        }
        self.matrix.ensure_paper(&id);

        for (raw, normalized) in record.user_evaluations.iter().zip(scores) {
            let evaluator_id = EvaluatorId::from_user_info(&raw.user_info);
            let evaluator = self
                .evaluators
                .entry(evaluator_id.clone())
                .or_insert_with(|| Evaluator::new(evaluator_id.clone(), &raw.user_info, default_weight));
            evaluator.papers.insert(id.clone());
            if let Some(overall) = normalized.overall {
                evaluator.score_history.push(overall);
            }

            let evaluation = Evaluation {
                evaluator_id,
                timestamp: raw.parsed_timestamp(),
                scores: normalized,
            };
            paper.evaluations.push(evaluation.clone());
            self.matrix.record(&id, evaluation);
        }
    }

    /// Total evaluations received across all sessions
    pub fn evaluation_count(&self) -> usize {
        self.papers.values().map(|p| p.evaluations.len()).sum()
    }

    pub fn evaluator(&self, id: &EvaluatorId) -> Option<&Evaluator> {
        self.evaluators.get(id)
    }
}
