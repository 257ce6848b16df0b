// Shared fixtures for evalmap integration tests
#![allow(dead_code)]

use evalmap::config::EvalmapConfig;
use serde_json::{json, Value};

/// Sequential config so results never depend on scheduling
pub fn sequential_config() -> EvalmapConfig {
    EvalmapConfig {
        parallel: false,
        ..Default::default()
    }
}

/// Evaluation carrying only a precomputed overall score
pub fn overall_eval(first: &str, weight: f64, score: f64) -> Value {
    json!({
        "userInfo": { "firstName": first, "lastName": "Tester", "expertiseWeight": weight },
        "evaluationMetrics": { "overallScore": score }
    })
}

/// Same as [`overall_eval`] with an ORKG experience answer
pub fn orkg_eval(first: &str, orkg: &str, score: f64) -> Value {
    json!({
        "userInfo": { "firstName": first, "lastName": "Tester", "orkgExperience": orkg },
        "evaluationMetrics": { "overallScore": score }
    })
}

pub fn session(doi: &str, evaluations: Vec<Value>) -> Value {
    json!({ "doi": doi, "userEvaluations": evaluations })
}

/// Deterministic synthetic export: `papers` papers rated by `raters` evaluators
pub fn synthetic_export(papers: usize, raters: usize) -> Value {
    let sessions: Vec<Value> = (0..papers)
        .map(|p| {
            let evaluations = (0..raters)
                .map(|r| {
                    let score = ((p * 7 + r * 13) % 100) as f64 / 100.0;
                    overall_eval(&format!("rater{r}"), 1.0 + (r % 5) as f64, score)
                })
                .collect();
            session(&format!("10.1000/paper.{p}"), evaluations)
        })
        .collect();
    Value::Array(sessions)
}
