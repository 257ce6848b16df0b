//! Input records and the canonical score types shared by every analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five evaluated facets of a paper annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Metadata,
    ResearchField,
    ResearchProblem,
    Template,
    Content,
}

impl Component {
    /// Fixed evaluation order used by every per-component analysis
    pub const ALL: [Component; 5] = [
        Component::Metadata,
        Component::ResearchField,
        Component::ResearchProblem,
        Component::Template,
        Component::Content,
    ];

    /// Key used in current evaluation records
    pub fn key(&self) -> &'static str {
        match self {
            Component::Metadata => "metadata",
            Component::ResearchField => "research_field",
            Component::ResearchProblem => "research_problem",
            Component::Template => "template",
            Component::Content => "content",
        }
    }

    /// Keys under which this component may appear, in lookup priority order.
    ///
    /// Older records used camelCase for the two-word components.
    pub fn key_aliases(&self) -> &'static [&'static str] {
        match self {
            Component::Metadata => &["metadata"],
            Component::ResearchField => &["research_field", "researchField"],
            Component::ResearchProblem => &["research_problem", "researchProblem"],
            Component::Template => &["template"],
            Component::Content => &["content"],
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Component::Metadata => "Metadata",
            Component::ResearchField => "Research Field",
            Component::ResearchProblem => "Research Problem",
            Component::Template => "Template",
            Component::Content => "Content",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Canonical per-component score of one evaluation.
///
/// Every field is either a finite number or `None`. `None` means "not
/// assessable" and is excluded from aggregates; it is never read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentScore {
    /// Final accuracy score in [0, 1]
    pub accuracy: Option<f64>,
    /// Final quality score in [0, 1]
    pub quality: Option<f64>,
    /// Raw machine-computed score
    pub automated: Option<f64>,
    /// Evaluator rating normalized to [0, 1]
    pub user_rating: Option<f64>,
}

impl ComponentScore {
    /// Mean of the available final scores (accuracy, quality).
    pub fn combined(&self) -> Option<f64> {
        crate::core::stats::mean_of_present([self.accuracy, self.quality])
    }

    pub fn is_empty(&self) -> bool {
        self.accuracy.is_none()
            && self.quality.is_none()
            && self.automated.is_none()
            && self.user_rating.is_none()
    }
}

/// Evaluator profile as submitted with each evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    pub first_name: String,
    pub last_name: String,
    pub role: Option<String>,
    pub domain_expertise: Option<String>,
    pub orkg_experience: Option<String>,
    pub expertise_weight: Option<f64>,
}

impl UserInfo {
    /// Whether the evaluator reported any prior ORKG usage.
    ///
    /// A missing answer counts as no experience.
    pub fn has_orkg_experience(&self) -> bool {
        match self.orkg_experience.as_deref().map(str::trim) {
            None | Some("") => false,
            Some(value) => !value.eq_ignore_ascii_case("never"),
        }
    }
}

/// One evaluator's assessment of one paper as received from the data layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEvaluation {
    pub user_info: UserInfo,
    /// Arbitrarily nested metric tree; its layout drifted over time
    pub evaluation_metrics: serde_json::Value,
    pub timestamp: Option<String>,
}

impl RawEvaluation {
    /// Parsed RFC 3339 timestamp. Unparseable values are treated as absent.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts.trim()).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }
}

/// One evaluation session for one paper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaperRecord {
    pub doi: Option<String>,
    pub token: Option<String>,
    pub ground_truth: Option<serde_json::Value>,
    pub system_output: Option<serde_json::Value>,
    pub user_evaluations: Vec<RawEvaluation>,
}

/// Stable evaluator identity derived from first and last name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluatorId(String);

impl EvaluatorId {
    /// Derive the identity from a profile: lowercase, whitespace collapsed to `_`.
    pub fn from_user_info(info: &UserInfo) -> Self {
        let joined = format!("{} {}", info.first_name, info.last_name);
        let id = joined
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("_");
        if id.is_empty() {
            Self("anonymous".to_string())
        } else {
            Self(id)
        }
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvaluatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Paper identity: normalized DOI, or the session token when no DOI exists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperId(String);

impl PaperId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
