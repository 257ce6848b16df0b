//! Turns one raw evaluation record into canonical component scores.
//!
//! Missing data never fails: any component or field that cannot be resolved
//! becomes `None` and drops out of every downstream aggregate.

use super::paths::{
    content_property_containers, content_rating_maps, extraction_spec, overall_score_paths,
    ComponentExtraction, CONTENT_RESERVED_KEYS,
};
use super::resolver::{as_score, resolve_first, resolve_object};
use crate::core::stats::{clamp_unit, mean, mean_of_present, present};
use crate::core::{Component, ComponentScore};
use crate::scoring::ScoreComposer;
use serde_json::Value;
use std::collections::BTreeMap;

/// Canonical scores of one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedEvaluation {
    pub components: BTreeMap<Component, ComponentScore>,
    /// Overall score of the evaluation in [0, 1]
    pub overall: Option<f64>,
}

impl NormalizedEvaluation {
    /// Final accuracy of one component
    pub fn accuracy(&self, component: Component) -> Option<f64> {
        self.components.get(&component).and_then(|c| c.accuracy)
    }
}

/// Raw values resolved for one component before composition
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ResolvedFields {
    automated: Option<f64>,
    automated_quality: Option<f64>,
    user_rating: Option<f64>,
    final_accuracy: Option<f64>,
    final_quality: Option<f64>,
}

/// Per-property averages of the content component
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContentAggregate {
    pub accuracy: Option<f64>,
    pub quality: Option<f64>,
    pub final_score: Option<f64>,
    pub user_rating: Option<f64>,
}

/// Normalize one evaluation record.
pub fn normalize_evaluation(
    metrics: &Value,
    expertise_weight: f64,
    composer: &ScoreComposer,
) -> NormalizedEvaluation {
    let components: BTreeMap<Component, ComponentScore> = Component::ALL
        .iter()
        .map(|&component| {
            let spec = extraction_spec(component);
            let score = normalize_component(metrics, &spec, expertise_weight, composer);
            (component, score)
        })
        .collect();

    let overall = resolve_first(metrics, &overall_score_paths())
        .map(clamp_unit)
        .or_else(|| mean_of_present(components.values().map(ComponentScore::combined)));

    NormalizedEvaluation {
        components,
        overall,
    }
}

/// Normalize one component under its extraction rules.
pub fn normalize_component(
    metrics: &Value,
    spec: &ComponentExtraction,
    expertise_weight: f64,
    composer: &ScoreComposer,
) -> ComponentScore {
    let mut fields = resolve_fields(metrics, spec);

    if spec.component == Component::Content {
        let aggregate = content_aggregate(metrics);
        fields.automated = fields.automated.or(aggregate.accuracy);
        fields.automated_quality = fields.automated_quality.or(aggregate.quality);
        fields.final_accuracy = fields.final_accuracy.or(aggregate.final_score);
        fields.user_rating = fields.user_rating.or(aggregate.user_rating);
    }

    compose_fields(fields, expertise_weight, composer)
}

fn resolve_fields(metrics: &Value, spec: &ComponentExtraction) -> ResolvedFields {
    ResolvedFields {
        automated: resolve_first(metrics, &spec.automated),
        automated_quality: resolve_first(metrics, &spec.automated_quality),
        user_rating: resolve_first(metrics, &spec.user_rating).map(clamp_unit),
        final_accuracy: resolve_first(metrics, &spec.final_accuracy),
        final_quality: resolve_first(metrics, &spec.final_quality),
    }
}

fn compose_fields(
    fields: ResolvedFields,
    expertise_weight: f64,
    composer: &ScoreComposer,
) -> ComponentScore {
    // A stored final score was already blended upstream; blending it again
    // would apply the expertise weight twice.
    let accuracy = fields
        .final_accuracy
        .map(clamp_unit)
        .or_else(|| composer.compose(fields.automated, fields.user_rating, expertise_weight));

    let quality = fields.final_quality.map(clamp_unit).or_else(|| {
        composer.compose(
            fields.automated_quality.or(fields.automated),
            fields.user_rating,
            expertise_weight,
        )
    });

    ComponentScore {
        accuracy,
        quality,
        automated: fields.automated,
        user_rating: fields.user_rating,
    }
}

/// Average per-property content scores and the side-map ratings.
///
/// Properties live under `content.properties` (or directly under `content`);
/// their ratings live in a separate `userRatings` map keyed by property name.
pub fn content_aggregate(metrics: &Value) -> ContentAggregate {
    let mut aggregate = ContentAggregate::default();

    if let Some((properties, path)) = resolve_object(metrics, &content_property_containers()) {
        let entries: Vec<&serde_json::Map<String, Value>> = properties
            .iter()
            .filter(|(key, _)| !CONTENT_RESERVED_KEYS.contains(&key.as_str()))
            .filter_map(|(_, value)| value.as_object())
            .collect();

        let average = |field: &str| {
            mean_of_present(
                entries
                    .iter()
                    .map(|entry| entry.get(field).and_then(as_score)),
            )
        };

        aggregate.accuracy = average("accuracyScore");
        aggregate.quality = average("qualityScore");
        aggregate.final_score = average("finalScore");
        tracing::trace!(
            "Content properties from {}: {} entries",
            path,
            entries.len()
        );
    }

    if let Some((ratings, path)) = resolve_object(metrics, &content_rating_maps()) {
        let scale = path.scale();
        let values = present(ratings.values().map(|v| as_score(v).map(|r| scale.normalize(r))));
        aggregate.user_rating = mean(&values).map(clamp_unit);
    }

    aggregate
}
