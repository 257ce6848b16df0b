//! Declarative extraction rules.
//!
//! Evaluation records went through several layouts. Instead of hand-written
//! traversal per component, each component gets ordered lists of
//! [`FieldPath`]s; the resolver takes the first path that yields a number.
//! Each path carries the [`Scale`] its layout stored values in, so rating
//! normalization is decided by the layout and not guessed from the value.

use crate::core::Component;
use std::fmt;

/// Scale a stored value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// Already in [0, 1]
    Unit,
    /// 1-5 star rating, normalized by `/5`
    Rating5,
}

impl Scale {
    pub fn normalize(self, value: f64) -> f64 {
        match self {
            Scale::Unit => value,
            Scale::Rating5 => value / 5.0,
        }
    }
}

/// Dotted key path into an evaluation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
    scale: Scale,
}

impl FieldPath {
    pub fn new<S: AsRef<str>>(segments: &[S], scale: Scale) -> Self {
        Self {
            segments: segments.iter().map(|s| s.as_ref().to_string()).collect(),
            scale,
        }
    }

    pub fn unit<S: AsRef<str>>(segments: &[S]) -> Self {
        Self::new(segments, Scale::Unit)
    }

    pub fn rating<S: AsRef<str>>(segments: &[S]) -> Self {
        Self::new(segments, Scale::Rating5)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Metric side of a component score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Accuracy,
    Quality,
}

/// Ordered lookup lists for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentExtraction {
    pub component: Component,
    pub automated: Vec<FieldPath>,
    pub automated_quality: Vec<FieldPath>,
    pub user_rating: Vec<FieldPath>,
    pub final_accuracy: Vec<FieldPath>,
    pub final_quality: Vec<FieldPath>,
}

/// Path template; `{c}` stands for the component key
type Template = (&'static [&'static str], Scale);

const fn tpl(segments: &'static [&'static str], scale: Scale) -> Template {
    (segments, scale)
}

/// Build the extraction rules for a component.
///
/// Layouts in priority order, newest first: `scoreDetails` nesting,
/// `<component>.<side>` nesting, flat component fields, the `overall`
/// wrapper, the metric-first legacy layout and finally the `userRatings`
/// side-map. Within one layout the snake_case key is tried before the
/// camelCase alias.
pub fn extraction_spec(component: Component) -> ComponentExtraction {
    let aliases = component.key_aliases();

    ComponentExtraction {
        component,
        automated: expand(aliases, &automated_templates(Side::Accuracy)),
        automated_quality: expand(aliases, &automated_templates(Side::Quality)),
        user_rating: expand(aliases, &user_rating_templates()),
        final_accuracy: expand(aliases, &final_templates(Side::Accuracy)),
        final_quality: expand(aliases, &final_templates(Side::Quality)),
    }
}

fn expand(aliases: &[&str], templates: &[Template]) -> Vec<FieldPath> {
    let mut paths = Vec::with_capacity(templates.len() * aliases.len());
    for (template, scale) in templates {
        for alias in aliases {
            let segments: Vec<&str> = template
                .iter()
                .map(|seg| if *seg == "{c}" { *alias } else { *seg })
                .collect();
            paths.push(FieldPath::new(segments.as_slice(), *scale));
        }
    }
    paths
}

fn automated_templates(side: Side) -> Vec<Template> {
    match side {
        Side::Accuracy => vec![
            tpl(&["{c}", "accuracy", "scoreDetails", "automatedScore"], Scale::Unit),
            tpl(&["{c}", "accuracy", "automatedScore"], Scale::Unit),
            // Flat layout only ever stored the accuracy-side value
            tpl(&["{c}", "automatedScore"], Scale::Unit),
            tpl(&["overall", "{c}", "accuracy", "automatedScore"], Scale::Unit),
            tpl(&["accuracy", "{c}", "automatedScore"], Scale::Unit),
        ],
        Side::Quality => vec![
            tpl(&["{c}", "quality", "scoreDetails", "automatedScore"], Scale::Unit),
            tpl(&["{c}", "quality", "automatedScore"], Scale::Unit),
            tpl(&["overall", "{c}", "quality", "automatedScore"], Scale::Unit),
            tpl(&["quality", "{c}", "automatedScore"], Scale::Unit),
        ],
    }
}

fn user_rating_templates() -> Vec<Template> {
    vec![
        tpl(&["{c}", "accuracy", "scoreDetails", "normalizedRating"], Scale::Unit),
        tpl(&["{c}", "accuracy", "userRating"], Scale::Rating5),
        tpl(&["{c}", "userRating"], Scale::Rating5),
        tpl(&["overall", "{c}", "userRating"], Scale::Rating5),
        tpl(&["accuracy", "{c}", "userRating"], Scale::Rating5),
        tpl(&["userRatings", "{c}"], Scale::Rating5),
    ]
}

fn final_templates(side: Side) -> Vec<Template> {
    match side {
        Side::Accuracy => vec![
            tpl(&["{c}", "accuracy", "scoreDetails", "finalScore"], Scale::Unit),
            tpl(&["{c}", "accuracy", "finalScore"], Scale::Unit),
            tpl(&["overall", "{c}", "accuracy", "finalScore"], Scale::Unit),
            tpl(&["accuracy", "{c}", "finalScore"], Scale::Unit),
        ],
        Side::Quality => vec![
            tpl(&["{c}", "quality", "scoreDetails", "finalScore"], Scale::Unit),
            tpl(&["{c}", "quality", "finalScore"], Scale::Unit),
            tpl(&["overall", "{c}", "quality", "finalScore"], Scale::Unit),
            tpl(&["quality", "{c}", "finalScore"], Scale::Unit),
        ],
    }
}

/// Paths of a precomputed overall score for a whole evaluation
pub fn overall_score_paths() -> Vec<FieldPath> {
    vec![
        FieldPath::unit(&["overallScore"]),
        FieldPath::unit(&["overall", "overallScore"]),
        FieldPath::unit(&["overall", "finalScore"]),
    ]
}

/// Containers that may hold per-property content scores, in priority order
pub fn content_property_containers() -> Vec<FieldPath> {
    vec![
        FieldPath::unit(&["content", "properties"]),
        FieldPath::unit(&["content"]),
    ]
}

/// Locations of the per-property content rating side-map, in priority order
pub fn content_rating_maps() -> Vec<FieldPath> {
    vec![
        FieldPath::rating(&["content", "userRatings"]),
        FieldPath::rating(&["userRatings", "content"]),
    ]
}

/// Keys inside a content container that are never template properties
pub const CONTENT_RESERVED_KEYS: [&str; 7] = [
    "accuracy",
    "quality",
    "properties",
    "userRatings",
    "userRating",
    "automatedScore",
    "scoreDetails",
];
