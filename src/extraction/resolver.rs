//! Generic first-match-wins resolver over evaluation records.

use super::paths::FieldPath;
use serde_json::Value;

/// Follow a path to its raw JSON node, if every segment exists.
pub fn lookup<'a>(root: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| node.get(segment.as_str()))
}

/// Read a JSON node as a finite number.
///
/// Numeric strings are accepted because some exports stored scores as text.
/// `null`, objects and arrays are "no value"; other types are logged.
pub fn as_score(node: &Value) -> Option<f64> {
    let value = match node {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let parsed = s.trim().parse::<f64>().ok();
            if parsed.is_none() {
                tracing::warn!("Ignoring non-numeric score string {:?}", s);
            }
            parsed
        }
        Value::Bool(b) => {
            tracing::warn!("Ignoring boolean where a score was expected: {}", b);
            None
        }
        Value::Null | Value::Object(_) | Value::Array(_) => None,
    };
    value.filter(|v| v.is_finite())
}

/// Resolve one path to a scaled score.
pub fn resolve(root: &Value, path: &FieldPath) -> Option<f64> {
    lookup(root, path)
        .and_then(as_score)
        .map(|v| path.scale().normalize(v))
}

/// Resolve the first path in priority order that yields a score.
pub fn resolve_first(root: &Value, paths: &[FieldPath]) -> Option<f64> {
    paths.iter().find_map(|path| {
        let value = resolve(root, path);
        if value.is_some() {
            tracing::trace!("Resolved score via {}", path);
        }
        value
    })
}

/// First path that points at a JSON object.
pub fn resolve_object<'a>(
    root: &'a Value,
    paths: &'a [FieldPath],
) -> Option<(&'a serde_json::Map<String, Value>, &'a FieldPath)> {
    paths.iter().find_map(|path| {
        lookup(root, path)
            .and_then(Value::as_object)
            .map(|object| (object, path))
    })
}
