//! Null-excluding aggregation helpers.
//!
//! Every average, variance and moment in the crate goes through this module so
//! the rule "missing values are skipped, never counted as zero" lives in one
//! place.

/// Keep only present, finite values, preserving order.
pub fn present<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect()
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean over the present values of an optional series.
pub fn mean_of_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    mean(&present(values))
}

/// Population variance (divides by N), `None` for an empty slice.
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let sum_sq = values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>();
    Some(sum_sq / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    population_variance(values).map(f64::sqrt)
}

/// Median of the values; averages the two middle values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Skewness `E[((x-μ)/σ)³]` and excess kurtosis `E[((x-μ)/σ)⁴] - 3`.
///
/// A zero-variance sample is a point distribution; both shape statistics are
/// reported as 0 rather than dividing by σ = 0.
pub fn shape_moments(values: &[f64]) -> Option<(f64, f64)> {
    let mu = mean(values)?;
    let sigma = std_dev(values)?;
    if sigma == 0.0 {
        return Some((0.0, 0.0));
    }
    let n = values.len() as f64;
    let (m3, m4) = values
        .iter()
        .map(|v| (v - mu) / sigma)
        .fold((0.0, 0.0), |(m3, m4), z| (m3 + z.powi(3), m4 + z.powi(4)));
    Some((m3 / n, m4 / n - 3.0))
}

/// Clamp into [0, 1].
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
