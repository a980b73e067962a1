//! Small descriptive statistics over `f64` samples. Empty input yields 0
//! rather than NaN so callers can compare freely.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Population standard deviation; 0 for fewer than two samples.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Standard deviation over mean. NaN or infinite when the mean is zero,
/// which fails every threshold comparison.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    std_dev(values) / mean(values)
}

/// Mean where sample `i` (0 = oldest) weighs `1 + i * step`.
pub fn weighted_avg(values: &[f64], step: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let (sum, weights) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sum, weights), (i, v)| {
            let w = 1.0 + i as f64 * step;
            (sum + v * w, weights + w)
        });
    sum / weights
}

/// The last `n` samples (all of them when shorter).
pub fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}
