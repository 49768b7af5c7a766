//! Weighted arithmetic mean of zone errors.

/// `sum(value_i * weight_i) / sum(weight_i)`.
///
/// Returns `None` (undefined) when the slices differ in length, when the
/// weights sum to zero, or when the result is not finite.  Callers must
/// treat `None` as a hard fault; it never degrades to a number.
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> Option<f64> {
    if values.len() != weights.len() {
        return None;
    }

    let weight_sum: f64 = weights.iter().sum();
    if weight_sum == 0.0 {
        return None;
    }

    let weighted: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    let mean = weighted / weight_sum;
    mean.is_finite().then_some(mean)
}

/// Round half away from zero to `decimals` places.
///
/// Values too large to scale are returned unchanged.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / scale
}
