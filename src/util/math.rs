//! Numeric helpers shared by the engines.

/// Returns `steps + 1` evenly spaced values from `min` to `max` inclusive.
pub(crate) fn linspace(min: f64, max: f64, steps: u32) -> Vec<f64> {
    if steps == 0 {
        return vec![min];
    }
    let span = max - min;
    (0..=steps)
        .map(|i| {
            if i == steps {
                max
            } else {
                min + span * f64::from(i) / f64::from(steps)
            }
        })
        .collect()
}

/// Unnormalised 2D Gaussian weight.
#[inline]
pub(crate) fn gaussian(dx: f64, dy: f64, sigma: f64) -> f64 {
    let s2 = 2.0 * sigma * sigma;
    (-(dx * dx + dy * dy) / s2).exp()
}

/// Squared Euclidean distance between two equally sized vectors.
#[inline]
pub(crate) fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
