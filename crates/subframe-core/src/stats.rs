//! Scalar statistics over pixel samples.
//!
//! Medians use `select_nth_unstable` for O(n) selection without a full sort.

use ndarray::Array2;

/// Median of a mutable sample slice (reordered in place). Returns 0 for an empty slice.
pub fn median(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        0.0
    } else if n == 1 {
        values[0]
    } else if n % 2 == 1 {
        let mid = n / 2;
        *values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b)).1
    } else {
        let mid = n / 2;
        values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        let upper = values[mid];
        let lower = *values[..mid]
            .select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b))
            .1;
        (lower + upper) / 2.0
    }
}

/// Median of all pixels of an image.
pub fn median_of(data: &Array2<f32>) -> f64 {
    let mut values: Vec<f64> = data.iter().map(|&v| v as f64).collect();
    median(&mut values)
}

/// Median absolute deviation from `center`.
pub fn mad(values: &[f64], center: f64) -> f64 {
    let mut deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&mut deviations)
}

/// Mean absolute deviation from `center`.
pub fn avg_dev(values: &[f64], center: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| (v - center).abs()).sum::<f64>() / values.len() as f64
}

/// Arithmetic mean. Returns 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation of a sample slice.
pub fn stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Linearly map the image onto [0, 1]. A constant image becomes all zeros.
pub fn rescale(data: &mut Array2<f32>) {
    let (lo, hi) = data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = hi - lo;
    if !range.is_finite() || range <= 0.0 {
        data.fill(0.0);
        return;
    }
    data.mapv_inplace(|v| (v - lo) / range);
}
