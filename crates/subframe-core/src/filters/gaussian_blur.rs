use ndarray::{Array2, Axis};

use crate::consts::GAUSSIAN_FILTER_EDGE;

/// Gaussian low-pass described by its odd kernel size.
///
/// The standard deviation is chosen so that the outermost coefficient is
/// [`GAUSSIAN_FILTER_EDGE`] times the central one. Sizes below 3 leave the
/// image unchanged. Samples past the border repeat the edge pixel.
pub fn gaussian_filter_sized(data: &Array2<f32>, size: usize) -> Array2<f32> {
    let size = size | 1;
    if size < 3 {
        return data.clone();
    }
    let radius = size / 2;
    let sigma = radius as f32 / (-2.0 * GAUSSIAN_FILTER_EDGE.ln()).sqrt();
    let kernel = gaussian_kernel(sigma, radius);

    let rows = convolve_axis(data, &kernel, Axis(1));
    convolve_axis(&rows, &kernel, Axis(0))
}

/// Normalized 1-D kernel of `2 * radius + 1` taps.
fn gaussian_kernel(sigma: f32, radius: usize) -> Vec<f32> {
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

fn convolve_axis(data: &Array2<f32>, kernel: &[f32], axis: Axis) -> Array2<f32> {
    let last = data.len_of(axis) as isize - 1;
    let radius = (kernel.len() / 2) as isize;
    let mut out = Array2::<f32>::zeros(data.dim());

    for (src, mut dst) in data.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
        for (i, d) in dst.iter_mut().enumerate() {
            *d = kernel
                .iter()
                .enumerate()
                .map(|(k, &w)| {
                    let j = (i as isize + k as isize - radius).clamp(0, last);
                    w * src[j as usize]
                })
                .sum();
        }
    }

    out
}
