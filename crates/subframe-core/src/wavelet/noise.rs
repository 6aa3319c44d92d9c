//! Wavelet-based estimation of the background noise standard deviation.
//!
//! Two estimators work on a B3-spline a trous decomposition: an iterative
//! k-sigma clip of a single detail layer, and the multiresolution support
//! (MRS) estimator, which only measures pixels that are not significant in
//! any detail layer. [`estimate_noise`] combines both through a ladder of
//! decreasing scales.

use ndarray::Array2;
use tracing::{debug, trace};

use crate::consts::{
    B3_NOISE_SCALING, MRS_BIAS, MRS_HIGH, MRS_LOW, MRS_MAX_ITERATIONS, MRS_TOLERANCE, NOISE_K,
    NOISE_MAX_ITERATIONS, NOISE_MIN_FRACTION, NOISE_START_LAYERS, NOISE_TOLERANCE,
};
use crate::stats;

use super::atrous::decompose;

/// Result of [`estimate_noise`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseEstimate {
    /// Noise standard deviation in pixel units.
    pub sigma: f64,
    /// Fraction of pixels classified as background noise.
    pub fraction: f64,
    /// Number of wavelet layers that produced the estimate; 0 for the k-sigma fallback.
    pub layers: usize,
}

/// Iterative k-sigma clipped standard deviation of a wavelet layer.
///
/// Returns the clipped sigma (in layer units) and the number of pixels that
/// survived the last clipping pass.
pub fn noise_ksigma(
    layer: &Array2<f32>,
    k: f64,
    tolerance: f64,
    max_iterations: usize,
) -> (f64, usize) {
    let values: Vec<f64> = layer.iter().map(|&v| v as f64).collect();
    let mut sigma = stats::stddev(&values);
    let mut count = values.len();
    if sigma <= 0.0 {
        return (0.0, count);
    }

    let mut kept = Vec::with_capacity(values.len());
    for _ in 0..max_iterations {
        let limit = k * sigma;
        kept.clear();
        kept.extend(values.iter().copied().filter(|v| v.abs() < limit));
        count = kept.len();
        if count < 2 {
            return (0.0, count);
        }
        let previous = sigma;
        sigma = stats::stddev(&kept);
        if sigma <= 0.0 || (previous - sigma) / previous < tolerance {
            break;
        }
    }

    (sigma, count)
}

/// Multiresolution support noise estimate.
///
/// A pixel belongs to the support when its coefficient in any detail layer
/// exceeds `k * sigma * scaling[j]`. The noise is the standard deviation of
/// `image - residual` over the remaining pixels whose value lies strictly
/// inside ([`MRS_LOW`], [`MRS_HIGH`]), iterated until it changes by less
/// than [`MRS_TOLERANCE`]. A zero `sigma0` is replaced by the standard
/// deviation of the image.
///
/// Returns `(0.0, 0)` when the iteration degenerates or does not converge
/// within [`MRS_MAX_ITERATIONS`]. The returned sigma includes the
/// [`MRS_BIAS`] correction.
pub fn noise_mrs(
    image: &Array2<f32>,
    layers: &[Array2<f32>],
    residual: &Array2<f32>,
    scaling: &[f64],
    sigma0: f64,
    k: f64,
) -> (f64, usize) {
    if image.len() < 9 || layers.is_empty() {
        return (0.0, 0);
    }

    let mut sigma = sigma0;
    if 1.0 + sigma == 1.0 {
        let values: Vec<f64> = image.iter().map(|&v| v as f64).collect();
        sigma = stats::stddev(&values);
        if 1.0 + sigma == 1.0 {
            return (0.0, 0);
        }
    }

    // (index, image - residual) for every pixel inside the sampling range.
    let candidates: Vec<(usize, f64)> = image
        .iter()
        .zip(residual.iter())
        .enumerate()
        .filter(|(_, (v, _))| **v > MRS_LOW && **v < MRS_HIGH)
        .map(|(i, (&v, &r))| (i, (v - r) as f64))
        .collect();
    let layer_values: Vec<Vec<f64>> = layers
        .iter()
        .map(|l| l.iter().map(|&c| (c as f64).abs()).collect())
        .collect();

    let mut samples = Vec::with_capacity(candidates.len());
    for _ in 0..MRS_MAX_ITERATIONS {
        let thresholds: Vec<f64> = scaling
            .iter()
            .take(layers.len())
            .map(|s| k * sigma * s)
            .collect();

        samples.clear();
        samples.extend(candidates.iter().filter_map(|&(i, d)| {
            let significant = layer_values
                .iter()
                .zip(&thresholds)
                .any(|(layer, &t)| layer[i] > t);
            (!significant).then_some(d)
        }));

        if samples.len() < 2 {
            return (0.0, 0);
        }
        let next = stats::stddev(&samples);
        if 1.0 + next == 1.0 {
            return (0.0, 0);
        }

        let change = (next - sigma).abs() / next;
        sigma = next;
        if change < MRS_TOLERANCE {
            return (sigma / MRS_BIAS, samples.len());
        }
    }

    trace!(sigma, "MRS noise evaluation did not converge");
    (0.0, 0)
}

/// Estimate the noise standard deviation of an image.
///
/// Starts at [`NOISE_START_LAYERS`] wavelet layers. At that first scale a
/// k-sigma estimate of layer 0 is also computed and seeds every MRS run. An
/// MRS estimate is accepted when it is positive and covers at least
/// [`NOISE_MIN_FRACTION`] of the pixels; otherwise the scale is reduced. When
/// only one layer would remain, the k-sigma estimate is returned instead.
pub fn estimate_noise(data: &Array2<f32>) -> NoiseEstimate {
    let total = data.len().max(1) as f64;
    let mut ksigma = NoiseEstimate {
        sigma: 0.0,
        fraction: 0.0,
        layers: 0,
    };

    let mut n = NOISE_START_LAYERS;
    loop {
        let (layers, residual) = decompose(data, n);

        if n == NOISE_START_LAYERS {
            let (s, count) =
                noise_ksigma(&layers[0], NOISE_K, NOISE_TOLERANCE, NOISE_MAX_ITERATIONS);
            ksigma.sigma = s / B3_NOISE_SCALING[0];
            ksigma.fraction = count as f64 / total;
        }

        let (sigma, count) =
            noise_mrs(data, &layers, &residual, &B3_NOISE_SCALING, ksigma.sigma, NOISE_K);
        let fraction = count as f64 / total;
        debug!(layers = n, sigma, fraction, "MRS noise evaluation");

        if sigma > 0.0 && fraction >= NOISE_MIN_FRACTION {
            return NoiseEstimate {
                sigma,
                fraction,
                layers: n,
            };
        }

        n -= 1;
        if n == 1 {
            debug!(sigma = ksigma.sigma, "Falling back to k-sigma noise estimate");
            return ksigma;
        }
    }
}
