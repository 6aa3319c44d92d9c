use std::path::Path;

use ndarray::Array2;

use crate::consts::EPSILON;
use crate::detection::Star;
use crate::error::{Result, SubframeError};
use crate::psf::{PsfFit, PsfModel};
use crate::stats;
use crate::wavelet::estimate_noise;

use super::data::MeasureData;

/// Aggregated PSF measurements of one subframe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StarMetrics {
    pub fwhm: f64,
    pub fwhm_mean_dev: f64,
    pub eccentricity: f64,
    pub eccentricity_mean_dev: f64,
    pub star_residual: f64,
    pub star_residual_mean_dev: f64,
    pub star_count: usize,
}

/// Whole-image statistics, independent of the detected stars.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageStats {
    pub median: f64,
    pub median_mean_dev: f64,
    pub noise: f64,
    pub noise_ratio: f64,
    pub snr_weight: f64,
}

/// Inverse-residual weight of every fit: `min(mad) / mad`.
///
/// The best fit gets exactly 1.0; every weight is in (0, 1].
pub fn star_weights(fits: &[PsfFit]) -> Vec<f64> {
    let Some(first) = fits.first() else {
        return Vec::new();
    };
    let min_mad = fits.iter().skip(1).fold(first.mad, |m, f| m.min(f.mad));
    let min_mad = min_mad.max(EPSILON);
    fits.iter().map(|f| min_mad / f.mad.max(EPSILON)).collect()
}

/// Weighted means and unweighted mean deviations of the successful fits.
///
/// Fails with [`SubframeError::NoPsfFits`] when no fit succeeded; `stars` is
/// the number of detected stars to report in that case.
pub fn score_fits(fits: &[PsfFit], model: PsfModel, stars: usize) -> Result<StarMetrics> {
    let fits: Vec<PsfFit> = fits.iter().copied().filter(PsfFit::is_ok).collect();
    if fits.is_empty() {
        return Err(SubframeError::NoPsfFits { stars });
    }

    let weights = star_weights(&fits);
    let fwhms: Vec<f64> = fits.iter().map(PsfFit::mean_sigma).collect();
    let eccentricities: Vec<f64> = fits.iter().map(PsfFit::eccentricity).collect();
    let residuals: Vec<f64> = fits.iter().map(|f| f.mad).collect();

    let weight_sum: f64 = weights.iter().sum();
    let weighted = |values: &[f64]| {
        values.iter().zip(&weights).map(|(v, w)| v * w).sum::<f64>() / weight_sum
    };
    let mean_dev = |values: &[f64]| stats::avg_dev(values, stats::mean(values));

    let factor = model.fwhm_factor();
    Ok(StarMetrics {
        fwhm: factor * weighted(&fwhms),
        fwhm_mean_dev: factor * mean_dev(&fwhms),
        eccentricity: weighted(&eccentricities),
        eccentricity_mean_dev: mean_dev(&eccentricities),
        star_residual: weighted(&residuals),
        star_residual_mean_dev: mean_dev(&residuals),
        star_count: fits.len(),
    })
}

/// Median, mean deviation about the median, noise and SNR weight of an image.
pub fn image_stats(data: &Array2<f32>) -> ImageStats {
    let mut values: Vec<f64> = data.iter().map(|&v| v as f64).collect();
    let median = stats::median(&mut values);
    let median_mean_dev = stats::avg_dev(&values, median);
    let noise = estimate_noise(data);

    let snr_weight = if noise.sigma > 0.0 {
        median_mean_dev * median_mean_dev / (noise.sigma * noise.sigma)
    } else {
        0.0
    };

    ImageStats {
        median,
        median_mean_dev,
        noise: noise.sigma,
        noise_ratio: noise.fraction,
        snr_weight,
    }
}

/// Build the measurement record of one subframe.
pub fn score(
    path: &Path,
    stars: &[Star],
    fits: &[PsfFit],
    model: PsfModel,
    image: &ImageStats,
) -> Result<MeasureData> {
    if stars.is_empty() {
        return Err(SubframeError::NoStars);
    }
    let metrics = score_fits(fits, model, stars.len())?;

    Ok(MeasureData {
        path: path.to_path_buf(),
        fwhm: metrics.fwhm,
        fwhm_mean_dev: metrics.fwhm_mean_dev,
        eccentricity: metrics.eccentricity,
        eccentricity_mean_dev: metrics.eccentricity_mean_dev,
        snr_weight: image.snr_weight,
        median: image.median,
        median_mean_dev: image.median_mean_dev,
        noise: image.noise,
        noise_ratio: image.noise_ratio,
        star_count: metrics.star_count,
        star_residual: metrics.star_residual,
        star_residual_mean_dev: metrics.star_residual_mean_dev,
    })
}
