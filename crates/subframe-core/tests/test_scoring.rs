use std::path::Path;

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use subframe_core::detection::Star;
use subframe_core::error::SubframeError;
use subframe_core::measure::{image_stats, score, score_fits, star_weights, ImageStats};
use subframe_core::psf::{PsfFit, PsfModel, PsfStatus};

fn fit(sx: f64, sy: f64, mad: f64) -> PsfFit {
    PsfFit {
        model: PsfModel::Gaussian,
        b: 0.1,
        a: 0.5,
        x: 10.5,
        y: 10.5,
        sx,
        sy,
        theta: 0.0,
        beta: None,
        mad,
        status: PsfStatus::FittedOk,
    }
}

fn star() -> Star {
    Star {
        x: 10.5,
        y: 10.5,
        size: 9,
        flux: 2.0,
        peak: 0.6,
        normalized: 0.5,
        background: 0.1,
    }
}

fn stats() -> ImageStats {
    ImageStats {
        median: 0.1,
        median_mean_dev: 0.02,
        noise: 0.01,
        noise_ratio: 0.9,
        snr_weight: 4.0,
    }
}

#[test]
fn test_star_weights_are_relative_to_best_fit() {
    let fits = [fit(2.0, 2.0, 0.02), fit(2.0, 2.0, 0.01), fit(2.0, 2.0, 0.04)];
    let weights = star_weights(&fits);
    assert_eq!(weights.len(), 3);
    assert_abs_diff_eq!(weights[0], 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(weights[1], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(weights[2], 0.25, epsilon = 1e-12);
    assert!(star_weights(&[]).is_empty());
}

#[test]
fn test_perfect_fit_does_not_divide_by_zero() {
    let weights = star_weights(&[fit(2.0, 2.0, 0.0), fit(2.0, 2.0, 0.01)]);
    assert_abs_diff_eq!(weights[0], 1.0);
    assert!(weights[1] > 0.0 && weights[1] < 1e-6);
}

#[test]
fn test_weighted_means() {
    let fits = [fit(2.0, 2.0, 0.01), fit(4.0, 4.0, 0.02)];
    let metrics = score_fits(&fits, PsfModel::Gaussian, 2).unwrap();

    // Weights 1.0 and 0.5.
    assert_abs_diff_eq!(metrics.fwhm, 1.5519 * 8.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(metrics.fwhm_mean_dev, 1.5519, epsilon = 1e-12);
    assert_abs_diff_eq!(metrics.eccentricity, 0.0);
    assert_abs_diff_eq!(metrics.star_residual, 0.02 / 1.5, epsilon = 1e-12);
    assert_abs_diff_eq!(metrics.star_residual_mean_dev, 0.005, epsilon = 1e-12);
    assert_eq!(metrics.star_count, 2);
}

#[test]
fn test_eccentricity_of_elongated_fits() {
    let fits = [fit(5.0, 3.0, 0.01), fit(5.0, 3.0, 0.01)];
    let metrics = score_fits(&fits, PsfModel::Gaussian, 2).unwrap();
    assert_abs_diff_eq!(metrics.eccentricity, 0.8, epsilon = 1e-12);
    assert_abs_diff_eq!(metrics.eccentricity_mean_dev, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(metrics.fwhm, 1.5519 * 15f64.sqrt(), epsilon = 1e-12);
}

#[test]
fn test_failed_fits_are_ignored() {
    let mut failed = fit(10.0, 10.0, 0.001);
    failed.status = PsfStatus::Failed;
    let metrics = score_fits(&[failed, fit(2.0, 2.0, 0.01)], PsfModel::Gaussian, 2).unwrap();
    assert_eq!(metrics.star_count, 1);
    assert_abs_diff_eq!(metrics.fwhm, 1.5519 * 2.0, epsilon = 1e-12);
}

#[test]
fn test_no_fits_is_an_error() {
    let mut failed = fit(2.0, 2.0, 0.01);
    failed.status = PsfStatus::Failed;
    assert!(matches!(
        score_fits(&[failed], PsfModel::Gaussian, 3),
        Err(SubframeError::NoPsfFits { stars: 3 })
    ));
}

#[test]
fn test_moffat_scale_factor() {
    let metrics = score_fits(&[fit(2.0, 2.0, 0.01)], PsfModel::Lorentzian, 1).unwrap();
    assert_abs_diff_eq!(metrics.fwhm, 4.0, epsilon = 1e-12);
}

#[test]
fn test_score_builds_record() {
    let fits = [fit(2.0, 2.0, 0.01)];
    let data = score(
        Path::new("a.tif"),
        &[star()],
        &fits,
        PsfModel::Gaussian,
        &stats(),
    )
    .unwrap();
    assert_eq!(data.path, Path::new("a.tif"));
    assert_eq!(data.star_count, 1);
    assert_abs_diff_eq!(data.fwhm, 3.1038, epsilon = 1e-12);
    assert_abs_diff_eq!(data.snr_weight, 4.0);
    assert_abs_diff_eq!(data.median, 0.1);
    assert_abs_diff_eq!(data.noise_ratio, 0.9);
}

#[test]
fn test_score_without_stars() {
    let result = score(Path::new("a.tif"), &[], &[], PsfModel::Gaussian, &stats());
    assert!(matches!(result, Err(SubframeError::NoStars)));
}

#[test]
fn test_image_stats_constant_image() {
    let data = Array2::from_elem((32, 32), 0.25f32);
    let s = image_stats(&data);
    assert_abs_diff_eq!(s.median, 0.25);
    assert_abs_diff_eq!(s.median_mean_dev, 0.0);
    assert_eq!(s.noise, 0.0);
    assert_eq!(s.snr_weight, 0.0);
}

#[test]
fn test_image_stats_two_levels() {
    // Half the pixels at 0.2, half at 0.4.
    let data = Array2::from_shape_fn((16, 16), |(r, _)| if r < 8 { 0.2f32 } else { 0.4 });
    let s = image_stats(&data);
    assert_abs_diff_eq!(s.median, 0.3, epsilon = 1e-6);
    assert_abs_diff_eq!(s.median_mean_dev, 0.1, epsilon = 1e-6);
}
