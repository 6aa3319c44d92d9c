mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use common::FWHM_TO_SIGMA;
use subframe_core::detection::Star;
use subframe_core::psf::lm::solve;
use subframe_core::psf::{fit_psf, fit_psfs, psf_radius, PsfConfig, PsfModel, PsfStatus};

fn star_at(col: usize, row: usize, size: usize) -> Star {
    Star {
        x: col as f64 + 0.5,
        y: row as f64 + 0.5,
        size,
        flux: 1.0,
        peak: 1.0,
        normalized: 1.0,
        background: 0.0,
    }
}

/// Elliptical Gaussian centered on pixel `(col, row)`; `theta` in degrees.
fn gaussian_image(
    size: usize,
    col: f64,
    row: f64,
    fwhm_x: f64,
    fwhm_y: f64,
    theta: f64,
) -> Array2<f32> {
    let (sin, cos) = theta.to_radians().sin_cos();
    let (sx, sy) = (fwhm_x * FWHM_TO_SIGMA, fwhm_y * FWHM_TO_SIGMA);
    Array2::from_shape_fn((size, size), |(r, c)| {
        let (dx, dy) = (c as f64 - col, r as f64 - row);
        let xr = dx * cos + dy * sin;
        let yr = -dx * sin + dy * cos;
        let q = (xr / sx).powi(2) + (yr / sy).powi(2);
        (0.1 + 0.6 * (-0.5 * q).exp()) as f32
    })
}

#[test]
fn test_fwhm_factors() {
    assert_abs_diff_eq!(PsfModel::Gaussian.fwhm_factor(), 1.5519);
    assert_abs_diff_eq!(PsfModel::Lorentzian.fwhm_factor(), 2.0, epsilon = 1e-12);
    let moffat4 = 2.0 * (2f64.powf(0.25) - 1.0).sqrt();
    assert_abs_diff_eq!(PsfModel::Moffat4.fwhm_factor(), moffat4, epsilon = 1e-12);
    assert_abs_diff_eq!(PsfModel::Gaussian.fwhm(2.0), 3.1038, epsilon = 1e-12);
}

#[test]
fn test_model_names_round_trip() {
    for model in PsfModel::ALL {
        assert_eq!(model.name().parse::<PsfModel>().unwrap(), model);
    }
    assert_eq!("Moffat25".parse::<PsfModel>().unwrap(), PsfModel::Moffat25);
    assert!("airy".parse::<PsfModel>().is_err());
    assert_eq!(PsfModel::Moffat15.beta(), Some(1.5));
    assert_eq!(PsfModel::Gaussian.beta(), None);
}

#[test]
fn test_psf_radius() {
    assert_eq!(psf_radius(&star_at(10, 10, 4)), 3);
    assert_eq!(psf_radius(&star_at(10, 10, 10)), 4);
    assert_eq!(psf_radius(&star_at(10, 10, 50)), 8);
}

#[test]
fn test_solve_linear_system() {
    let a = [[2.0, 1.0], [1.0, 3.0]];
    let x = solve(&a, &[3.0, 5.0]).unwrap();
    assert_abs_diff_eq!(x[0], 0.8, epsilon = 1e-12);
    assert_abs_diff_eq!(x[1], 1.4, epsilon = 1e-12);

    let singular = [[1.0, 2.0], [2.0, 4.0]];
    assert!(solve(&singular, &[1.0, 2.0]).is_none());
}

#[test]
fn test_fit_round_gaussian() {
    let image = gaussian_image(61, 30.0, 30.0, 4.0, 4.0, 0.0);
    let fit = fit_psf(&image, &star_at(30, 30, 16), &PsfConfig::default());

    assert_eq!(fit.status, PsfStatus::FittedOk);
    assert_abs_diff_eq!(fit.x, 30.5, epsilon = 1e-3);
    assert_abs_diff_eq!(fit.y, 30.5, epsilon = 1e-3);
    assert_abs_diff_eq!(fit.b, 0.1, epsilon = 1e-3);
    assert_abs_diff_eq!(fit.a, 0.6, epsilon = 1e-3);
    assert_abs_diff_eq!(fit.fwhm_x(), 4.0, epsilon = 0.02);
    assert_abs_diff_eq!(fit.fwhm_y(), 4.0, epsilon = 0.02);
    assert!(fit.eccentricity() < 0.1);
    assert!(fit.sx >= fit.sy);
    assert!(fit.mad < 1e-3);
}

#[test]
fn test_fit_off_center_star() {
    // Profile centered between pixels; the seed is the nearest pixel.
    let image = gaussian_image(41, 20.3, 19.8, 3.0, 3.0, 0.0);
    let config = PsfConfig {
        circular: true,
        ..PsfConfig::default()
    };
    let fit = fit_psf(&image, &star_at(20, 20, 12), &config);

    assert!(fit.is_ok());
    assert_abs_diff_eq!(fit.x, 20.8, epsilon = 1e-3);
    assert_abs_diff_eq!(fit.y, 20.3, epsilon = 1e-3);
    assert_abs_diff_eq!(fit.fwhm_x(), 3.0, epsilon = 0.02);
    assert_eq!(fit.sx, fit.sy);
    assert_eq!(fit.theta, 0.0);
    assert_eq!(fit.eccentricity(), 0.0);
}

#[test]
fn test_fit_elliptical_gaussian() {
    let image = gaussian_image(61, 30.0, 30.0, 5.0, 3.0, 30.0);
    let fit = fit_psf(&image, &star_at(30, 30, 49), &PsfConfig::default());

    assert!(fit.is_ok());
    assert_abs_diff_eq!(fit.fwhm_x(), 5.0, epsilon = 0.05);
    assert_abs_diff_eq!(fit.fwhm_y(), 3.0, epsilon = 0.05);
    assert_abs_diff_eq!(fit.theta, 30.0, epsilon = 0.5);
    let expected = (1.0f64 - (3.0f64 / 5.0).powi(2)).sqrt();
    assert_abs_diff_eq!(fit.eccentricity(), expected, epsilon = 0.01);
}

#[test]
fn test_fit_moffat() {
    let beta = 4.0;
    let fwhm = 3.5;
    let alpha = fwhm / (2.0 * (2f64.powf(1.0 / beta) - 1.0).sqrt());
    let image = Array2::from_shape_fn((41, 41), |(r, c)| {
        let d2 = (c as f64 - 20.0).powi(2) + (r as f64 - 20.0).powi(2);
        (0.05 + 0.5 * (1.0 + d2 / (alpha * alpha)).powf(-beta)) as f32
    });
    let config = PsfConfig {
        model: PsfModel::Moffat4,
        circular: false,
    };
    let fit = fit_psf(&image, &star_at(20, 20, 16), &config);

    assert!(fit.is_ok());
    assert_eq!(fit.beta, Some(4.0));
    assert_abs_diff_eq!(fit.fwhm_x(), fwhm, epsilon = 0.03);
    assert_abs_diff_eq!(fit.mean_sigma(), alpha, epsilon = 0.02);
}

#[test]
fn test_flat_patch_fails() {
    let image = Array2::from_elem((32, 32), 0.3f32);
    let fit = fit_psf(&image, &star_at(16, 16, 9), &PsfConfig::default());
    assert_eq!(fit.status, PsfStatus::Failed);
}

#[test]
fn test_fit_psfs_keeps_only_successful_fits() {
    let mut image = gaussian_image(80, 20.0, 20.0, 3.0, 3.0, 0.0);
    // Right half flat: the second seed has nothing to fit.
    for r in 0..80 {
        for c in 45..80 {
            image[[r, c]] = 0.1;
        }
    }
    let stars = [star_at(20, 20, 12), star_at(60, 40, 12)];
    let fits = fit_psfs(&image, &stars, &PsfConfig::default());
    assert_eq!(fits.len(), 1);
    assert_abs_diff_eq!(fits[0].x, 20.5, epsilon = 1e-3);
}
