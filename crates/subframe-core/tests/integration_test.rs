mod common;

use approx::assert_abs_diff_eq;

use common::{single_star_frame, star_field, SyntheticStar};
use subframe_core::batch::CancellationToken;
use subframe_core::error::SubframeError;
use subframe_core::frame::{Frame, Rect};
use subframe_core::measure::{detect_frame, measure_frame, prepare_frame, MeasureConfig};
use subframe_core::psf::{PsfConfig, PsfModel};
use std::path::Path;

#[test]
fn test_single_star_measurement() {
    let frame = single_star_frame();
    let config = MeasureConfig::default();
    let token = CancellationToken::new();

    let detection = detect_frame(&frame, &config).unwrap();
    assert_eq!(detection.stars.len(), 1);
    assert_abs_diff_eq!(detection.stars[0].x, 50.5, epsilon = 0.5);
    assert_abs_diff_eq!(detection.stars[0].y, 50.5, epsilon = 0.5);
    assert!(detection.structures[[50, 50]]);

    let data = measure_frame(Path::new("single.tif"), &frame, &config, &token).unwrap();
    assert_eq!(data.star_count, 1);
    assert!((data.fwhm - 3.0).abs() < 0.3, "fwhm = {}", data.fwhm);
    // At 0.01 noise a free elliptical fit of one star scatters up to ~0.2.
    assert!(data.eccentricity < 0.3, "eccentricity = {}", data.eccentricity);
    assert!((data.median - 0.1).abs() < 0.01);
    assert!((data.noise - 0.01).abs() < 0.003, "noise = {}", data.noise);
    assert!(data.snr_weight > 0.0);
    assert!(data.star_residual > 0.0 && data.star_residual < 0.1);
}

#[test]
fn test_single_star_circular_fit_is_round() {
    let frame = single_star_frame();
    let config = MeasureConfig {
        psf: PsfConfig {
            model: PsfModel::Gaussian,
            circular: true,
        },
        ..MeasureConfig::default()
    };
    let data =
        measure_frame(Path::new("single.tif"), &frame, &config, &CancellationToken::new()).unwrap();
    assert!((data.fwhm - 3.0).abs() < 0.3, "fwhm = {}", data.fwhm);
    assert_eq!(data.eccentricity, 0.0);
}

#[test]
fn test_single_star_low_noise_is_round() {
    let star = SyntheticStar {
        col: 50.0,
        row: 50.0,
        amplitude: 0.8,
        fwhm: 3.0,
    };
    let frame = Frame::new(star_field(100, 100, 0.1, 0.002, &[star], 7), 32);
    let config = MeasureConfig::default();
    assert!(!config.psf.circular);

    let detection = detect_frame(&frame, &config).unwrap();
    assert_eq!(detection.stars.len(), 1);
    assert_abs_diff_eq!(detection.stars[0].x, 50.5, epsilon = 0.5);
    assert_abs_diff_eq!(detection.stars[0].y, 50.5, epsilon = 0.5);

    let data =
        measure_frame(Path::new("quiet.tif"), &frame, &config, &CancellationToken::new()).unwrap();
    assert_eq!(data.star_count, 1);
    assert!((data.fwhm - 3.0).abs() < 0.3, "fwhm = {}", data.fwhm);
    assert!(data.eccentricity < 0.1, "eccentricity = {}", data.eccentricity);
}

fn several_star_frame() -> Frame {
    let stars = [(30.0, 30.0), (90.0, 40.0), (60.0, 100.0), (130.0, 130.0)].map(|(col, row)| {
        SyntheticStar {
            col,
            row,
            amplitude: 0.6,
            fwhm: 3.0,
        }
    });
    Frame::new(star_field(160, 160, 0.1, 0.005, &stars, 21), 32)
}

#[test]
fn test_several_stars_with_roi() {
    let frame = several_star_frame();
    let token = CancellationToken::new();

    let all = measure_frame(Path::new("field.tif"), &frame, &MeasureConfig::default(), &token)
        .unwrap();
    assert_eq!(all.star_count, 4);

    // The region holds the first two stars only.
    let mut config = MeasureConfig::default();
    config.detector.roi = Some(Rect::new(0, 0, 120, 80));
    let cropped = measure_frame(Path::new("field.tif"), &frame, &config, &token).unwrap();
    assert_eq!(cropped.star_count, 2);
    assert!((cropped.fwhm - 3.0).abs() < 0.3);

    // Image statistics come from the full frame whatever the ROI.
    assert_abs_diff_eq!(cropped.median, all.median, epsilon = 1e-12);
    assert_abs_diff_eq!(cropped.noise, all.noise, epsilon = 1e-12);
    assert_abs_diff_eq!(cropped.median_mean_dev, all.median_mean_dev, epsilon = 1e-12);
}

#[test]
fn test_roi_detection_reports_source_coordinates() {
    let frame = several_star_frame();
    let mut config = MeasureConfig::default();
    config.detector.roi = Some(Rect::new(10, 10, 120, 80));
    let detection = detect_frame(&frame, &config).unwrap();
    assert_eq!(detection.structures.dim(), (70, 110));

    let mut centers: Vec<(usize, usize)> = detection.stars.iter().map(|s| s.pixel()).collect();
    centers.sort();
    assert_eq!(centers, vec![(30, 30), (90, 40)]);
}

#[test]
fn test_pedestal_is_removed() {
    let frame = single_star_frame();
    let mut config = MeasureConfig::default();
    config.pedestal = 0.05 * 65535.0;
    let prepared = prepare_frame(&frame, &config).unwrap();
    for (p, o) in prepared.data.iter().zip(frame.data.iter()) {
        assert_abs_diff_eq!(*p, (*o - 0.05).max(0.0), epsilon = 1e-6);
    }

    let data = measure_frame(Path::new("p.tif"), &frame, &config, &CancellationToken::new())
        .unwrap();
    assert!((data.median - 0.05).abs() < 0.01);
}

#[test]
fn test_roi_outside_frame_is_rejected() {
    let frame = single_star_frame();
    let mut config = MeasureConfig::default();
    config.detector.roi = Some(Rect::new(50, 50, 150, 80));
    let result = measure_frame(Path::new("x.tif"), &frame, &config, &CancellationToken::new());
    assert!(matches!(result, Err(SubframeError::InvalidRoi(_))));
}

#[test]
fn test_starless_frame() {
    let frame = Frame::new(star_field(80, 80, 0.1, 0.01, &[], 5), 32);
    let result = measure_frame(
        Path::new("empty.tif"),
        &frame,
        &MeasureConfig::default(),
        &CancellationToken::new(),
    );
    assert!(matches!(result, Err(SubframeError::NoStars)));
}

#[test]
fn test_cancelled_token_stops_measurement() {
    let token = CancellationToken::new();
    token.cancel();
    let result = measure_frame(
        Path::new("single.tif"),
        &single_star_frame(),
        &MeasureConfig::default(),
        &token,
    );
    assert!(matches!(result, Err(SubframeError::Cancelled)));
}
