mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use common::{single_star_frame, write_tiff};
use subframe_core::error::SubframeError;
use subframe_core::frame::Frame;
use subframe_core::io::{load_image, save_mask, save_png, FrameLoader, ImageFileLoader};

#[test]
fn test_tiff_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let frame = single_star_frame();
    let path = write_tiff(dir.path(), "star.tif", &frame);

    let loaded = load_image(&path).unwrap();
    assert_eq!(loaded.original_bit_depth, 16);
    assert_eq!(loaded.data.dim(), frame.data.dim());
    for (a, b) in loaded.data.iter().zip(frame.data.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 2.0 / 65535.0);
    }
}

#[test]
fn test_png_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let data = Array2::from_shape_fn((8, 12), |(r, c)| ((r * 12 + c) as f32) / 95.0);
    let path = dir.path().join("ramp.png");
    save_png(&Frame::new(data.clone(), 32), &path).unwrap();

    let loaded = load_image(&path).unwrap();
    assert_eq!(loaded.original_bit_depth, 8);
    assert_eq!((loaded.width(), loaded.height()), (12, 8));
    for (a, b) in loaded.data.iter().zip(data.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1.0 / 255.0 + 1e-6);
    }
}

#[test]
fn test_mask_is_saved_black_and_white() {
    let dir = tempfile::tempdir().unwrap();
    let mut mask = Array2::from_elem((6, 6), false);
    mask[[2, 3]] = true;
    let path = dir.path().join("mask.png");
    save_mask(&mask, &path).unwrap();

    let loaded = load_image(&path).unwrap();
    assert_eq!(loaded.data[[2, 3]], 1.0);
    assert_eq!(loaded.data[[0, 0]], 0.0);
}

#[test]
fn test_loader_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.tif");
    let loader = ImageFileLoader;

    assert!(!loader.exists(&path));
    match loader.load(&path) {
        Err(SubframeError::MissingFile(p)) => assert_eq!(p, path),
        other => panic!("expected MissingFile, got {other:?}"),
    }
}

#[test]
fn test_loader_rejects_non_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.tif");
    std::fs::write(&path, b"not an image").unwrap();
    assert!(ImageFileLoader.exists(&path));
    assert!(ImageFileLoader.load(&path).is_err());
}
