use approx::assert_abs_diff_eq;
use ndarray::Array2;

use subframe_core::filters::{dilate_box3, gaussian_filter_sized, hot_pixel_filter};

fn spike(h: usize, w: usize, row: usize, col: usize, value: f32) -> Array2<f32> {
    let mut data = Array2::from_elem((h, w), 0.1f32);
    data[[row, col]] = value;
    data
}

// ---------------------------------------------------------------------------
// Gaussian filters
// ---------------------------------------------------------------------------

#[test]
fn test_gaussian_filter_preserves_constant_image() {
    let data = Array2::from_elem((16, 16), 0.3f32);
    let out = gaussian_filter_sized(&data, 9);
    for v in out.iter() {
        assert_abs_diff_eq!(*v, 0.3, epsilon = 1e-5);
    }
}

#[test]
fn test_gaussian_filter_small_size_is_identity() {
    let data = spike(8, 8, 4, 4, 1.0);
    assert_eq!(gaussian_filter_sized(&data, 1), data);
    assert_eq!(gaussian_filter_sized(&data, 0), data);
}

#[test]
fn test_gaussian_filter_spreads_spike_and_keeps_flux() {
    let data = spike(21, 21, 10, 10, 1.1);
    let out = gaussian_filter_sized(&data, 5);
    assert!(out[[10, 10]] < 1.1);
    assert!(out[[10, 11]] > 0.1);
    assert_abs_diff_eq!(out.sum(), data.sum(), epsilon = 1e-3);
}

// ---------------------------------------------------------------------------
// Hot pixel filter
// ---------------------------------------------------------------------------

#[test]
fn test_hot_pixel_filter_removes_single_spike() {
    let data = spike(9, 9, 4, 4, 1.0);
    let out = hot_pixel_filter(&data, 1);
    assert_abs_diff_eq!(out[[4, 4]], 0.1);
}

#[test]
fn test_hot_pixel_filter_radius_zero_is_identity() {
    let data = spike(9, 9, 4, 4, 1.0);
    assert_eq!(hot_pixel_filter(&data, 0), data);
}

#[test]
fn test_hot_pixel_filter_larger_radius_removes_small_cluster() {
    let mut data = Array2::from_elem((15, 15), 0.1f32);
    for r in 6..9 {
        for c in 6..9 {
            data[[r, c]] = 1.0;
        }
    }
    // A 3x3 cluster survives a 3x3 median but not a radius-3 disc.
    assert_abs_diff_eq!(hot_pixel_filter(&data, 1)[[7, 7]], 1.0);
    assert_abs_diff_eq!(hot_pixel_filter(&data, 3)[[7, 7]], 0.1);
}

// ---------------------------------------------------------------------------
// Dilation
// ---------------------------------------------------------------------------

#[test]
fn test_dilate_box3_grows_spike_to_3x3() {
    let data = spike(7, 7, 3, 3, 1.0);
    let out = dilate_box3(&data);
    for r in 0..7 {
        for c in 0..7 {
            let inside = (2..=4).contains(&r) && (2..=4).contains(&c);
            let expected = if inside { 1.0 } else { 0.1 };
            assert_abs_diff_eq!(out[[r, c]], expected);
        }
    }
}

#[test]
fn test_dilate_box3_at_corner() {
    let data = spike(5, 5, 0, 0, 0.8);
    let out = dilate_box3(&data);
    assert_abs_diff_eq!(out[[1, 1]], 0.8);
    assert_abs_diff_eq!(out[[2, 2]], 0.1);
}
