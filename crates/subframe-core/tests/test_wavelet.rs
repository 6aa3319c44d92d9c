mod common;

use approx::assert_abs_diff_eq;
use ndarray::{s, Array2};

use common::Lcg;
use subframe_core::consts::B3_NOISE_SCALING;
use subframe_core::wavelet::{decompose, estimate_noise, mirror_index, noise_ksigma, noise_mrs};

fn noise_image(h: usize, w: usize, level: f64, sigma: f64, seed: u64) -> Array2<f32> {
    let mut rng = Lcg::new(seed);
    Array2::from_shape_fn((h, w), |_| (level + sigma * rng.gaussian()) as f32)
}

#[test]
fn test_decompose_reconstructs_original() {
    let data = noise_image(32, 40, 0.5, 0.1, 1);
    let (layers, residual) = decompose(&data, 4);
    assert_eq!(layers.len(), 4);

    let mut sum = residual.clone();
    for layer in &layers {
        sum += layer;
    }
    for (a, b) in sum.iter().zip(data.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-5);
    }
}

#[test]
fn test_decompose_constant_image_has_zero_detail() {
    let data = Array2::from_elem((16, 16), 0.4f32);
    let (layers, residual) = decompose(&data, 3);
    for layer in &layers {
        assert!(layer.iter().all(|v| v.abs() < 1e-6));
    }
    assert_abs_diff_eq!(residual[[8, 8]], 0.4, epsilon = 1e-6);
}

#[test]
fn test_mirror_index() {
    assert_eq!(mirror_index(-1, 10), 1);
    assert_eq!(mirror_index(3, 10), 3);
    assert_eq!(mirror_index(10, 10), 9);
    assert_eq!(mirror_index(5, 1), 0);
}

#[test]
fn test_ksigma_of_first_layer_matches_white_noise_scaling() {
    let data = noise_image(128, 128, 0.0, 0.05, 3);
    let (layers, _) = decompose(&data, 1);
    let (sigma, count) = noise_ksigma(&layers[0], 3.0, 0.01, 10);
    let estimate = sigma / B3_NOISE_SCALING[0];
    assert!((estimate - 0.05).abs() < 0.05 * 0.1, "estimate = {estimate}");
    assert!(count > 128 * 128 * 9 / 10);
}

#[test]
fn test_estimate_noise_white_noise() {
    let data = noise_image(128, 128, 0.2, 0.02, 11);
    let noise = estimate_noise(&data);
    assert!((noise.sigma - 0.02).abs() < 0.02 * 0.15, "sigma = {}", noise.sigma);
    assert!(noise.fraction > 0.5);
    assert!(noise.layers >= 2);
}

#[test]
fn test_estimate_noise_ignores_bright_structures() {
    let mut data = noise_image(128, 128, 0.1, 0.01, 5);
    for r in 40..60 {
        for c in 40..60 {
            data[[r, c]] += 0.6;
        }
    }
    let noise = estimate_noise(&data);
    assert!(noise.sigma > 0.005 && noise.sigma < 0.015, "sigma = {}", noise.sigma);
}

#[test]
fn test_estimate_noise_constant_image_is_zero() {
    let data = Array2::from_elem((32, 32), 0.5f32);
    let noise = estimate_noise(&data);
    assert_eq!(noise.sigma, 0.0);
    assert_eq!(noise.layers, 0);
}

#[test]
fn test_estimate_noise_has_no_systematic_bias() {
    for seed in 1..=4 {
        let data = noise_image(256, 256, 0.1, 0.01, seed);
        let ratio = estimate_noise(&data).sigma / 0.01;
        assert!(ratio > 0.99 && ratio < 1.02, "seed {seed}: ratio = {ratio}");
    }
}

#[test]
fn test_mrs_excludes_saturated_pixels() {
    let mut data = noise_image(128, 128, 0.1, 0.01, 7);
    data.slice_mut(s![.., ..40]).fill(1.0);

    let noise = estimate_noise(&data);
    assert!((noise.sigma - 0.01).abs() < 0.01 * 0.03, "sigma = {}", noise.sigma);
    assert!(noise.fraction < 88.0 / 128.0);
}

#[test]
fn test_mrs_without_initial_sigma_seeds_from_image() {
    let data = noise_image(128, 128, 0.3, 0.02, 11);
    let (layers, residual) = decompose(&data, 4);

    let mrs = |sigma0: f64| noise_mrs(&data, &layers, &residual, &B3_NOISE_SCALING, sigma0, 3.0);
    let (seeded, seeded_count) = mrs(0.0195);
    let (unseeded, count) = mrs(0.0);
    assert!(unseeded > 0.0);
    assert_abs_diff_eq!(unseeded, seeded, epsilon = 1e-5);
    assert!(count > 0 && seeded_count > 0);
}

#[test]
fn test_mrs_on_constant_image_is_zero() {
    let data = Array2::from_elem((32, 32), 0.5f32);
    let (layers, residual) = decompose(&data, 4);
    assert_eq!(noise_mrs(&data, &layers, &residual, &B3_NOISE_SCALING, 0.0, 3.0), (0.0, 0));
}
