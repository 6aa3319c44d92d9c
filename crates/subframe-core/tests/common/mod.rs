#![allow(dead_code)]

use std::path::{Path, PathBuf};

use ndarray::Array2;
use subframe_core::frame::Frame;
use subframe_core::io::save_tiff;

/// Gaussian sigma for a given FWHM.
pub const FWHM_TO_SIGMA: f64 = 1.0 / 2.354_820_045;

/// Small deterministic generator so every test sees the same noise.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407))
    }

    /// Uniform in (0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 11) as f64 + 0.5) / (1u64 << 53) as f64
    }

    /// Standard normal sample (Box-Muller).
    pub fn gaussian(&mut self) -> f64 {
        let u1 = self.next_f64();
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

/// A synthetic Gaussian star. `col`/`row` is the pixel the profile is centered on.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticStar {
    pub col: f64,
    pub row: f64,
    pub amplitude: f64,
    pub fwhm: f64,
}

/// Flat background plus Gaussian stars plus white noise, sampled at pixel centers.
pub fn star_field(
    width: usize,
    height: usize,
    background: f64,
    noise: f64,
    stars: &[SyntheticStar],
    seed: u64,
) -> Array2<f32> {
    let mut rng = Lcg::new(seed);
    Array2::from_shape_fn((height, width), |(r, c)| {
        let mut v = background;
        for s in stars {
            let sigma = s.fwhm * FWHM_TO_SIGMA;
            let d2 = (c as f64 - s.col).powi(2) + (r as f64 - s.row).powi(2);
            v += s.amplitude * (-d2 / (2.0 * sigma * sigma)).exp();
        }
        if noise > 0.0 {
            v += noise * rng.gaussian();
        }
        v as f32
    })
}

/// The 100x100 reference scene: one FWHM 3 star peaking at 0.9 over a 0.1
/// background, with 0.01 noise.
pub fn single_star_data() -> Array2<f32> {
    let star = SyntheticStar {
        col: 50.0,
        row: 50.0,
        amplitude: 0.8,
        fwhm: 3.0,
    };
    star_field(100, 100, 0.1, 0.01, &[star], 7)
}

pub fn single_star_frame() -> Frame {
    Frame::new(single_star_data(), 32)
}

/// Write a frame as 16-bit TIFF inside `dir`.
pub fn write_tiff(dir: &Path, name: &str, frame: &Frame) -> PathBuf {
    let path = dir.join(name);
    save_tiff(frame, &path).unwrap();
    path
}
