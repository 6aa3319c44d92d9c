//! PSF fitting around detected stars.
//!
//! Profiles are `B + A * g(q)` where `q` is the squared radius in units of the
//! shape parameters, measured along the rotated axes:
//!
//! ```text
//! x' =  dx cos(theta) + dy sin(theta)
//! y' = -dx sin(theta) + dy cos(theta)
//! q  = (x' / sx)^2 + (y' / sy)^2
//! ```
//!
//! Moffat profiles use `g = (1 + q)^-beta`. The Gaussian uses
//! `g = exp(-4 ln2 q / F^2)` with `F` = [`GAUSSIAN_FWHM_FACTOR`], so that its
//! FWHM is exactly `F` times the shape parameter.

use std::f64::consts::{FRAC_PI_2, LN_2, PI};

use ndarray::Array2;
use tracing::trace;

use crate::consts::{
    GAUSSIAN_FWHM_FACTOR, PSF_CIRCULAR_TOLERANCE, PSF_INITIAL_WIDTH_FRACTION, PSF_MIN_RADIUS,
};
use crate::detection::Star;
use crate::frame::Rect;
use crate::stats;

use super::lm::{optimize, LmConfig, LmModel, Samples};
use super::model::{PsfConfig, PsfFit, PsfModel, PsfStatus};

/// Smallest shape parameter the optimizer may reach.
const MIN_SHAPE: f64 = 1e-3;

#[derive(Clone, Copy)]
struct Profile {
    beta: Option<f64>,
}

impl Profile {
    fn new(model: PsfModel) -> Self {
        Self { beta: model.beta() }
    }

    /// `g(q)` and `dg/dq`.
    fn eval(&self, q: f64) -> (f64, f64) {
        match self.beta {
            None => {
                let k = 4.0 * LN_2 / (GAUSSIAN_FWHM_FACTOR * GAUSSIAN_FWHM_FACTOR);
                let g = (-k * q).exp();
                (g, -k * g)
            }
            Some(beta) => {
                let base = 1.0 + q;
                let g = base.powf(-beta);
                (g, -beta * g / base)
            }
        }
    }
}

/// Parameters: `[b, a, x0, y0, sx, sy, theta]`.
struct EllipticalPsf(Profile);

impl LmModel<7> for EllipticalPsf {
    fn evaluate(&self, x: f64, y: f64, p: &[f64; 7]) -> f64 {
        let (xr, yr) = rotate(x - p[2], y - p[3], p[6]);
        let q = (xr / p[4]).powi(2) + (yr / p[5]).powi(2);
        p[0] + p[1] * self.0.eval(q).0
    }

    fn jacobian_row(&self, x: f64, y: f64, p: &[f64; 7]) -> [f64; 7] {
        let (sin, cos) = p[6].sin_cos();
        let (xr, yr) = rotate(x - p[2], y - p[3], p[6]);
        let (sx2, sy2) = (p[4] * p[4], p[5] * p[5]);
        let q = xr * xr / sx2 + yr * yr / sy2;
        let (g, dg) = self.0.eval(q);
        let ad = p[1] * dg;

        let dq_dx0 = -2.0 * xr * cos / sx2 + 2.0 * yr * sin / sy2;
        let dq_dy0 = -2.0 * xr * sin / sx2 - 2.0 * yr * cos / sy2;
        let dq_dsx = -2.0 * xr * xr / (sx2 * p[4]);
        let dq_dsy = -2.0 * yr * yr / (sy2 * p[5]);
        let dq_dtheta = 2.0 * xr * yr * (1.0 / sx2 - 1.0 / sy2);

        [
            1.0,
            g,
            ad * dq_dx0,
            ad * dq_dy0,
            ad * dq_dsx,
            ad * dq_dsy,
            ad * dq_dtheta,
        ]
    }

    fn constrain(&self, p: &mut [f64; 7]) {
        p[4] = p[4].abs().max(MIN_SHAPE);
        p[5] = p[5].abs().max(MIN_SHAPE);
        p[6] = p[6].rem_euclid(PI);
    }
}

/// Parameters: `[b, a, x0, y0, s]`.
struct CircularPsf(Profile);

impl LmModel<5> for CircularPsf {
    fn evaluate(&self, x: f64, y: f64, p: &[f64; 5]) -> f64 {
        let q = ((x - p[2]).powi(2) + (y - p[3]).powi(2)) / (p[4] * p[4]);
        p[0] + p[1] * self.0.eval(q).0
    }

    fn jacobian_row(&self, x: f64, y: f64, p: &[f64; 5]) -> [f64; 5] {
        let (dx, dy) = (x - p[2], y - p[3]);
        let s2 = p[4] * p[4];
        let q = (dx * dx + dy * dy) / s2;
        let (g, dg) = self.0.eval(q);
        let ad = p[1] * dg;

        [
            1.0,
            g,
            ad * (-2.0 * dx / s2),
            ad * (-2.0 * dy / s2),
            ad * (-2.0 * q / p[4]),
        ]
    }

    fn constrain(&self, p: &mut [f64; 5]) {
        p[4] = p[4].abs().max(MIN_SHAPE);
    }
}

fn rotate(dx: f64, dy: f64, theta: f64) -> (f64, f64) {
    let (sin, cos) = theta.sin_cos();
    (dx * cos + dy * sin, -dx * sin + dy * cos)
}

/// Half size of the sampling box for a star: `max(3, ceil(sqrt(size)))`.
pub fn psf_radius(star: &Star) -> usize {
    ((star.size as f64).sqrt().ceil() as usize).max(PSF_MIN_RADIUS)
}

/// Fit every star and keep only the successful fits, in star order.
///
/// Runs on the calling thread; batch workers measure one subframe each.
pub fn fit_psfs(image: &Array2<f32>, stars: &[Star], config: &PsfConfig) -> Vec<PsfFit> {
    let fits: Vec<PsfFit> = stars
        .iter()
        .map(|star| fit_psf(image, star, config))
        .filter(PsfFit::is_ok)
        .collect();
    trace!(stars = stars.len(), fitted = fits.len(), "PSF fitting complete");
    fits
}

/// Fit a PSF to a box of pixels centered on `star`.
pub fn fit_psf(image: &Array2<f32>, star: &Star, config: &PsfConfig) -> PsfFit {
    let (h, w) = image.dim();
    let radius = psf_radius(star);
    let (col, row) = star.pixel();
    let rect = Rect::new(
        col.saturating_sub(radius),
        row.saturating_sub(radius),
        (col + radius + 1).min(w),
        (row + radius + 1).min(h),
    );

    let failed = PsfFit {
        model: config.model,
        b: 0.0,
        a: 0.0,
        x: star.x,
        y: star.y,
        sx: 0.0,
        sy: 0.0,
        theta: 0.0,
        beta: config.model.beta(),
        mad: 0.0,
        status: PsfStatus::Failed,
    };

    let n = rect.area();
    let n_params = if config.circular { 5 } else { 7 };
    if !rect.is_rect() || n <= n_params {
        return failed;
    }

    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    let mut zs = Vec::with_capacity(n);
    for r in rect.y0..rect.y1 {
        for c in rect.x0..rect.x1 {
            xs.push(c as f64 + 0.5);
            ys.push(r as f64 + 0.5);
            zs.push(image[[r, c]] as f64);
        }
    }
    let samples = Samples {
        x: &xs,
        y: &ys,
        z: &zs,
    };

    let b0 = initial_background(image, &rect);
    let a0 = zs.iter().copied().fold(f64::NEG_INFINITY, f64::max) - b0;
    if a0.is_nan() || a0 <= 0.0 {
        return failed;
    }
    let s0 = PSF_INITIAL_WIDTH_FRACTION * rect.width() as f64;
    let profile = Profile::new(config.model);
    let lm = LmConfig::default();

    let (b, a, x, y, mut sx, mut sy, mut theta, converged) = if config.circular {
        let initial = [b0, a0, star.x, star.y, s0];
        let result = optimize(&CircularPsf(profile), &samples, initial, &lm);
        let p = result.params;
        (p[0], p[1], p[2], p[3], p[4], p[4], 0.0, result.converged)
    } else {
        let result = optimize(
            &EllipticalPsf(profile),
            &samples,
            [b0, a0, star.x, star.y, s0, s0, 0.0],
            &lm,
        );
        let p = result.params;
        (p[0], p[1], p[2], p[3], p[4], p[5], p[6], result.converged)
    };

    if sx < sy {
        std::mem::swap(&mut sx, &mut sy);
        theta += FRAC_PI_2;
    }

    let fitted = EllipticalPsf(profile);
    let params = [b, a, x, y, sx, sy, theta];
    let residual: f64 = xs
        .iter()
        .zip(&ys)
        .zip(&zs)
        .map(|((&px, &py), &z)| (z - fitted.evaluate(px, py, &params)).abs())
        .sum();
    let mad = residual / n as f64 / a;

    theta = theta.to_degrees().rem_euclid(180.0);
    if theta >= 180.0 || (sx - sy).abs() < PSF_CIRCULAR_TOLERANCE {
        theta = 0.0;
    }

    let fit = PsfFit {
        model: config.model,
        b,
        a,
        x,
        y,
        sx,
        sy,
        theta,
        beta: config.model.beta(),
        mad,
        status: PsfStatus::FittedOk,
    };

    let inside = (rect.x0 as f64..=rect.x1 as f64).contains(&x)
        && (rect.y0 as f64..=rect.y1 as f64).contains(&y);
    let valid = converged
        && [b, a, x, y, sx, sy, mad].iter().all(|v| v.is_finite())
        && a > 0.0
        && sy > 0.0
        && inside
        && fit.fwhm_x() <= rect.width() as f64;

    if valid {
        fit
    } else {
        trace!(x = star.x, y = star.y, converged, a, sx, sy, "PSF fit rejected");
        PsfFit {
            status: PsfStatus::Failed,
            ..fit
        }
    }
}

/// Mean of the medians of the four box edges.
fn initial_background(image: &Array2<f32>, rect: &Rect) -> f64 {
    let edges = [
        Rect::new(rect.x0, rect.y0, rect.x1, rect.y0 + 1),
        Rect::new(rect.x0, rect.y1 - 1, rect.x1, rect.y1),
        Rect::new(rect.x0, rect.y0, rect.x0 + 1, rect.y1),
        Rect::new(rect.x1 - 1, rect.y0, rect.x1, rect.y1),
    ];
    let medians: Vec<f64> = edges
        .iter()
        .map(|e| {
            let mut values: Vec<f64> = (e.y0..e.y1)
                .flat_map(|r| (e.x0..e.x1).map(move |c| (r, c)))
                .map(|(r, c)| image[[r, c]] as f64)
                .collect();
            stats::median(&mut values)
        })
        .collect();
    stats::mean(&medians)
}
