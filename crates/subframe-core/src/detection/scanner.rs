//! Structure scanner: turns a binary structure map into accepted stars.
//!
//! Structures are collected by growing row runs downward from each seed
//! pixel. Every collected pixel is erased from the map whether or not the
//! structure is accepted, so each pixel is considered at most once.

use ndarray::Array2;
use tracing::trace;

use crate::consts::CENTROID_PEAK_FRACTION;
use crate::frame::Rect;
use crate::stats;

use super::config::DetectorConfig;
use super::star::Star;

/// A connected run of structure pixels and its bounding rectangle.
struct Structure {
    points: Vec<(usize, usize)>,
    rect: Rect,
}

impl Structure {
    fn diameter(&self) -> usize {
        self.rect.width().max(self.rect.height())
    }
}

/// Find the stars of `image` covered by the structures of `mask`.
///
/// `mask` is consumed: on return it contains no set pixel.
pub fn find_stars(
    mask: &mut Array2<bool>,
    image: &Array2<f32>,
    config: &DetectorConfig,
) -> Vec<Star> {
    let (h, w) = mask.dim();
    let mut stars = Vec::new();
    let mut structures = 0usize;

    for y0 in 0..h {
        for x0 in 0..w {
            if !mask[[y0, x0]] {
                continue;
            }

            let structure = collect_structure(mask, x0, y0);
            for &(x, y) in &structure.points {
                mask[[y, x]] = false;
            }
            structures += 1;

            if let Some(star) = accept(&structure, image, config) {
                stars.push(star);
            }
        }
    }

    trace!(structures, stars = stars.len(), "Structure scan complete");
    stars
}

fn collect_structure(mask: &Array2<bool>, x0: usize, y0: usize) -> Structure {
    let (h, w) = mask.dim();
    let mut points = Vec::new();
    let mut rect = Rect::new(x0, y0, x0 + 1, y0 + 1);
    let (mut x, mut y) = (x0, y0);

    loop {
        points.push((x, y));

        let mut xa = x;
        while xa > 0 && mask[[y, xa - 1]] {
            xa -= 1;
            points.push((xa, y));
        }
        let mut xb = x;
        while xb + 1 < w && mask[[y, xb + 1]] {
            xb += 1;
            points.push((xb, y));
        }
        rect.x0 = rect.x0.min(xa);
        rect.x1 = rect.x1.max(xb + 1);

        if y + 1 >= h {
            break;
        }
        match (xa..=xb).find(|&c| mask[[y + 1, c]]) {
            Some(c) => {
                y += 1;
                x = c;
                rect.y1 = y + 1;
            }
            None => break,
        }
    }

    Structure { points, rect }
}

/// Apply the rejection rules in order. Returns the star if all pass.
fn accept(structure: &Structure, image: &Array2<f32>, config: &DetectorConfig) -> Option<Star> {
    let (h, w) = image.dim();
    let rect = structure.rect;

    if !is_extended(&rect) {
        return None;
    }
    if touches_border(&rect, w, h) {
        return None;
    }
    if !is_compact(structure, config.max_distortion) {
        return None;
    }

    let star = star_parameters(structure, image, config)?;

    if star.peak > config.upper_limit {
        return None;
    }
    if !is_above_background(&star, config.sensitivity) {
        return None;
    }
    if !is_centered(&star, image) {
        return None;
    }
    if !is_peaked(&rect, image, &star, config.peak_response) {
        return None;
    }

    Some(star)
}

/// More than one pixel in both directions.
fn is_extended(rect: &Rect) -> bool {
    rect.width() > 1 && rect.height() > 1
}

/// Structures touching the first or last row or column are truncated.
fn touches_border(rect: &Rect, width: usize, height: usize) -> bool {
    rect.x0 == 0 || rect.y0 == 0 || rect.x1 >= width || rect.y1 >= height
}

/// Fill fraction of the bounding square must exceed the distortion limit.
fn is_compact(structure: &Structure, max_distortion: f64) -> bool {
    let d = structure.diameter() as f64;
    structure.points.len() as f64 / (d * d) > max_distortion
}

fn is_above_background(star: &Star, sensitivity: f64) -> bool {
    star.background == 0.0 || (star.normalized - star.background) / star.background > sensitivity
}

/// The barycenter must fall on a bright pixel.
fn is_centered(star: &Star, image: &Array2<f32>) -> bool {
    let (col, row) = star.pixel();
    image
        .get([row, col])
        .is_some_and(|&v| v as f64 > CENTROID_PEAK_FRACTION * star.peak)
}

/// Rejects flat structures: the rectangle median must stay well below the peak.
fn is_peaked(rect: &Rect, image: &Array2<f32>, star: &Star, peak_response: f64) -> bool {
    let mut values = rect_values(image, rect);
    stats::median(&mut values) < peak_response * star.peak
}

fn rect_values(image: &Array2<f32>, rect: &Rect) -> Vec<f64> {
    let mut values = Vec::with_capacity(rect.area());
    for y in rect.y0..rect.y1 {
        for x in rect.x0..rect.x1 {
            values.push(image[[y, x]] as f64);
        }
    }
    values
}

fn star_parameters(
    structure: &Structure,
    image: &Array2<f32>,
    config: &DetectorConfig,
) -> Option<Star> {
    let (h, w) = image.dim();
    let rect = structure.rect;

    let background = local_background(image, &rect, config.background_expansion, w, h);
    let (x, y) = barycenter(image, &rect, config.xy_stretch)?;

    let mut flux = 0.0f64;
    let mut peak = 0.0f64;
    for &(px, py) in &structure.points {
        let v = image[[py, px]] as f64;
        flux += v;
        peak = peak.max(v);
    }
    let size = structure.points.len();
    let normalized = peak - (1.0 - config.peak_response) * flux / size as f64;

    Some(Star {
        x,
        y,
        size,
        flux,
        peak,
        normalized,
        background,
    })
}

/// Median of the ring of `expansion` pixels around `rect`.
fn local_background(
    image: &Array2<f32>,
    rect: &Rect,
    expansion: usize,
    width: usize,
    height: usize,
) -> f64 {
    let outer = rect.inflated(expansion, width, height);
    let bands = [
        Rect::new(outer.x0, outer.y0, outer.x1, rect.y0),
        Rect::new(outer.x0, rect.y0, rect.x0, rect.y1),
        Rect::new(outer.x0, rect.y1, outer.x1, outer.y1),
        Rect::new(rect.x1, rect.y0, outer.x1, rect.y1),
    ];

    let mut samples = Vec::new();
    for band in bands.iter().filter(|b| b.is_rect()) {
        samples.extend(rect_values(image, band));
    }
    stats::median(&mut samples)
}

/// Thresholded barycenter of the rectangle, snapped to the center of the
/// nearest pixel. `None` when nothing survives the threshold.
fn barycenter(image: &Array2<f32>, rect: &Rect, xy_stretch: f64) -> Option<(f64, f64)> {
    let mut values = rect_values(image, rect);
    let std = stats::stddev(&values);
    let median = stats::median(&mut values);
    let threshold = median + xy_stretch * std;
    if !threshold.is_finite() {
        return None;
    }
    let threshold = threshold.clamp(0.0, 1.0);

    let clipped = |v: f32| (v as f64).clamp(threshold, 1.0);
    let (lo, hi) = (rect.y0..rect.y1)
        .flat_map(|y| (rect.x0..rect.x1).map(move |x| (x, y)))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (x, y)| {
            let v = clipped(image[[y, x]]);
            (lo.min(v), hi.max(v))
        });
    let range = hi - lo;
    if range.is_nan() || range <= 0.0 {
        return None;
    }

    let (mut sx, mut sy, mut sz) = (0.0f64, 0.0f64, 0.0f64);
    for y in rect.y0..rect.y1 {
        for x in rect.x0..rect.x1 {
            let z = (clipped(image[[y, x]]) - lo) / range;
            if z > 0.0 {
                sx += z * x as f64;
                sy += z * y as f64;
                sz += z;
            }
        }
    }
    if sz <= 0.0 {
        return None;
    }

    Some(((sx / sz).round() + 0.5, (sy / sz).round() + 0.5))
}
