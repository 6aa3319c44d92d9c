//! Structure map construction.
//!
//! The structure map is a binary mask of candidate star pixels. The image is
//! flattened with a large-scale Gaussian high-pass, dilated, and binarized
//! either against its median absolute deviation (for almost-black synthetic
//! images) or against a wavelet noise estimate.

use ndarray::Array2;
use tracing::debug;

use crate::consts::{
    B3_NOISE_SCALING, NOISE_K, NOISE_MAX_ITERATIONS, NOISE_TOLERANCE, STRUCTURE_NOISE_LAYERS,
    STRUCTURE_NOISE_SIGMAS,
};
use crate::filters::{dilate_box3, gaussian_filter_sized, hot_pixel_filter};
use crate::stats;
use crate::wavelet::{decompose, noise_ksigma};

use super::config::DetectorConfig;
use super::scanner::find_stars;
use super::star::Star;

/// Both images produced while preparing detection.
pub struct StructureMaps {
    /// Image stars are measured on: hot pixel filtered and noise reduced if requested.
    pub detection: Array2<f32>,
    /// Binary structure mask.
    pub structures: Array2<bool>,
}

/// Image the scanner measures stars on.
///
/// Hot pixels are removed here when explicitly requested or when noise
/// reduction is active; the Gaussian noise reduction follows.
pub fn detection_image(intensity: &Array2<f32>, config: &DetectorConfig) -> Array2<f32> {
    detection_image_inner(intensity, config).0
}

fn detection_image_inner(intensity: &Array2<f32>, config: &DetectorConfig) -> (Array2<f32>, bool) {
    let nr = config.noise_reduction_filter_radius;
    let filter_hot_pixels = config.apply_hot_pixel_filter_to_detection_image || nr > 0;

    let mut image = if filter_hot_pixels {
        hot_pixel_filter(intensity, config.hot_pixel_filter_radius)
    } else {
        intensity.clone()
    };
    if nr > 0 {
        image = gaussian_filter_sized(&image, (nr << 1) | 1);
    }
    (image, filter_hot_pixels)
}

/// Build the binary structure map of an intensity image.
pub fn build_structure_map(intensity: &Array2<f32>, config: &DetectorConfig) -> Array2<bool> {
    let (detection, hot_pixels_removed) = detection_image_inner(intensity, config);
    structures_from(&detection, hot_pixels_removed, config)
}

/// Prepare the detection image and its structure map in one pass.
pub fn structure_maps(intensity: &Array2<f32>, config: &DetectorConfig) -> StructureMaps {
    let (detection, hot_pixels_removed) = detection_image_inner(intensity, config);
    let structures = structures_from(&detection, hot_pixels_removed, config);
    StructureMaps {
        detection,
        structures,
    }
}

/// Detect the stars of an intensity image.
pub fn detect_stars(intensity: &Array2<f32>, config: &DetectorConfig) -> Vec<Star> {
    let StructureMaps {
        detection,
        mut structures,
    } = structure_maps(intensity, config);
    find_stars(&mut structures, &detection, config)
}

fn structures_from(
    detection: &Array2<f32>,
    hot_pixels_removed: bool,
    config: &DetectorConfig,
) -> Array2<bool> {
    let (h, w) = detection.dim();
    let max_size = 2 * h.max(w) + 1;

    let mut map = if hot_pixels_removed {
        detection.clone()
    } else {
        hot_pixel_filter(detection, config.hot_pixel_filter_radius)
    };

    if config.noise_layers > 0 {
        let size = (1usize << config.noise_layers.min(usize::BITS as usize - 2)) + 1;
        map = gaussian_filter_sized(&map, size.min(max_size));
    }

    // Flatten large-scale gradients and nebulosity.
    let size = (1usize << config.structure_layers.min(usize::BITS as usize - 2)) + 1;
    let background = gaussian_filter_sized(&map, size.min(max_size));
    map.zip_mut_with(&background, |v, &b| *v = (*v - b).clamp(0.0, 1.0));
    stats::rescale(&mut map);

    let map = dilate_box3(&map);

    let median = stats::median_of(&map);
    let threshold = if 1.0 + median == 1.0 {
        // Almost all pixels are black: binarize against the clipped MAD.
        let mut samples: Vec<f64> = map
            .iter()
            .map(|&v| v as f64)
            .filter(|&v| v > 0.0 && v < 1.0)
            .collect();
        let clipped_median = stats::median(&mut samples);
        let threshold = clipped_median + stats::mad(&samples, clipped_median);
        debug!(threshold, "Structure map binarized by MAD");
        threshold
    } else {
        let (layers, _) = decompose(&map, STRUCTURE_NOISE_LAYERS);
        let (sigma, _) = noise_ksigma(&layers[1], NOISE_K, NOISE_TOLERANCE, NOISE_MAX_ITERATIONS);
        let noise = sigma / B3_NOISE_SCALING[1];
        let threshold = median + STRUCTURE_NOISE_SIGMAS * noise;
        debug!(median, noise, threshold, "Structure map binarized by noise");
        threshold
    };

    map.mapv(|v| v as f64 > threshold)
}
