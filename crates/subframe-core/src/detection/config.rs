use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_BACKGROUND_EXPANSION, DEFAULT_HOT_PIXEL_FILTER_RADIUS, DEFAULT_MAX_DISTORTION,
    DEFAULT_NOISE_LAYERS, DEFAULT_NOISE_REDUCTION_FILTER_RADIUS, DEFAULT_PEAK_RESPONSE,
    DEFAULT_SENSITIVITY, DEFAULT_STRUCTURE_LAYERS, DEFAULT_UPPER_LIMIT, DEFAULT_XY_STRETCH,
    MAX_BACKGROUND_EXPANSION, MAX_LAYER_PARAMETER, MAX_XY_STRETCH,
};
use crate::error::{Result, SubframeError};
use crate::frame::Rect;

/// Star detector parameters. Immutable for the duration of a measurement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Wavelet layers (as a Gaussian high-pass of size 2^n + 1) used to flatten the image.
    #[serde(default = "default_structure_layers")]
    pub structure_layers: usize,
    /// Low-pass layers applied to the structure channel only. 0 = disabled.
    #[serde(default = "default_noise_layers")]
    pub noise_layers: usize,
    /// Median filter radius for hot pixel removal. 0 = disabled.
    #[serde(default = "default_hot_pixel_filter_radius")]
    pub hot_pixel_filter_radius: usize,
    /// Also remove hot pixels from the image used to measure stars, not just
    /// from the structure map.
    #[serde(default)]
    pub apply_hot_pixel_filter_to_detection_image: bool,
    /// Half size of a Gaussian noise reduction filter. 0 = disabled.
    #[serde(default = "default_noise_reduction_filter_radius")]
    pub noise_reduction_filter_radius: usize,
    /// Minimum relative height of a star above its local background.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    /// Peakedness threshold for a structure to count as a star.
    #[serde(default = "default_peak_response")]
    pub peak_response: f64,
    /// Minimum fraction of the bounding square covered by star pixels.
    #[serde(default = "default_max_distortion")]
    pub max_distortion: f64,
    /// Stars with a peak above this value are rejected.
    #[serde(default = "default_upper_limit")]
    pub upper_limit: f64,
    /// Width in pixels of the ring used to measure local background.
    #[serde(default = "default_background_expansion")]
    pub background_expansion: usize,
    /// Stretch factor (in standard deviations) for barycenter thresholding.
    #[serde(default = "default_xy_stretch")]
    pub xy_stretch: f64,
    /// Optional region of interest; measurement is restricted to it.
    #[serde(default)]
    pub roi: Option<Rect>,
}

fn default_structure_layers() -> usize {
    DEFAULT_STRUCTURE_LAYERS
}
fn default_noise_layers() -> usize {
    DEFAULT_NOISE_LAYERS
}
fn default_hot_pixel_filter_radius() -> usize {
    DEFAULT_HOT_PIXEL_FILTER_RADIUS
}
fn default_noise_reduction_filter_radius() -> usize {
    DEFAULT_NOISE_REDUCTION_FILTER_RADIUS
}
fn default_sensitivity() -> f64 {
    DEFAULT_SENSITIVITY
}
fn default_peak_response() -> f64 {
    DEFAULT_PEAK_RESPONSE
}
fn default_max_distortion() -> f64 {
    DEFAULT_MAX_DISTORTION
}
fn default_upper_limit() -> f64 {
    DEFAULT_UPPER_LIMIT
}
fn default_background_expansion() -> usize {
    DEFAULT_BACKGROUND_EXPANSION
}
fn default_xy_stretch() -> f64 {
    DEFAULT_XY_STRETCH
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            structure_layers: DEFAULT_STRUCTURE_LAYERS,
            noise_layers: DEFAULT_NOISE_LAYERS,
            hot_pixel_filter_radius: DEFAULT_HOT_PIXEL_FILTER_RADIUS,
            apply_hot_pixel_filter_to_detection_image: false,
            noise_reduction_filter_radius: DEFAULT_NOISE_REDUCTION_FILTER_RADIUS,
            sensitivity: DEFAULT_SENSITIVITY,
            peak_response: DEFAULT_PEAK_RESPONSE,
            max_distortion: DEFAULT_MAX_DISTORTION,
            upper_limit: DEFAULT_UPPER_LIMIT,
            background_expansion: DEFAULT_BACKGROUND_EXPANSION,
            xy_stretch: DEFAULT_XY_STRETCH,
            roi: None,
        }
    }
}

impl DetectorConfig {
    /// Check every parameter against its valid range.
    pub fn validate(&self) -> Result<()> {
        check_range(
            "structure_layers",
            self.structure_layers as f64,
            1.0,
            MAX_LAYER_PARAMETER as f64,
        )?;
        check_range("noise_layers", self.noise_layers as f64, 0.0, MAX_LAYER_PARAMETER as f64)?;
        check_range(
            "hot_pixel_filter_radius",
            self.hot_pixel_filter_radius as f64,
            0.0,
            MAX_LAYER_PARAMETER as f64,
        )?;
        check_range(
            "noise_reduction_filter_radius",
            self.noise_reduction_filter_radius as f64,
            0.0,
            MAX_LAYER_PARAMETER as f64,
        )?;
        check_range("sensitivity", self.sensitivity, 0.0, 1.0)?;
        check_range("peak_response", self.peak_response, 0.0, 1.0)?;
        check_range("max_distortion", self.max_distortion, 0.0, 1.0)?;
        check_range("upper_limit", self.upper_limit, 0.0, 1.0)?;
        check_range(
            "background_expansion",
            self.background_expansion as f64,
            1.0,
            MAX_BACKGROUND_EXPANSION as f64,
        )?;
        check_range("xy_stretch", self.xy_stretch, 0.0, MAX_XY_STRETCH)?;
        if let Some(roi) = self.roi {
            if !roi.is_rect() {
                return Err(SubframeError::InvalidRoi(format!(
                    "({},{})-({},{}) has zero area",
                    roi.x0, roi.y0, roi.x1, roi.y1
                )));
            }
        }
        Ok(())
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(SubframeError::InvalidConfig {
            name,
            reason: format!("{value} is outside [{min}, {max}]"),
        });
    }
    Ok(())
}
