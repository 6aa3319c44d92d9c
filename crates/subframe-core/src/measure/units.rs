use serde::{Deserialize, Serialize};

use crate::error::{Result, SubframeError};

/// Unit FWHM values are reported in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FwhmUnit {
    #[default]
    Pixels,
    Arcseconds,
}

/// Unit median, median mean deviation and noise are reported in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeUnit {
    #[default]
    Normalized,
    DataNumbers,
    Electrons,
}

/// Camera and optics description used to convert measurements into physical units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasureUnits {
    /// Image scale in arcseconds per pixel.
    #[serde(default = "default_subframe_scale")]
    pub subframe_scale: f64,
    /// Camera gain in electrons per data number.
    #[serde(default = "default_camera_gain")]
    pub camera_gain: f64,
    /// Camera ADC bit depth.
    #[serde(default = "default_camera_bits")]
    pub camera_bits: u8,
    #[serde(default)]
    pub fwhm_unit: FwhmUnit,
    #[serde(default)]
    pub range_unit: RangeUnit,
}

fn default_subframe_scale() -> f64 {
    1.0
}
fn default_camera_gain() -> f64 {
    1.0
}
fn default_camera_bits() -> u8 {
    16
}

impl Default for MeasureUnits {
    fn default() -> Self {
        Self {
            subframe_scale: default_subframe_scale(),
            camera_gain: default_camera_gain(),
            camera_bits: default_camera_bits(),
            fwhm_unit: FwhmUnit::default(),
            range_unit: RangeUnit::default(),
        }
    }
}

impl MeasureUnits {
    pub fn validate(&self) -> Result<()> {
        if !(1..=32).contains(&self.camera_bits) {
            return Err(SubframeError::InvalidConfig {
                name: "camera_bits",
                reason: format!("{} is outside [1, 32]", self.camera_bits),
            });
        }
        let positive = [
            ("subframe_scale", self.subframe_scale),
            ("camera_gain", self.camera_gain),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SubframeError::InvalidConfig {
                    name,
                    reason: format!("{value} must be positive"),
                });
            }
        }
        Ok(())
    }

    /// Largest data number of the camera: `2^bits - 1`.
    pub fn resolution(&self) -> f64 {
        2f64.powi(self.camera_bits as i32) - 1.0
    }

    /// Convert a FWHM in pixels to the configured unit.
    pub fn fwhm(&self, pixels: f64) -> f64 {
        match self.fwhm_unit {
            FwhmUnit::Pixels => pixels,
            FwhmUnit::Arcseconds => pixels * self.subframe_scale,
        }
    }

    /// Convert a normalized pixel value to the configured unit.
    pub fn range(&self, normalized: f64) -> f64 {
        match self.range_unit {
            RangeUnit::Normalized => normalized,
            RangeUnit::DataNumbers => normalized * self.resolution(),
            RangeUnit::Electrons => normalized * self.resolution() * self.camera_gain,
        }
    }

    pub fn fwhm_label(&self) -> &'static str {
        match self.fwhm_unit {
            FwhmUnit::Pixels => "px",
            FwhmUnit::Arcseconds => "\"",
        }
    }

    pub fn range_label(&self) -> &'static str {
        match self.range_unit {
            RangeUnit::Normalized => "",
            RangeUnit::DataNumbers => "DN",
            RangeUnit::Electrons => "e-",
        }
    }
}
