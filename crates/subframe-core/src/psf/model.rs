use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::GAUSSIAN_FWHM_FACTOR;

/// Analytic point spread function family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PsfModel {
    #[default]
    Gaussian,
    Moffat10,
    Moffat8,
    Moffat6,
    Moffat4,
    Moffat25,
    Moffat15,
    Lorentzian,
}

impl PsfModel {
    pub const ALL: [PsfModel; 8] = [
        PsfModel::Gaussian,
        PsfModel::Moffat10,
        PsfModel::Moffat8,
        PsfModel::Moffat6,
        PsfModel::Moffat4,
        PsfModel::Moffat25,
        PsfModel::Moffat15,
        PsfModel::Lorentzian,
    ];

    /// Moffat exponent. `None` for the Gaussian.
    pub fn beta(self) -> Option<f64> {
        match self {
            PsfModel::Gaussian => None,
            PsfModel::Moffat10 => Some(10.0),
            PsfModel::Moffat8 => Some(8.0),
            PsfModel::Moffat6 => Some(6.0),
            PsfModel::Moffat4 => Some(4.0),
            PsfModel::Moffat25 => Some(2.5),
            PsfModel::Moffat15 => Some(1.5),
            PsfModel::Lorentzian => Some(1.0),
        }
    }

    /// FWHM per unit of the fitted shape parameter.
    pub fn fwhm_factor(self) -> f64 {
        match self.beta() {
            None => GAUSSIAN_FWHM_FACTOR,
            Some(beta) => 2.0 * (2f64.powf(1.0 / beta) - 1.0).sqrt(),
        }
    }

    /// FWHM of a profile with shape parameter `sigma`.
    pub fn fwhm(self, sigma: f64) -> f64 {
        self.fwhm_factor() * sigma
    }

    pub fn name(self) -> &'static str {
        match self {
            PsfModel::Gaussian => "gaussian",
            PsfModel::Moffat10 => "moffat10",
            PsfModel::Moffat8 => "moffat8",
            PsfModel::Moffat6 => "moffat6",
            PsfModel::Moffat4 => "moffat4",
            PsfModel::Moffat25 => "moffat25",
            PsfModel::Moffat15 => "moffat15",
            PsfModel::Lorentzian => "lorentzian",
        }
    }
}

impl fmt::Display for PsfModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PsfModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        PsfModel::ALL
            .into_iter()
            .find(|m| m.name() == lower)
            .ok_or_else(|| {
                let names: Vec<&str> = PsfModel::ALL.iter().map(|m| m.name()).collect();
                format!("unknown PSF model '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// PSF fitting options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PsfConfig {
    #[serde(default)]
    pub model: PsfModel,
    /// Fit a single width instead of independent axes and rotation.
    #[serde(default)]
    pub circular: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PsfStatus {
    FittedOk,
    Failed,
}

/// Parameters of a fitted PSF.
///
/// Coordinates follow [`Star`](crate::detection::Star): pixel centers sit on
/// half-integer positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PsfFit {
    pub model: PsfModel,
    /// Local background.
    pub b: f64,
    /// Amplitude above background.
    pub a: f64,
    pub x: f64,
    pub y: f64,
    /// Shape parameter along the major axis. Always `sx >= sy`.
    pub sx: f64,
    pub sy: f64,
    /// Rotation of the major axis in degrees, in [0, 180).
    pub theta: f64,
    /// Moffat exponent, `None` for the Gaussian.
    pub beta: Option<f64>,
    /// Mean absolute residual relative to the amplitude.
    pub mad: f64,
    pub status: PsfStatus,
}

impl PsfFit {
    pub fn is_ok(&self) -> bool {
        self.status == PsfStatus::FittedOk
    }

    pub fn fwhm_x(&self) -> f64 {
        self.model.fwhm(self.sx)
    }

    pub fn fwhm_y(&self) -> f64 {
        self.model.fwhm(self.sy)
    }

    /// Geometric mean of both axes in shape-parameter units.
    pub fn mean_sigma(&self) -> f64 {
        (self.sx * self.sy).sqrt()
    }

    /// `sqrt(1 - (sy/sx)^2)`; 0 for a circular profile.
    pub fn eccentricity(&self) -> f64 {
        if self.sx <= 0.0 {
            return 0.0;
        }
        let ratio = self.sy / self.sx;
        (1.0 - ratio * ratio).max(0.0).sqrt()
    }
}
