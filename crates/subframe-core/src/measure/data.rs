use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Quality measurements of one subframe. FWHM values are in pixels and
/// intensity values are normalized; see [`MeasureUnits`](super::MeasureUnits)
/// for conversion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureData {
    pub path: PathBuf,
    pub fwhm: f64,
    pub fwhm_mean_dev: f64,
    pub eccentricity: f64,
    pub eccentricity_mean_dev: f64,
    pub snr_weight: f64,
    pub median: f64,
    pub median_mean_dev: f64,
    pub noise: f64,
    pub noise_ratio: f64,
    pub star_count: usize,
    pub star_residual: f64,
    pub star_residual_mean_dev: f64,
}

impl MeasureData {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// A measured subframe as it appears in a result table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasureItem {
    /// Position of the file in the batch input.
    pub index: usize,
    pub enabled: bool,
    pub locked: bool,
    pub weight: f64,
    #[serde(flatten)]
    pub data: MeasureData,
}

impl MeasureItem {
    pub fn from_data(index: usize, data: MeasureData) -> Self {
        Self {
            index,
            enabled: true,
            locked: false,
            weight: 0.0,
            data,
        }
    }

    /// Display name: the file name, or the whole path if it has none.
    pub fn name(&self) -> String {
        self.data
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.data.path.display().to_string())
    }
}
