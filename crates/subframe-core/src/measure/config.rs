use serde::{Deserialize, Serialize};

use crate::detection::DetectorConfig;
use crate::error::{Result, SubframeError};
use crate::psf::PsfConfig;

use super::units::MeasureUnits;

/// Everything needed to measure one subframe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureConfig {
    /// Pedestal in data numbers, removed from every pixel before measuring.
    #[serde(default)]
    pub pedestal: f64,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub psf: PsfConfig,
    #[serde(default)]
    pub units: MeasureUnits,
}

impl MeasureConfig {
    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        self.units.validate()?;
        let max = self.units.resolution();
        if !self.pedestal.is_finite() || self.pedestal < 0.0 || self.pedestal > max {
            return Err(SubframeError::InvalidConfig {
                name: "pedestal",
                reason: format!("{} is outside [0, {max}]", self.pedestal),
            });
        }
        Ok(())
    }

    /// Pedestal in normalized [0, 1] pixel units.
    pub fn normalized_pedestal(&self) -> f64 {
        self.pedestal / self.units.resolution()
    }
}
