use serde::{Deserialize, Serialize};

use crate::batch::BatchConfig;
use crate::error::Result;
use crate::measure::MeasureConfig;

/// Complete configuration of a measurement run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubframeConfig {
    #[serde(default)]
    pub measure: MeasureConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

impl SubframeConfig {
    pub fn validate(&self) -> Result<()> {
        self.measure.validate()
    }
}
