use serde::{Deserialize, Serialize};

/// What the scheduler does when one subframe fails to measure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Tally the failure and keep going.
    #[default]
    Continue,
    /// Cancel every pending and running task.
    AbortBatch,
    /// Let the [`ProgressReporter`](super::ProgressReporter) decide.
    AskCaller,
}

/// Batch execution settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker threads. 0 = one per available CPU.
    #[serde(default)]
    pub workers: usize,
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

impl BatchConfig {
    /// Worker count after resolving 0 to the available parallelism.
    pub fn resolved_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}
