use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, SubframeError};
use crate::measure::{MeasureData, MeasureItem};

/// One input file of a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubframeItem {
    pub path: PathBuf,
    pub enabled: bool,
}

impl SubframeItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            enabled: true,
        }
    }

    pub fn disabled(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            enabled: false,
        }
    }
}

/// Shared abort flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation has been requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(SubframeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Answer of [`ProgressReporter::on_task_error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorDecision {
    Continue,
    Abort,
}

/// Thread-safe progress reporting for a batch.
///
/// `task_started` is called from worker threads; everything else from the
/// thread running [`run_batch`](super::run_batch). All methods default to no-ops.
pub trait ProgressReporter: Send + Sync {
    /// The batch is about to start `total` tasks; `skipped` files are disabled.
    fn begin(&self, _total: usize, _skipped: usize) {}

    fn task_started(&self, _index: usize, _path: &Path) {}

    /// A task was harvested. Cancelled tasks are not reported.
    fn task_finished(
        &self,
        _index: usize,
        _path: &Path,
        _result: std::result::Result<&MeasureData, &SubframeError>,
    ) {
    }

    /// Consulted under [`ErrorPolicy::AskCaller`](super::ErrorPolicy::AskCaller).
    fn on_task_error(&self, _index: usize, _path: &Path, _error: &SubframeError) -> ErrorDecision {
        ErrorDecision::Continue
    }

    fn finish(&self, _report: &BatchReport) {}
}

/// Reporter that ignores every event.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// A subframe that failed to measure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskFailure {
    pub index: usize,
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of a batch.
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// The batch was cancelled before every enabled file was attempted or finished.
    pub cancelled: bool,
    /// Measured subframes, sorted by input index.
    pub results: Vec<MeasureItem>,
    pub failures: Vec<TaskFailure>,
}

impl BatchReport {
    /// Files that ran to success or failure.
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} failed, {} skipped",
            self.succeeded, self.failed, self.skipped
        )
    }
}
