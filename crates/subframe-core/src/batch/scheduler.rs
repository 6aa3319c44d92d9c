//! Bounded worker pool driving subframe measurement over a batch of files.
//!
//! The calling thread owns dispatch. It submits at most one task per worker,
//! then blocks on the result channel; every harvested result frees a worker,
//! and only then is the next pending file submitted. The number of tasks in
//! flight therefore never exceeds the pool size.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::error::{Result, SubframeError};
use crate::io::FrameLoader;
use crate::measure::{measure_frame, MeasureConfig, MeasureData, MeasureItem};

use super::config::{BatchConfig, ErrorPolicy};
use super::types::{
    BatchReport, CancellationToken, ErrorDecision, ProgressReporter, SubframeItem, TaskFailure,
};

struct TaskResult {
    index: usize,
    path: PathBuf,
    result: Result<MeasureData>,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Measure every enabled file of `items`.
///
/// Returns [`SubframeError::NoEnabledFiles`] before starting when nothing is
/// enabled or [`SubframeError::MissingFile`] when no enabled file exists, and
/// [`SubframeError::NoImagesMeasured`] when every attempted file failed. A
/// panicking task fails as [`SubframeError::TaskPanicked`] without affecting
/// the others. A cancelled batch is not an error: the report has `cancelled`
/// set and holds whatever completed.
pub fn run_batch(
    items: &[SubframeItem],
    loader: Arc<dyn FrameLoader>,
    config: &MeasureConfig,
    batch: &BatchConfig,
    token: &CancellationToken,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<BatchReport> {
    config.validate()?;

    let mut pending: VecDeque<(usize, PathBuf)> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.enabled)
        .map(|(index, item)| (index, item.path.clone()))
        .collect();
    let total = pending.len();
    let skipped = items.len() - total;
    if total == 0 {
        return Err(SubframeError::NoEnabledFiles);
    }
    if pending.iter().all(|(_, path)| !loader.exists(path)) {
        return Err(SubframeError::MissingFile(pending[0].1.clone()));
    }

    let workers = batch.resolved_workers().min(total).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("subframe-worker-{i}"))
        .build()?;
    info!(total, skipped, workers, policy = ?batch.on_error, "Starting batch measurement");
    reporter.begin(total, skipped);

    let start = Instant::now();
    let config = Arc::new(config.clone());
    let (tx, rx) = mpsc::channel::<TaskResult>();

    let dispatch = |index: usize, path: PathBuf| {
        let tx = tx.clone();
        let loader = Arc::clone(&loader);
        let config = Arc::clone(&config);
        let reporter = Arc::clone(&reporter);
        let token = token.clone();
        debug!(index, path = %path.display(), "Dispatching subframe");
        pool.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                reporter.task_started(index, &path);
                token
                    .check()
                    .and_then(|_| loader.load(&path))
                    .and_then(|frame| measure_frame(&path, &frame, &config, &token))
            }))
            .unwrap_or_else(|payload| {
                Err(SubframeError::TaskPanicked(panic_message(&*payload)))
            });
            // The receiver outlives every task, and every task reports exactly once.
            let _ = tx.send(TaskResult {
                index,
                path,
                result,
            });
        });
    };

    let mut in_flight = 0usize;
    while in_flight < workers && !token.is_cancelled() {
        let Some((index, path)) = pending.pop_front() else {
            break;
        };
        dispatch(index, path);
        in_flight += 1;
    }

    let mut report = BatchReport {
        skipped,
        ..BatchReport::default()
    };

    while in_flight > 0 {
        let Ok(task) = rx.recv() else {
            break;
        };
        in_flight -= 1;

        match task.result {
            Ok(data) => {
                report.succeeded += 1;
                reporter.task_finished(task.index, &task.path, Ok(&data));
                report.results.push(MeasureItem::from_data(task.index, data));
            }
            Err(e) if e.is_cancellation() => {
                debug!(index = task.index, "Subframe cancelled");
            }
            Err(e) => {
                report.failed += 1;
                error!(
                    index = task.index,
                    path = %task.path.display(),
                    error = %e,
                    "Subframe failed"
                );
                reporter.task_finished(task.index, &task.path, Err(&e));

                let abort = match batch.on_error {
                    ErrorPolicy::Continue => false,
                    ErrorPolicy::AbortBatch => true,
                    ErrorPolicy::AskCaller => {
                        reporter.on_task_error(task.index, &task.path, &e) == ErrorDecision::Abort
                    }
                };
                if abort {
                    warn!(index = task.index, "Aborting batch after failure");
                    token.cancel();
                }

                report.failures.push(TaskFailure {
                    index: task.index,
                    path: task.path,
                    message: e.to_string(),
                });
            }
        }

        if token.is_cancelled() {
            continue;
        }
        if let Some((index, path)) = pending.pop_front() {
            dispatch(index, path);
            in_flight += 1;
        }
    }

    report.cancelled = token.is_cancelled();
    report.results.sort_by_key(|item| item.index);
    report.failures.sort_by_key(|failure| failure.index);

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        cancelled = report.cancelled,
        "{}",
        report.summary()
    );
    reporter.finish(&report);

    if report.succeeded == 0 && !report.cancelled {
        return Err(SubframeError::NoImagesMeasured {
            failed: report.failed,
        });
    }
    Ok(report)
}
