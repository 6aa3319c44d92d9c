pub mod config;
pub mod scheduler;
pub mod types;

pub use config::{BatchConfig, ErrorPolicy};
pub use scheduler::run_batch;
pub use types::{
    BatchReport, CancellationToken, ErrorDecision, NoOpReporter, ProgressReporter, SubframeItem,
    TaskFailure,
};
