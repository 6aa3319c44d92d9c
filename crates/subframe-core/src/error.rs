use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubframeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("No such file exists on the local filesystem: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Invalid region of interest: {0}")]
    InvalidRoi(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidConfig { name: &'static str, reason: String },

    #[error("No stars detected")]
    NoStars,

    #[error("No PSF fits succeeded ({stars} star(s) detected)")]
    NoPsfFits { stars: usize },

    #[error("No images were measured: empty subframe list or no enabled subframes")]
    NoEnabledFiles,

    #[error("No image could be measured ({failed} failed)")]
    NoImagesMeasured { failed: usize },

    #[error("Measurement task panicked: {0}")]
    TaskPanicked(String),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Process aborted")]
    Cancelled,
}

impl SubframeError {
    /// True for user- or policy-triggered aborts, as opposed to measurement failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, SubframeError>;
