use std::path::Path;

use crate::error::{Result, SubframeError};
use crate::frame::Frame;

use super::image_io::load_image;

/// Source of frames for batch measurement.
///
/// Implementations are shared between worker threads.
pub trait FrameLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Frame>;

    /// Whether `path` can be loaded at all. Used for pre-flight checks.
    fn exists(&self, _path: &Path) -> bool {
        true
    }
}

/// Loads frames from image files on the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileLoader;

impl FrameLoader for ImageFileLoader {
    fn load(&self, path: &Path) -> Result<Frame> {
        if !path.is_file() {
            return Err(SubframeError::MissingFile(path.to_path_buf()));
        }
        load_image(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
