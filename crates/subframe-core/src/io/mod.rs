pub mod image_io;
pub mod loader;

pub use image_io::{load_image, save_image, save_mask, save_png, save_tiff};
pub use loader::{FrameLoader, ImageFileLoader};
