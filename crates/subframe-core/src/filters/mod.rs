pub mod gaussian_blur;
pub mod median;
pub mod morphology;

pub use gaussian_blur::gaussian_filter_sized;
pub use median::hot_pixel_filter;
pub use morphology::dilate_box3;
