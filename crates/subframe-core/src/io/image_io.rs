use std::path::Path;

use image::{ColorType, GrayImage, ImageBuffer, ImageFormat, Luma};
use ndarray::Array2;

use crate::error::{Result, SubframeError};
use crate::frame::Frame;

/// Scale `[0, 1]` pixel values to integer samples with `max` as full scale.
fn quantize<T>(frame: &Frame, max: f32, cast: impl Fn(f32) -> T) -> Vec<T> {
    frame
        .data
        .iter()
        .map(|&v| cast((v.clamp(0.0, 1.0) * max).round()))
        .collect()
}

fn dimension_error(frame: &Frame) -> SubframeError {
    SubframeError::InvalidDimensions {
        width: frame.width(),
        height: frame.height(),
    }
}

/// Save a frame as 16-bit grayscale TIFF.
pub fn save_tiff(frame: &Frame, path: &Path) -> Result<()> {
    let pixels = quantize(frame, u16::MAX as f32, |v| v as u16);
    let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(
        frame.width() as u32,
        frame.height() as u32,
        pixels,
    )
    .ok_or_else(|| dimension_error(frame))?;
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save a frame as 8-bit grayscale PNG.
pub fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    let pixels = quantize(frame, u8::MAX as f32, |v| v as u8);
    let img = GrayImage::from_raw(frame.width() as u32, frame.height() as u32, pixels)
        .ok_or_else(|| dimension_error(frame))?;
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save as PNG for a `.png` path, as 16-bit TIFF otherwise.
pub fn save_image(frame: &Frame, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => save_png(frame, path),
        _ => save_tiff(frame, path),
    }
}

/// Save a binary structure map: set pixels white, the rest black.
pub fn save_mask(mask: &Array2<bool>, path: &Path) -> Result<()> {
    let frame = Frame::new(mask.mapv(|set| if set { 1.0 } else { 0.0 }), 8);
    save_image(&frame, path)
}

/// Load an image file into a grayscale Frame.
///
/// Color images are converted to luminance. Floating point images keep their
/// full precision; integer images are normalized to [0, 1].
pub fn load_image(path: &Path) -> Result<Frame> {
    let img = image::open(path)?;
    let color = img.color();
    let (w, h) = (img.width() as usize, img.height() as usize);
    if w == 0 || h == 0 {
        return Err(SubframeError::InvalidDimensions { width: w, height: h });
    }

    let (values, bit_depth): (Vec<f32>, u8) = match color {
        ColorType::Rgb32F | ColorType::Rgba32F => (img.to_luma32f().into_raw(), 32),
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => {
            let raw = img.to_luma8().into_raw();
            (raw.into_iter().map(|v| v as f32 / 255.0).collect(), 8)
        }
        _ => {
            let raw = img.to_luma16().into_raw();
            (raw.into_iter().map(|v| v as f32 / 65535.0).collect(), 16)
        }
    };

    let data = Array2::from_shape_vec((h, w), values)
        .map_err(|_| SubframeError::InvalidDimensions { width: w, height: h })?;
    Ok(Frame::new(data, bit_depth))
}
