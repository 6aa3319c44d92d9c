//! Per-subframe measurement: detection, PSF fitting and scoring of one frame.

use std::path::Path;
use std::time::Instant;

use ndarray::Array2;
use tracing::debug;

use crate::batch::CancellationToken;
use crate::detection::{find_stars, structure_maps, DetectorConfig, Star, StructureMaps};
use crate::error::{Result, SubframeError};
use crate::frame::Frame;
use crate::psf::fit_psfs;

use super::config::MeasureConfig;
use super::data::MeasureData;
use super::scoring::{image_stats, score};

/// Output of the star detector alone.
pub struct Detection {
    /// Star positions in source frame coordinates, ROI offset included.
    pub stars: Vec<Star>,
    /// Structure map before the scanner consumed it. Covers the ROI only.
    pub structures: Array2<bool>,
}

/// Remove the pedestal, then crop to the region of interest.
pub fn prepare_frame(frame: &Frame, config: &MeasureConfig) -> Result<Frame> {
    let full = remove_pedestal(frame, config)?;
    match &config.detector.roi {
        Some(roi) => full.crop(roi),
        None => Ok(full),
    }
}

fn remove_pedestal(frame: &Frame, config: &MeasureConfig) -> Result<Frame> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(SubframeError::InvalidDimensions {
            width: frame.width(),
            height: frame.height(),
        });
    }

    let mut prepared = frame.clone();
    let pedestal = config.normalized_pedestal() as f32;
    if pedestal > 0.0 {
        prepared.data.mapv_inplace(|v| (v - pedestal).max(0.0));
    }
    Ok(prepared)
}

/// Measure one subframe.
///
/// `token` is checked between stages; a cancelled token yields
/// [`SubframeError::Cancelled`].
pub fn measure_frame(
    path: &Path,
    frame: &Frame,
    config: &MeasureConfig,
    token: &CancellationToken,
) -> Result<MeasureData> {
    token.check()?;
    let start = Instant::now();
    let full = remove_pedestal(frame, config)?;
    let cropped = config
        .detector
        .roi
        .as_ref()
        .map(|roi| full.crop(roi))
        .transpose()?;

    // Median, noise and SNR describe the whole frame; only detection honors the ROI.
    let image = image_stats(&full.data);
    token.check()?;
    let frame = cropped.as_ref().unwrap_or(&full);

    let StructureMaps {
        detection,
        mut structures,
    } = structure_maps(&frame.data, &config.detector);
    token.check()?;

    let stars = find_stars(&mut structures, &detection, &config.detector);
    debug!(path = %path.display(), stars = stars.len(), "Stars detected");
    if stars.is_empty() {
        return Err(SubframeError::NoStars);
    }
    token.check()?;

    let fits = fit_psfs(&detection, &stars, &config.psf);
    debug!(path = %path.display(), fitted = fits.len(), "PSFs fitted");

    let data = score(path, &stars, &fits, config.psf.model, &image)?;
    debug!(
        path = %path.display(),
        fwhm = data.fwhm,
        eccentricity = data.eccentricity,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Subframe measured"
    );
    Ok(data)
}

/// Run only the star detector on a frame (after pedestal removal and ROI crop).
pub fn detect_frame(frame: &Frame, config: &MeasureConfig) -> Result<Detection> {
    config.detector.validate()?;
    let frame = prepare_frame(frame, config)?;
    let mut detection = detect_prepared(&frame.data, &config.detector);
    if let Some(roi) = &config.detector.roi {
        for star in &mut detection.stars {
            star.x += roi.x0 as f64;
            star.y += roi.y0 as f64;
        }
    }
    Ok(detection)
}

fn detect_prepared(data: &Array2<f32>, config: &DetectorConfig) -> Detection {
    let StructureMaps {
        detection,
        structures,
    } = structure_maps(data, config);
    let mut scratch = structures.clone();
    let stars = find_stars(&mut scratch, &detection, config);
    Detection { stars, structures }
}
