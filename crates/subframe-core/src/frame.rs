use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SubframeError};

/// A single-channel intensity image.
/// Pixel values are f32, nominally in [0.0, 1.0].
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    /// Sample bit depth of the decoded source (8, 16 or 32)
    pub original_bit_depth: u8,
}

impl Frame {
    pub fn new(data: Array2<f32>, bit_depth: u8) -> Self {
        Self {
            data,
            original_bit_depth: bit_depth,
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Copy of the pixels inside `roi`. The rectangle must lie inside the frame.
    pub fn crop(&self, roi: &Rect) -> Result<Frame> {
        let roi = roi.validated(self.width(), self.height())?;
        let view = self.data.slice(s![roi.y0..roi.y1, roi.x0..roi.x1]);
        Ok(Frame::new(view.to_owned(), self.original_bit_depth))
    }
}

/// Axis-aligned pixel rectangle. The bottom-right corner (x1, y1) is excluded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Rect {
    pub fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// A rectangle with non-zero area.
    pub fn is_rect(&self) -> bool {
        self.x1 > self.x0 && self.y1 > self.y0
    }

    /// Grow by `n` pixels on every side, clipped to a `width` x `height` image.
    pub fn inflated(&self, n: usize, width: usize, height: usize) -> Rect {
        Rect {
            x0: self.x0.saturating_sub(n),
            y0: self.y0.saturating_sub(n),
            x1: (self.x1 + n).min(width),
            y1: (self.y1 + n).min(height),
        }
    }

    /// Check that the rectangle has area and fits inside a `width` x `height` image.
    pub fn validated(&self, width: usize, height: usize) -> Result<Rect> {
        if !self.is_rect() {
            return Err(SubframeError::InvalidRoi(format!(
                "({},{})-({},{}) has zero area",
                self.x0, self.y0, self.x1, self.y1
            )));
        }
        if self.x1 > width || self.y1 > height {
            return Err(SubframeError::InvalidRoi(format!(
                "({},{})-({},{}) exceeds image dimensions ({width}x{height})",
                self.x0, self.y0, self.x1, self.y1
            )));
        }
        Ok(*self)
    }
}
