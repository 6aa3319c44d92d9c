/// A star accepted by the structure scanner.
///
/// Coordinates are continuous image coordinates: pixel `(col, row)` covers
/// `[col, col + 1) x [row, row + 1)`, so its center is at `(col + 0.5, row + 0.5)`.
/// The scanner reports them in the image it was given; `detect_frame` shifts
/// them back by the ROI origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    /// Barycenter x coordinate.
    pub x: f64,
    /// Barycenter y coordinate.
    pub y: f64,
    /// Number of pixels in the detected structure.
    pub size: usize,
    /// Sum of pixel values over the structure.
    pub flux: f64,
    /// Maximum pixel value over the structure.
    pub peak: f64,
    /// Peak corrected for peak response: `peak - (1 - peak_response) * flux / size`.
    pub normalized: f64,
    /// Median of the local background ring.
    pub background: f64,
}

impl Star {
    /// Column and row of the pixel containing the barycenter.
    pub fn pixel(&self) -> (usize, usize) {
        (self.x.max(0.0).floor() as usize, self.y.max(0.0).floor() as usize)
    }
}
