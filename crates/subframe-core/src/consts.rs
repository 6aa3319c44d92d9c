/// B3 spline 1D kernel coefficients: [1, 4, 6, 4, 1] / 16.
pub const B3_KERNEL: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Standard deviation of Gaussian white noise (sigma = 1) in each detail layer
/// of the 5x5 B3-spline a trous transform, indexed by layer.
pub const B3_NOISE_SCALING: [f64; 10] = [
    0.8907, 0.2007, 0.0856, 0.0413, 0.0205, 0.0103, 0.0052, 0.0026, 0.0013, 0.0007,
];

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-10;

/// Relative kernel value at the edge of a Gaussian filter built from a size.
pub const GAUSSIAN_FILTER_EDGE: f32 = 0.01;

/// Wavelet layers used to estimate noise when binarizing the structure map.
pub const STRUCTURE_NOISE_LAYERS: usize = 3;

/// Threshold multiplier applied to the noise sigma for natural images.
pub const STRUCTURE_NOISE_SIGMAS: f64 = 3.0;

/// A detected centroid must land on a pixel at least this fraction of the peak.
pub const CENTROID_PEAK_FRACTION: f64 = 0.85;

/// First wavelet scale tried by the noise estimator ladder.
pub const NOISE_START_LAYERS: usize = 4;

/// Minimum fraction of pixels classified as noise for an MRS estimate to be accepted.
pub const NOISE_MIN_FRACTION: f64 = 0.01;

/// Clipping factor for both k-sigma and MRS noise evaluation.
pub const NOISE_K: f64 = 3.0;

/// Relative convergence tolerance for k-sigma noise evaluation.
pub const NOISE_TOLERANCE: f64 = 0.01;

/// Maximum iterations for k-sigma noise evaluation.
pub const NOISE_MAX_ITERATIONS: usize = 10;

/// Relative convergence tolerance for MRS noise evaluation.
pub const MRS_TOLERANCE: f64 = 1e-4;

/// MRS evaluations allowed before the estimate is discarded as non-convergent.
pub const MRS_MAX_ITERATIONS: usize = 18;

/// MRS estimates read about 2% low; they are divided by this factor.
pub const MRS_BIAS: f64 = 0.974;

/// Pixels at or below this normalized value are excluded from MRS evaluation.
pub const MRS_LOW: f32 = 0.00002;

/// Pixels at or above this normalized value are excluded from MRS evaluation.
pub const MRS_HIGH: f32 = 0.99998;

/// Minimum half-size of the PSF sampling box, in pixels.
pub const PSF_MIN_RADIUS: usize = 3;

/// Initial PSF width as a fraction of the sampling box width.
pub const PSF_INITIAL_WIDTH_FRACTION: f64 = 0.15;

/// Below this |sx - sy| an elliptical fit is reported as circular.
pub const PSF_CIRCULAR_TOLERANCE: f64 = 0.01;

/// Gaussian FWHM per unit of the fitted shape parameter.
pub const GAUSSIAN_FWHM_FACTOR: f64 = 1.5519;

/// Default detector parameters.
pub const DEFAULT_STRUCTURE_LAYERS: usize = 5;
pub const DEFAULT_NOISE_LAYERS: usize = 0;
pub const DEFAULT_HOT_PIXEL_FILTER_RADIUS: usize = 1;
pub const DEFAULT_NOISE_REDUCTION_FILTER_RADIUS: usize = 0;
pub const DEFAULT_SENSITIVITY: f64 = 0.1;
pub const DEFAULT_PEAK_RESPONSE: f64 = 0.8;
pub const DEFAULT_MAX_DISTORTION: f64 = 0.5;
pub const DEFAULT_UPPER_LIMIT: f64 = 1.0;
pub const DEFAULT_BACKGROUND_EXPANSION: usize = 3;
pub const DEFAULT_XY_STRETCH: f64 = 1.5;

/// Upper bound shared by all wavelet layer and filter radius parameters.
pub const MAX_LAYER_PARAMETER: usize = 20;

/// Upper bound for the background expansion parameter.
pub const MAX_BACKGROUND_EXPANSION: usize = 10;

/// Upper bound for the xyStretch parameter.
pub const MAX_XY_STRETCH: f64 = 6.0;
