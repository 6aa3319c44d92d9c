//! Starlet ("a trous") transform with the 5-tap B3 spline.

use ndarray::{Array2, Axis};

use crate::consts::B3_KERNEL;

/// Split an image into `num_layers` detail layers and a smooth residual.
///
/// Layer `j` holds the structures between scales `2^j` and `2^(j+1)`. The
/// layers and the residual sum back to the input exactly.
pub fn decompose(data: &Array2<f32>, num_layers: usize) -> (Vec<Array2<f32>>, Array2<f32>) {
    let mut layers = Vec::with_capacity(num_layers);
    let mut smooth = data.clone();

    for scale in 0..num_layers {
        let next = smooth_b3(&smooth, 1 << scale);
        layers.push(&smooth - &next);
        smooth = next;
    }

    (layers, smooth)
}

/// Separable B3 smoothing with `step - 1` holes between the kernel taps.
fn smooth_b3(data: &Array2<f32>, step: usize) -> Array2<f32> {
    let rows = dilated_pass(data, step, Axis(1));
    dilated_pass(&rows, step, Axis(0))
}

fn dilated_pass(data: &Array2<f32>, step: usize, axis: Axis) -> Array2<f32> {
    let len = data.len_of(axis);
    let half = (B3_KERNEL.len() / 2) as isize;
    let mut out = Array2::<f32>::zeros(data.dim());

    for (src, mut dst) in data.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
        for (i, d) in dst.iter_mut().enumerate() {
            *d = B3_KERNEL
                .iter()
                .enumerate()
                .map(|(k, &w)| {
                    let offset = (k as isize - half) * step as isize;
                    w * src[mirror_index(i as isize + offset, len)]
                })
                .sum();
        }
    }

    out
}

/// Fold an out-of-range index back into `[0, size)`.
///
/// Negative indices reflect about 0 (`-k -> k`); indices past the end
/// reflect about the last sample's outer edge (`size -> size - 1`).
pub fn mirror_index(idx: isize, size: usize) -> usize {
    if size <= 1 {
        return 0;
    }
    let m = idx.unsigned_abs() % (2 * size);
    if m < size {
        m
    } else {
        2 * size - 1 - m
    }
}
