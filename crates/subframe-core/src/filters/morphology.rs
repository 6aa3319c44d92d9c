use ndarray::{s, Array2};

/// Maximum filter over the 3x3 neighborhood of every pixel.
///
/// Neighbors outside the image are not considered.
pub fn dilate_box3(data: &Array2<f32>) -> Array2<f32> {
    let (h, w) = data.dim();
    Array2::from_shape_fn((h, w), |(r, c)| {
        data.slice(s![
            r.saturating_sub(1)..(r + 2).min(h),
            c.saturating_sub(1)..(c + 2).min(w)
        ])
        .fold(f32::NEG_INFINITY, |m, &v| m.max(v))
    })
}
