use ndarray::Array2;

/// Median filter used to remove hot (and cold) pixels.
///
/// Radius 1 uses a 3x3 box; larger radii use a circular structuring element
/// of diameter `2 * radius + 1`. Radius 0 returns the input unchanged.
/// Out-of-bounds neighbors are clamped to the nearest edge pixel.
pub fn hot_pixel_filter(data: &Array2<f32>, radius: usize) -> Array2<f32> {
    if radius == 0 {
        return data.clone();
    }
    let offsets = structure_offsets(radius);
    let (h, w) = data.dim();
    let mut result = Array2::<f32>::zeros((h, w));
    let mut window = vec![0.0f32; offsets.len()];

    for row in 0..h {
        for col in 0..w {
            for (slot, &(dr, dc)) in window.iter_mut().zip(offsets.iter()) {
                let r = (row as isize + dr).clamp(0, h as isize - 1) as usize;
                let c = (col as isize + dc).clamp(0, w as isize - 1) as usize;
                *slot = data[[r, c]];
            }
            let mid = window.len() / 2;
            result[[row, col]] = *window
                .select_nth_unstable_by(mid, |a, b| a.total_cmp(b))
                .1;
        }
    }

    result
}

fn structure_offsets(radius: usize) -> Vec<(isize, isize)> {
    let r = radius as isize;
    let mut offsets = Vec::new();
    for dr in -r..=r {
        for dc in -r..=r {
            // A 3x3 box for radius 1, a disc beyond that.
            if radius == 1 || dr * dr + dc * dc <= r * r {
                offsets.push((dr, dc));
            }
        }
    }
    offsets
}
