use crate::shared::constants::MAX_SIGMA;

/// Precompute a normalized 1D Gaussian kernel for `sigma`.
///
/// The radius is `ceil(3 * sigma)`, so the kernel length is always odd.
/// A non-positive or NaN sigma yields the identity kernel `[1.0]`; sigma is
/// capped at [`MAX_SIGMA`].
pub fn gaussian_kernel_1d(sigma: f64) -> Vec<f32> {
    if !(sigma > 0.0) {
        return vec![1.0];
    }
    let sigma = sigma.min(MAX_SIGMA);
    let radius = (3.0 * sigma).ceil() as usize;
    let size = 2 * radius + 1;
    let mut kernel_f64: Vec<f64> = (0..size)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel_f64.iter().sum();
    for v in &mut kernel_f64 {
        *v /= sum;
    }
    kernel_f64.iter().map(|&v| v as f32).collect()
}

/// Blur a single-channel plane with a separable kernel, clamping at borders.
///
/// Returns a new plane; `plane` must hold `width * height` samples.
pub fn separable_blur(plane: &[f32], width: usize, height: usize, kernel: &[f32]) -> Vec<f32> {
    let kernel_size = kernel.len();
    if kernel_size <= 1 || width == 0 || height == 0 {
        return plane.to_vec();
    }
    let half = kernel_size / 2;
    let mut temp = vec![0.0f32; width * height];
    let mut out = vec![0.0f32; width * height];

    // Horizontal pass: plane → temp
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let sx = (x as isize + k as isize - half as isize).clamp(0, (width - 1) as isize)
                    as usize;
                sum += plane[y * width + sx] * w;
            }
            temp[y * width + x] = sum;
        }
    }

    // Vertical pass: temp → out
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let sy = (y as isize + k as isize - half as isize).clamp(0, (height - 1) as isize)
                    as usize;
                sum += temp[sy * width + x] * w;
            }
            out[y * width + x] = sum;
        }
    }

    out
}
