use crate::preprocessing::domain::pipeline_state::PipelineState;
use crate::preprocessing::domain::preprocessing_step::{PreprocessingStep, StepError};
use crate::shared::image::Image;

use super::gaussian;

/// Band-pass contour extraction: the difference of two Gaussian blurs of
/// the luma channel, min-max normalized to `0..=255`.
///
/// Output images are single-channel. A flat difference maps to 0.
pub struct DifferenceOfGaussian {
    inner: Vec<f32>,
    outer: Vec<f32>,
}

impl DifferenceOfGaussian {
    /// `sigmas` are the inner (smaller) and outer blur widths.
    pub fn new(sigmas: [f64; 2]) -> Self {
        Self {
            inner: gaussian::gaussian_kernel_1d(sigmas[0]),
            outer: gaussian::gaussian_kernel_1d(sigmas[1]),
        }
    }

    fn filter(&self, img: &Image) -> Image {
        let gray = img.to_gray();
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        let plane: Vec<f32> = gray.as_raw().iter().map(|&v| v as f32).collect();

        let inner = gaussian::separable_blur(&plane, w, h, &self.inner);
        let outer = gaussian::separable_blur(&plane, w, h, &self.outer);
        let diff: Vec<f32> = inner.iter().zip(&outer).map(|(a, b)| a - b).collect();

        Image::new(normalize(&diff), w as u32, h as u32, 1)
    }
}

fn normalize(values: &[f32]) -> Vec<u8> {
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if !range.is_finite() || range <= f32::EPSILON {
        return vec![0; values.len()];
    }
    values
        .iter()
        .map(|v| ((v - min) / range * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect()
}

impl PreprocessingStep for DifferenceOfGaussian {
    fn apply(&self, state: &mut PipelineState) -> Result<(), StepError> {
        state.map_images(|img| self.filter(img));
        Ok(())
    }
}
