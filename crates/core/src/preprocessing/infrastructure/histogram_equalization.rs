use crate::preprocessing::domain::pipeline_state::PipelineState;
use crate::preprocessing::domain::preprocessing_step::{PreprocessingStep, StepError};
use crate::shared::image::Image;

/// Spreads intensities over the full range using the cumulative histogram.
///
/// Each color channel is equalized independently; alpha is left untouched.
/// A channel holding a single value has nothing to spread and is kept.
pub struct HistogramEqualization;

impl PreprocessingStep for HistogramEqualization {
    fn apply(&self, state: &mut PipelineState) -> Result<(), StepError> {
        for img in state.images_mut() {
            for c in 0..img.color_channels() {
                equalize_channel(img, c);
            }
        }
        Ok(())
    }
}

fn equalize_channel(img: &mut Image, channel: usize) {
    let channels = img.channels() as usize;
    let mut hist = [0u64; 256];
    for px in img.data().chunks_exact(channels) {
        hist[px[channel] as usize] += 1;
    }

    let total: u64 = hist.iter().sum();
    let mut cdf = [0u64; 256];
    let mut running = 0u64;
    for (i, count) in hist.iter().enumerate() {
        running += count;
        cdf[i] = running;
    }
    let cdf_min = cdf.iter().copied().find(|&v| v > 0).unwrap_or(0);
    if total == cdf_min {
        return;
    }

    let scale = 255.0 / (total - cdf_min) as f64;
    let mut lut = [0u8; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        let mapped = cdf[i].saturating_sub(cdf_min) as f64 * scale;
        *v = mapped.round().clamp(0.0, 255.0) as u8;
    }

    for px in img.data_mut().chunks_exact_mut(channels) {
        px[channel] = lut[px[channel] as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equalize(img: Image) -> Image {
        let mut state = PipelineState::new(img);
        HistogramEqualization.apply(&mut state).unwrap();
        state.into_images().remove(0)
    }

    #[test]
    fn test_stretches_narrow_range_to_full_range() {
        let data = vec![100, 100, 110, 110, 120, 120, 130, 130];
        let out = equalize(Image::new(data, 4, 2, 1));
        assert_eq!(*out.data().iter().min().unwrap(), 0);
        assert_eq!(*out.data().iter().max().unwrap(), 255);
    }

    #[test]
    fn test_preserves_ordering() {
        let data = vec![10, 20, 30, 40];
        let out = equalize(Image::new(data, 4, 1, 1));
        let d = out.data();
        assert!(d[0] < d[1] && d[1] < d[2] && d[2] < d[3]);
    }

    #[test]
    fn test_constant_image_unchanged() {
        let out = equalize(Image::filled(5, 5, 1, 77));
        assert!(out.data().iter().all(|&v| v == 77));
    }

    #[test]
    fn test_channels_equalized_independently() {
        // R varies, G constant
        let data = vec![10, 50, 0, 20, 50, 0];
        let out = equalize(Image::new(data, 2, 1, 3));
        let d = out.data();
        assert_eq!((d[0], d[3]), (0, 255));
        assert_eq!((d[1], d[4]), (50, 50));
    }
}
