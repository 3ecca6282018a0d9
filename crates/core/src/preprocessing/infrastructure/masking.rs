use crate::preprocessing::domain::pipeline_state::PipelineState;
use crate::preprocessing::domain::preprocessing_step::{PreprocessingStep, StepError};
use crate::shared::image::Image;

/// Blanks everything outside the ellipse inscribed in the image, keeping the
/// face oval and dropping hair and background at the corners.
pub struct Masking;

impl PreprocessingStep for Masking {
    fn apply(&self, state: &mut PipelineState) -> Result<(), StepError> {
        for img in state.images_mut() {
            mask_outside_ellipse(img);
        }
        Ok(())
    }
}

fn mask_outside_ellipse(img: &mut Image) {
    let w = img.width() as usize;
    let h = img.height() as usize;
    let channels = img.channels() as usize;
    let (semi_a, semi_b) = (w as f64 / 2.0, h as f64 / 2.0);
    if semi_a <= 0.0 || semi_b <= 0.0 {
        return;
    }

    let inv_a_sq = 1.0 / (semi_a * semi_a);
    let inv_b_sq = 1.0 / (semi_b * semi_b);
    let data = img.data_mut();

    for row in 0..h {
        for col in 0..w {
            // pixel centres
            let dx = col as f64 + 0.5 - semi_a;
            let dy = row as f64 + 0.5 - semi_b;
            if dx * dx * inv_a_sq + dy * dy * inv_b_sq > 1.0 {
                let offset = (row * w + col) * channels;
                data[offset..offset + channels].fill(0);
            }
        }
    }
}
