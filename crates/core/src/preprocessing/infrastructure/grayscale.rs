use crate::preprocessing::domain::pipeline_state::PipelineState;
use crate::preprocessing::domain::preprocessing_step::{PreprocessingStep, StepError};
use crate::shared::image::Image;

/// Converts color images to single-channel luma; gray images pass through.
pub struct Grayscale;

impl PreprocessingStep for Grayscale {
    fn apply(&self, state: &mut PipelineState) -> Result<(), StepError> {
        for img in state.images_mut() {
            if !img.is_gray() {
                *img = Image::from_gray(img.to_gray());
            }
        }
        Ok(())
    }
}
