use image::imageops::FilterType;

use crate::preprocessing::domain::pipeline_state::PipelineState;
use crate::preprocessing::domain::preprocessing_step::{PreprocessingStep, StepError};
use crate::shared::image::Image;

/// Scales every image to a `size` x `size` square so recognition models see
/// a fixed input shape.
pub struct Resize {
    size: u32,
}

impl Resize {
    pub fn new(size: u32) -> Self {
        Self { size: size.max(1) }
    }
}

impl PreprocessingStep for Resize {
    fn apply(&self, state: &mut PipelineState) -> Result<(), StepError> {
        for img in state.images_mut() {
            let dynimg = img.to_dynamic().ok_or_else(|| StepError::Failed {
                step: "resize",
                reason: format!("unsupported channel count {}", img.channels()),
            })?;
            let resized = dynimg.resize_exact(self.size, self.size, FilterType::Triangle);
            *img = Image::from_dynamic(resized);
        }
        Ok(())
    }
}
