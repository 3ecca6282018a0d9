use crate::preprocessing::domain::pipeline_state::PipelineState;
use crate::preprocessing::domain::preprocessing_step::{PreprocessingStep, StepError};

/// Power-law brightness correction: `out = 255 * (in / 255)^gamma`.
///
/// Gamma below 1 brightens dark regions. Alpha is left untouched.
pub struct GammaCorrection {
    lut: [u8; 256],
}

impl GammaCorrection {
    pub fn new(gamma: f64) -> Self {
        let mut lut = [0u8; 256];
        for (i, v) in lut.iter_mut().enumerate() {
            let normalized = i as f64 / 255.0;
            *v = (255.0 * normalized.powf(gamma)).round().clamp(0.0, 255.0) as u8;
        }
        Self { lut }
    }
}

impl PreprocessingStep for GammaCorrection {
    fn apply(&self, state: &mut PipelineState) -> Result<(), StepError> {
        for img in state.images_mut() {
            let channels = img.channels() as usize;
            let color = img.color_channels();
            for px in img.data_mut().chunks_exact_mut(channels) {
                for v in px.iter_mut().take(color) {
                    *v = self.lut[*v as usize];
                }
            }
        }
        Ok(())
    }
}
