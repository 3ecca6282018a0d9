use crate::preprocessing::domain::pipeline_state::PipelineState;
use crate::preprocessing::domain::preprocessing_step::{PreprocessingStep, StepError};
use crate::shared::image::Image;

/// Replaces the images with the detected face regions cut out of them.
///
/// Produces one image per (image, face) pair, in image-major order. Faces
/// are clamped to the image bounds. Without faces there is nothing to crop,
/// which is reported as [`StepError::NoFace`].
pub struct Crop;

impl PreprocessingStep for Crop {
    fn apply(&self, state: &mut PipelineState) -> Result<(), StepError> {
        let faces = match state.faces() {
            Some(faces) if !faces.is_empty() => faces.to_vec(),
            _ => return Err(StepError::NoFace),
        };

        let crops: Vec<Image> = state
            .images()
            .iter()
            .flat_map(|img| faces.iter().filter_map(move |face| img.crop(face)))
            .collect();

        if crops.is_empty() {
            return Err(StepError::NoFace);
        }
        state.set_images(crops);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::region::Region;

    fn state_with_faces(faces: Option<Vec<Region>>) -> PipelineState {
        let mut state = PipelineState::new(Image::filled(100, 80, 3, 50));
        if let Some(f) = faces {
            state.set_faces(f);
        }
        state
    }

    #[test]
    fn test_single_face_yields_single_crop() {
        let mut state = state_with_faces(Some(vec![Region::new(10, 20, 30, 40)]));
        Crop.apply(&mut state).unwrap();
        assert_eq!(state.images().len(), 1);
        let img = &state.images()[0];
        assert_eq!((img.width(), img.height()), (30, 40));
        assert_eq!(img.channels(), 3);
    }

    #[test]
    fn test_multiple_faces_yield_one_crop_each() {
        let mut state = state_with_faces(Some(vec![
            Region::new(0, 0, 10, 10),
            Region::new(50, 50, 20, 20),
        ]));
        Crop.apply(&mut state).unwrap();
        assert_eq!(state.images().len(), 2);
        assert_eq!(state.images()[1].width(), 20);
    }

    #[test]
    fn test_face_partly_outside_is_clamped() {
        let mut state = state_with_faces(Some(vec![Region::new(90, 70, 30, 30)]));
        Crop.apply(&mut state).unwrap();
        let img = &state.images()[0];
        assert_eq!((img.width(), img.height()), (10, 10));
    }

    #[test]
    fn test_unset_faces_is_no_face() {
        let mut state = state_with_faces(None);
        assert!(matches!(Crop.apply(&mut state), Err(StepError::NoFace)));
        assert_eq!(state.images()[0].width(), 100);
    }

    #[test]
    fn test_empty_faces_is_no_face() {
        let mut state = state_with_faces(Some(vec![]));
        assert!(matches!(Crop.apply(&mut state), Err(StepError::NoFace)));
    }

    #[test]
    fn test_faces_outside_image_is_no_face() {
        let mut state = state_with_faces(Some(vec![Region::new(500, 500, 10, 10)]));
        assert!(matches!(Crop.apply(&mut state), Err(StepError::NoFace)));
    }
}
