use std::sync::Arc;

use crate::detection::domain::eye_pair::EyePair;
use crate::detection::domain::face_detector::FaceDetector;
use crate::preprocessing::domain::pipeline_state::PipelineState;
use crate::preprocessing::domain::preprocessing_step::{PreprocessingStep, StepError};
use crate::shared::image::Image;

/// Rotates the images so the eyes lie on a horizontal line.
///
/// Eyes are taken from the state when an earlier pass found them, otherwise
/// they are detected on the first image. The rotation pivots on the eye
/// midpoint; uncovered pixels become black. Afterwards the state carries
/// the applied angle and the eye positions in the aligned image.
///
/// Every image is rotated with the angle and pivot of the first image's
/// eyes. That matches the single crop a recognition request carries (its
/// detector keeps only the largest face); a state holding several crops
/// would misalign all but the first.
pub struct EyeAlignment {
    detector: Arc<dyn FaceDetector>,
}

impl EyeAlignment {
    pub fn new(detector: Arc<dyn FaceDetector>) -> Self {
        Self { detector }
    }

    fn locate_eyes(&self, state: &PipelineState) -> Result<EyePair, StepError> {
        if let Some(eyes) = state.eyes() {
            return Ok(*eyes);
        }
        match self.detector.detect_eyes(&state.images()[0]) {
            Ok(Some(eyes)) => Ok(eyes),
            Ok(None) => Err(StepError::NoFace),
            Err(e) => Err(StepError::Failed {
                step: "eye alignment",
                reason: e.to_string(),
            }),
        }
    }
}

impl PreprocessingStep for EyeAlignment {
    fn apply(&self, state: &mut PipelineState) -> Result<(), StepError> {
        let eyes = self.locate_eyes(state)?;
        let angle = eyes.angle_degrees();
        let (cx, cy) = eyes.midpoint();

        state.map_images(|img| rotate(img, (cx, cy), angle));

        let half = eyes.distance() / 2.0;
        let aligned = EyePair::from_points(Some((cx - half, cy)), Some((cx + half, cy)));
        if let Some(aligned) = aligned {
            state.set_eyes(aligned);
        }
        state.set_angle(angle);
        log::debug!("Aligned eyes: rotated {angle:.2} degrees about ({cx:.1}, {cy:.1})");
        Ok(())
    }
}

/// Rotates `img` by `angle_deg` about `center` with bilinear sampling.
///
/// A source line tilted by `angle_deg` (y pointing down) comes out
/// horizontal.
fn rotate(img: &Image, center: (f64, f64), angle_deg: f64) -> Image {
    if angle_deg == 0.0 {
        return img.clone();
    }
    let (w, h, c) = (
        img.width() as usize,
        img.height() as usize,
        img.channels() as usize,
    );
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let src = img.as_ndarray();
    let mut out = Image::filled(img.width(), img.height(), img.channels(), 0);
    let mut dst = out.as_ndarray_mut();

    for y in 0..h {
        for x in 0..w {
            let dx = x as f64 - center.0;
            let dy = y as f64 - center.1;
            let sx = center.0 + dx * cos - dy * sin;
            let sy = center.1 + dx * sin + dy * cos;
            if sx < 0.0 || sy < 0.0 || sx > (w - 1) as f64 || sy > (h - 1) as f64 {
                continue;
            }

            let x0 = sx.floor() as usize;
            let y0 = sy.floor() as usize;
            let x1 = (x0 + 1).min(w - 1);
            let y1 = (y0 + 1).min(h - 1);
            let fx = sx - x0 as f64;
            let fy = sy - y0 as f64;

            for ch in 0..c {
                let v00 = src[[y0, x0, ch]] as f64;
                let v10 = src[[y0, x1, ch]] as f64;
                let v01 = src[[y1, x0, ch]] as f64;
                let v11 = src[[y1, x1, ch]] as f64;
                let val = v00 * (1.0 - fx) * (1.0 - fy)
                    + v10 * fx * (1.0 - fy)
                    + v01 * (1.0 - fx) * fy
                    + v11 * fx * fy;
                dst[[y, x, ch]] = val.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::region::Region;
    use crate::shared::usage::Usage;
    use approx::assert_relative_eq;

    struct StubEyes {
        eyes: Option<EyePair>,
    }

    impl FaceDetector for StubEyes {
        fn detect_faces(
            &self,
            _images: &[Image],
            _usage: Usage,
        ) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            Ok(vec![])
        }

        fn detect_eyes(
            &self,
            _image: &Image,
        ) -> Result<Option<EyePair>, Box<dyn std::error::Error>> {
            Ok(self.eyes)
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect_faces(
            &self,
            _images: &[Image],
            _usage: Usage,
        ) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            Err("model not loaded".into())
        }

        fn detect_eyes(
            &self,
            _image: &Image,
        ) -> Result<Option<EyePair>, Box<dyn std::error::Error>> {
            Err("model not loaded".into())
        }
    }

    fn pair(l: (f64, f64), r: (f64, f64)) -> EyePair {
        EyePair::from_points(Some(l), Some(r)).unwrap()
    }

    fn step(eyes: Option<EyePair>) -> EyeAlignment {
        EyeAlignment::new(Arc::new(StubEyes { eyes }))
    }

    #[test]
    fn test_level_eyes_keep_image_and_record_zero_angle() {
        let data: Vec<u8> = (0..100).collect();
        let mut state = PipelineState::new(Image::new(data.clone(), 10, 10, 1));
        step(Some(pair((2.0, 5.0), (8.0, 5.0))))
            .apply(&mut state)
            .unwrap();
        assert_eq!(state.images()[0].data(), &data[..]);
        assert_relative_eq!(state.angle().unwrap(), 0.0);
    }

    #[test]
    fn test_tilted_eyes_record_angle_and_level_eye_pair() {
        let mut state = PipelineState::new(Image::filled(100, 100, 1, 80));
        step(Some(pair((30.0, 40.0), (70.0, 80.0))))
            .apply(&mut state)
            .unwrap();
        assert_relative_eq!(state.angle().unwrap(), 45.0, epsilon = 1e-9);
        let eyes = state.eyes().unwrap();
        assert_relative_eq!(eyes.left().center().1, eyes.right().center().1);
    }

    #[test]
    fn test_rotation_moves_pixel_onto_eye_line() {
        // bright pixel 10 px below the pivot, rotated by 90 degrees
        let mut img = Image::filled(41, 41, 1, 0);
        img.as_ndarray_mut()[[30, 20, 0]] = 255;
        let rotated = rotate(&img, (20.0, 20.0), 90.0);
        // source (20, 30) is sampled for destination (30, 20)
        assert_eq!(rotated.as_ndarray()[[20, 30, 0]], 255);
        assert_eq!(rotated.as_ndarray()[[30, 20, 0]], 0);
    }

    #[test]
    fn test_rotation_fills_uncovered_corners_black() {
        let img = Image::filled(20, 20, 3, 200);
        let rotated = rotate(&img, (10.0, 10.0), 45.0);
        assert_eq!(rotated.as_ndarray()[[0, 0, 0]], 0);
        assert_eq!(rotated.as_ndarray()[[10, 10, 0]], 200);
    }

    #[test]
    fn test_existing_eyes_skip_detection() {
        let mut state = PipelineState::new(Image::filled(50, 50, 1, 0));
        state.set_eyes(pair((10.0, 25.0), (40.0, 25.0)));
        // the stub would report no eyes; the stored pair must be used instead
        step(None).apply(&mut state).unwrap();
        assert!(state.angle().is_some());
    }

    #[test]
    fn test_no_eyes_is_no_face() {
        let mut state = PipelineState::new(Image::filled(50, 50, 1, 0));
        let result = step(None).apply(&mut state);
        assert!(matches!(result, Err(StepError::NoFace)));
        assert!(state.angle().is_none());
    }

    #[test]
    fn test_detector_error_is_step_failure() {
        let mut state = PipelineState::new(Image::filled(50, 50, 1, 0));
        let result = EyeAlignment::new(Arc::new(FailingDetector)).apply(&mut state);
        assert!(matches!(result, Err(StepError::Failed { .. })));
    }
}
