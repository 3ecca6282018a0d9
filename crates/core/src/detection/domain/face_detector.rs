use crate::detection::domain::eye_pair::EyePair;
use crate::shared::image::Image;
use crate::shared::region::Region;
use crate::shared::usage::Usage;

/// Domain interface for face and eye detection.
///
/// Detectors are shared between the orchestrator and the eye-alignment step,
/// and a step registry may be used from several threads, hence `&self` and
/// `Sync`. An empty result (no faces, `None` eyes) is the normal "nothing
/// found" answer; `Err` is reserved for failures of the detector itself.
pub trait FaceDetector: Send + Sync {
    /// Detects faces in the first image of `images`.
    ///
    /// `usage` lets the detector tune its answer to the consumer: recognition
    /// works on a single identity, detection wants every face.
    fn detect_faces(
        &self,
        images: &[Image],
        usage: Usage,
    ) -> Result<Vec<Region>, Box<dyn std::error::Error>>;

    /// Detects the left and right eye of the most prominent face.
    fn detect_eyes(&self, image: &Image) -> Result<Option<EyePair>, Box<dyn std::error::Error>>;
}
