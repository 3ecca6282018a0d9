use crate::detection::domain::eye_pair::EyePair;
use crate::shared::image::Image;
use crate::shared::region::Region;

/// Working state threaded through the steps of one preprocessing track.
///
/// Every image in the sequence is processed identically by each step. Face
/// regions describe one detection pass over the sequence, not one set per
/// image. Created per request, never shared between requests.
#[derive(Clone, Debug)]
pub struct PipelineState {
    images: Vec<Image>,
    faces: Option<Vec<Region>>,
    eyes: Option<EyePair>,
    angle: Option<f64>,
}

impl PipelineState {
    pub fn new(image: Image) -> Self {
        Self {
            images: vec![image],
            faces: None,
            eyes: None,
            angle: None,
        }
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut [Image] {
        &mut self.images
    }

    pub fn into_images(self) -> Vec<Image> {
        self.images
    }

    /// Replaces the image sequence; an empty replacement is ignored so the
    /// sequence never drops below one image.
    pub fn set_images(&mut self, images: Vec<Image>) {
        if images.is_empty() {
            log::warn!("Ignoring empty image replacement");
            return;
        }
        self.images = images;
    }

    /// Applies `f` to every image, replacing each with its result.
    pub fn map_images<F>(&mut self, mut f: F)
    where
        F: FnMut(&Image) -> Image,
    {
        for img in &mut self.images {
            *img = f(img);
        }
    }

    pub fn faces(&self) -> Option<&[Region]> {
        self.faces.as_deref()
    }

    pub fn set_faces(&mut self, faces: Vec<Region>) {
        self.faces = Some(faces);
    }

    pub fn eyes(&self) -> Option<&EyePair> {
        self.eyes.as_ref()
    }

    pub fn set_eyes(&mut self, eyes: EyePair) {
        self.eyes = Some(eyes);
    }

    pub fn angle(&self) -> Option<f64> {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angle = Some(angle);
    }

    /// Copies the face regions detected on `other` into this state.
    ///
    /// Images are left untouched, so the two tracks keep separate buffers.
    pub fn merge_detections(&mut self, other: &PipelineState) {
        self.faces = other.faces.clone();
    }
}
