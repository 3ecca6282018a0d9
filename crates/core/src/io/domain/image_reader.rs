use std::path::Path;

use crate::shared::image::Image;

/// Loads a single image file into memory.
pub trait ImageReader: Send {
    fn read(&self, path: &Path) -> Result<Image, Box<dyn std::error::Error>>;
}
