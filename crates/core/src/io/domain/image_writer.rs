use std::path::Path;

use crate::shared::image::Image;

/// Writes a single image to a file.
pub trait ImageWriter: Send {
    /// Writes an image to the given path; the format follows the extension.
    fn write(&self, path: &Path, image: &Image) -> Result<(), Box<dyn std::error::Error>>;
}
