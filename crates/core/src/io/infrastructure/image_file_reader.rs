use std::path::Path;

use crate::io::domain::image_reader::ImageReader;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::image::Image;

/// Decodes image files with the `image` crate.
///
/// Gray and RGBA files keep their layout; every other format is converted
/// to 8-bit RGB.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }

    /// Whether `path` has one of the supported image extensions.
    pub fn is_supported(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Image, Box<dyn std::error::Error>> {
        let decoded = image::open(path)
            .map_err(|e| format!("Failed to open image {}: {e}", path.display()))?;
        let image = Image::from_dynamic(decoded);
        log::debug!(
            "Read {} ({}x{}, {} channel(s))",
            path.display(),
            image.width(),
            image.height(),
            image.channels()
        );
        Ok(image)
    }
}
