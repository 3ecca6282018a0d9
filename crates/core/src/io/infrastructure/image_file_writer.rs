use std::path::Path;

use crate::io::domain::image_writer::ImageWriter;
use crate::shared::image::Image;

/// Writes an image file using the `image` crate.
///
/// Gray, RGB and RGBA layouts are written as-is.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, image: &Image) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = image.to_dynamic().ok_or_else(|| {
            format!(
                "Unsupported image layout: {}x{} with {} channels",
                image.width(),
                image.height(),
                image.channels()
            )
        })?;

        img.save(path)?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_rgb(width: u32, height: u32, r: u8, g: u8, b: u8) -> Image {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..(width * height) {
            data.extend([r, g, b]);
        }
        Image::new(data, width, height, 3)
    }

    #[test]
    fn test_write_creates_file_and_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faces").join("out.png");
        ImageFileWriter::new()
            .write(&path, &make_rgb(100, 80, 50, 100, 200))
            .unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_rgb_pixels_survive_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        ImageFileWriter::new()
            .write(&path, &make_rgb(50, 50, 50, 100, 200))
            .unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (50, 50));
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 200]);
    }

    #[test]
    fn test_gray_is_written_single_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        ImageFileWriter::new()
            .write(&path, &Image::filled(16, 16, 1, 77))
            .unwrap();

        let img = image::open(&path).unwrap();
        assert!(matches!(img, image::DynamicImage::ImageLuma8(_)));
        assert_eq!(img.to_luma8().get_pixel(3, 3).0, [77]);
    }

    #[test]
    fn test_unsupported_channel_count_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let image = Image::new(vec![0; 8], 2, 2, 2);
        let result = ImageFileWriter::new().write(&dir.path().join("x.png"), &image);
        assert!(result.is_err());
    }
}
