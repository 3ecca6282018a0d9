use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use ndarray::{ArrayView3, ArrayViewMut3};

use crate::shared::region::Region;

/// An 8-bit image: contiguous samples in row-major order, 1, 3 or 4 channels.
///
/// Pixel data is owned; cloning an `Image` copies the buffer, so two
/// pipeline tracks never share pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Image {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    /// Solid image filled with `value` in every channel.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Self {
        let len = (width as usize) * (height as usize) * (channels as usize);
        Self::new(vec![value; len], width, height, channels)
    }

    pub fn from_gray(img: GrayImage) -> Self {
        let (w, h) = img.dimensions();
        Self::new(img.into_raw(), w, h, 1)
    }

    /// Keeps gray and RGBA layouts, everything else becomes RGB.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        match img {
            DynamicImage::ImageLuma8(gray) => Self::from_gray(gray),
            DynamicImage::ImageLumaA8(la) => {
                Self::from_gray(DynamicImage::ImageLumaA8(la).to_luma8())
            }
            DynamicImage::ImageRgba8(rgba) => {
                let (w, h) = rgba.dimensions();
                Self::new(rgba.into_raw(), w, h, 4)
            }
            other => {
                let rgb = other.to_rgb8();
                let (w, h) = rgb.dimensions();
                Self::new(rgb.into_raw(), w, h, 3)
            }
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn is_gray(&self) -> bool {
        self.channels == 1
    }

    /// Channels carrying color or intensity; alpha is excluded.
    pub fn color_channels(&self) -> usize {
        if self.channels == 4 {
            3
        } else {
            self.channels as usize
        }
    }

    pub fn to_dynamic(&self) -> Option<DynamicImage> {
        let data = self.data.clone();
        match self.channels {
            1 => GrayImage::from_raw(self.width, self.height, data).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(self.width, self.height, data).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(self.width, self.height, data).map(DynamicImage::ImageRgba8),
            _ => None,
        }
    }

    /// Single-channel luma view of this image (a copy when already gray).
    pub fn to_gray(&self) -> GrayImage {
        if self.is_gray() {
            return GrayImage::from_raw(self.width, self.height, self.data.clone())
                .unwrap_or_else(|| GrayImage::new(self.width, self.height));
        }
        match self.to_dynamic() {
            Some(img) => img.to_luma8(),
            None => GrayImage::new(self.width, self.height),
        }
    }

    /// Copies out the part of `region` that lies inside the image.
    ///
    /// Returns `None` when the clamped region is empty.
    pub fn crop(&self, region: &Region) -> Option<Image> {
        let r = region.clamp_to(self.width, self.height)?;
        let (rx, ry) = (r.x as usize, r.y as usize);
        let (rw, rh) = (r.width as usize, r.height as usize);
        let c = self.channels as usize;
        let stride = self.width as usize * c;

        let mut out = Vec::with_capacity(rw * rh * c);
        for row in ry..ry + rh {
            let start = row * stride + rx * c;
            out.extend_from_slice(&self.data[start..start + rw * c]);
        }
        Some(Image::new(out, rw as u32, rh as u32, self.channels))
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Image data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Image data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let img = Image::new(data.clone(), 2, 2, 3);
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 2);
        assert_eq!(img.channels(), 3);
        assert!(!img.is_gray());
        assert_eq!(img.data(), &data[..]);
    }

    #[test]
    fn test_clone_is_independent() {
        let img = Image::filled(2, 2, 3, 100);
        let mut cloned = img.clone();
        cloned.data_mut()[0] = 0;
        assert_eq!(img.data()[0], 100);
        assert_eq!(cloned.data()[0], 0);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Image::new(vec![0u8; 10], 2, 2, 3);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        let mut data = vec![0u8; 12];
        data[6] = 255; // row=1, col=0, R
        let img = Image::new(data, 2, 2, 3);
        let arr = img.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_as_ndarray_mut_modification() {
        let mut img = Image::filled(2, 2, 1, 0);
        img.as_ndarray_mut()[[0, 1, 0]] = 128;
        assert_eq!(img.data()[1], 128);
    }

    #[test]
    fn test_from_dynamic_keeps_gray() {
        let gray = GrayImage::from_pixel(4, 3, image::Luma([42]));
        let img = Image::from_dynamic(DynamicImage::ImageLuma8(gray));
        assert_eq!(img.channels(), 1);
        assert_eq!((img.width(), img.height()), (4, 3));
    }

    #[test]
    fn test_from_dynamic_converts_16bit_to_rgb() {
        let dynimg = DynamicImage::new_rgb16(3, 2);
        let img = Image::from_dynamic(dynimg);
        assert_eq!(img.channels(), 3);
        assert_eq!(img.data().len(), 18);
    }

    #[test]
    fn test_to_gray_of_white_rgb_is_white() {
        let img = Image::filled(3, 3, 3, 255);
        let gray = img.to_gray();
        assert!(gray.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_crop_copies_rows() {
        // 4x4 gray where each pixel holds its index
        let data: Vec<u8> = (0..16).collect();
        let img = Image::new(data, 4, 4, 1);
        let cropped = img.crop(&Region::new(1, 1, 2, 2)).unwrap();
        assert_eq!(cropped.data(), &[5, 6, 9, 10]);
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let img = Image::filled(10, 10, 3, 7);
        let cropped = img.crop(&Region::new(-5, 8, 10, 10)).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (5, 2));
        assert_eq!(cropped.channels(), 3);
    }

    #[test]
    fn test_crop_outside_is_none() {
        let img = Image::filled(10, 10, 1, 0);
        assert!(img.crop(&Region::new(20, 20, 5, 5)).is_none());
    }
}
