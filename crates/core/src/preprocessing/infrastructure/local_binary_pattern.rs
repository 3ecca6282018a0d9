use crate::preprocessing::domain::pipeline_state::PipelineState;
use crate::preprocessing::domain::preprocessing_step::{PreprocessingStep, StepError};
use crate::shared::image::Image;

/// Neighbour offsets `(dx, dy)`, clockwise from the top-left. The first
/// neighbour becomes the most significant bit.
const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

/// Texture encoding: each pixel becomes the 8-bit local binary pattern of
/// its 3x3 neighbourhood on the luma channel.
///
/// A bit is set when the neighbour is at least as bright as the centre.
/// Border pixels have an incomplete neighbourhood and are set to 0.
pub struct LocalBinaryPattern;

impl LocalBinaryPattern {
    fn encode(img: &Image) -> Image {
        let gray = img.to_gray();
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        let src = gray.as_raw();
        let mut out = vec![0u8; w * h];

        if w >= 3 && h >= 3 {
            for y in 1..h - 1 {
                for x in 1..w - 1 {
                    let center = src[y * w + x];
                    let mut code = 0u8;
                    for (dx, dy) in NEIGHBOURS {
                        let nx = (x as isize + dx) as usize;
                        let ny = (y as isize + dy) as usize;
                        code = (code << 1) | u8::from(src[ny * w + nx] >= center);
                    }
                    out[y * w + x] = code;
                }
            }
        }

        Image::new(out, w as u32, h as u32, 1)
    }
}

impl PreprocessingStep for LocalBinaryPattern {
    fn apply(&self, state: &mut PipelineState) -> Result<(), StepError> {
        state.map_images(Self::encode);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(data: Vec<u8>, w: u32, h: u32) -> Vec<u8> {
        let mut state = PipelineState::new(Image::new(data, w, h, 1));
        LocalBinaryPattern.apply(&mut state).unwrap();
        state.images()[0].data().to_vec()
    }

    #[test]
    fn test_flat_patch_sets_all_bits() {
        let out = encode(vec![50; 9], 3, 3);
        assert_eq!(out[4], 0b1111_1111);
    }

    #[test]
    fn test_bright_center_clears_all_bits() {
        let mut data = vec![10; 9];
        data[4] = 200;
        assert_eq!(encode(data, 3, 3)[4], 0);
    }

    #[test]
    fn test_bit_order_starts_top_left() {
        let mut data = vec![0; 9];
        data[4] = 100;
        data[0] = 255; // top-left → MSB
        data[3] = 255; // left → LSB
        assert_eq!(encode(data, 3, 3)[4], 0b1000_0001);
    }

    #[test]
    fn test_border_is_zero() {
        let out = encode(vec![50; 16], 4, 4);
        assert_eq!(out[0], 0);
        assert_eq!(out[3], 0);
        assert_eq!(out[5], 0b1111_1111);
    }

    #[test]
    fn test_tiny_image_is_all_zero() {
        assert_eq!(encode(vec![9; 4], 2, 2), vec![0; 4]);
    }

    #[test]
    fn test_color_input_becomes_gray() {
        let mut state = PipelineState::new(Image::filled(5, 5, 3, 40));
        LocalBinaryPattern.apply(&mut state).unwrap();
        assert_eq!(state.images()[0].channels(), 1);
    }
}
