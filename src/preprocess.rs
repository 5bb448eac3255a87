//! Image preprocessing for Xception-family classifiers.
//!
//! The model expects an NHWC tensor of shape `[1, S, S, 3]` with every channel
//! value scaled into `[-1, 1]`. The resize target and filter have to match
//! what the model was trained with; a mismatch does not error, it just
//! degrades predictions.

use image::{RgbImage, imageops::FilterType};
use ndarray::Array4;

pub const DEFAULT_IMAGE_SIZE: u32 = 299;

#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    size: u32,
    filter: FilterType,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Preprocessor::new(DEFAULT_IMAGE_SIZE)
    }
}

impl Preprocessor {
    pub fn new(size: u32) -> Self {
        Preprocessor {
            size,
            filter: FilterType::Lanczos3,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Resize, normalize and add the batch axis.
    pub fn preprocess(&self, image: &RgbImage) -> Array4<f32> {
        let resized = resize(image, self.size, self.filter);
        to_input_tensor(&resized)
    }
}

/// Resize to exact dimensions, ignoring aspect ratio.
pub fn resize(image: &RgbImage, size: u32, filter: FilterType) -> RgbImage {
    if image.width() == size && image.height() == size {
        return image.clone();
    }
    image::imageops::resize(image, size, size, filter)
}

/// Maps a channel value from `[0, 255]` onto `[-1, 1]`.
#[inline]
pub fn scale_symmetric(value: u8) -> f32 {
    value as f32 / 127.5 - 1.0
}

/// Convert an RGB image into a `[1, H, W, 3]` tensor scaled into `[-1, 1]`.
pub fn to_input_tensor(image: &RgbImage) -> Array4<f32> {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let raw = image.as_raw();
    // RgbImage stores pixels row-major with interleaved channels, which is
    // already HWC order.
    Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| {
        scale_symmetric(raw[(y * w + x) * 3 + c])
    })
}
