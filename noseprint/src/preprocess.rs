//! Training-time image transform: resize-with-pad, then `[0, 1]` scaling.
//!
//! Mirrors `tf.image.resize_with_pad`: the image is scaled so its longer
//! side fits the target, resized bilinearly, and centered on a black
//! square canvas. Nothing is cropped or stretched.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

/// Default model input side length.
pub const INPUT_SIZE: u32 = 224;

/// A square RGB image as `f32` channels in `[0, 1]`, row-major,
/// channel-interleaved (HWC).
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    size: u32,
    data: Vec<f32>,
}

impl ImageTensor {
    /// Side length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Channel values, `size * size * 3` of them.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the RGB triple at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        let i = (y as usize * self.size as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// Scales `img` to fit a `size`x`size` square preserving aspect ratio and
/// pads the remainder with black, keeping the image centered.
pub fn resize_with_pad(img: &DynamicImage, size: u32) -> RgbImage {
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let mut canvas = RgbImage::new(size, size);
    if w == 0 || h == 0 || size == 0 {
        return canvas;
    }

    // Integer arithmetic keeps the longer side at exactly `size`.
    let long = w.max(h) as u64;
    let rw = ((w as u64 * size as u64 / long) as u32).clamp(1, size);
    let rh = ((h as u64 * size as u64 / long) as u32).clamp(1, size);

    let resized = if (rw, rh) == (w, h) {
        rgb
    } else {
        imageops::resize(&rgb, rw, rh, FilterType::Triangle)
    };
    let x = (size - rw) / 2;
    let y = (size - rh) / 2;
    imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
    canvas
}

/// Scales 8-bit channels linearly from `[0, 255]` to `[0, 1]`.
///
/// `img` must be square.
pub fn normalize(img: &RgbImage) -> ImageTensor {
    ImageTensor {
        size: img.width(),
        data: img.as_raw().iter().map(|&v| v as f32 / 255.0).collect(),
    }
}

/// Full transform: [`resize_with_pad`] followed by [`normalize`].
pub fn preprocess(img: &DynamicImage, size: u32) -> ImageTensor {
    normalize(&resize_with_pad(img, size))
}
