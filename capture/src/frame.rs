use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, GrayImage, ImageReader, RgbImage, RgbaImage};

use crate::error::FrameError;

/// Pixel layout of a [`RawFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// 8-bit luma, one byte per pixel.
    Gray8,
    /// Packed 8-bit RGB.
    Rgb8,
    /// Packed 8-bit RGBA.
    Rgba8,
    /// Planar YUV 4:2:0 (I420): full-resolution Y plane, then U, then V
    /// at half resolution. The luma plane comes first, as camera
    /// analysis frames deliver it.
    Yuv420,
    /// A compressed still (JPEG, PNG, ...). Dimensions are read from the
    /// container header.
    Encoded,
}

/// An immutable camera frame.
///
/// Frames are produced by the camera collaborator, scored by the quality
/// gate, optionally fed to the embedding extractor and then dropped.
/// Cloning is cheap; the pixel buffer is shared and never mutated.
#[derive(Clone)]
pub struct RawFrame {
    data: Bytes,
    width: u32,
    height: u32,
    format: FrameFormat,
}

impl RawFrame {
    /// Wraps an uncompressed pixel buffer. The buffer must hold at least
    /// one full frame for the given format.
    pub fn new(
        data: impl Into<Bytes>,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Result<Self, FrameError> {
        let data = data.into();
        let need = match format {
            FrameFormat::Gray8 => pixels(width, height),
            FrameFormat::Rgb8 => pixels(width, height) * 3,
            FrameFormat::Rgba8 => pixels(width, height) * 4,
            FrameFormat::Yuv420 => pixels(width, height) + 2 * chroma_pixels(width, height),
            FrameFormat::Encoded => return Self::encoded(data),
        };
        if data.len() < need {
            return Err(FrameError::BufferTooShort {
                width,
                height,
                need,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    /// Wraps a compressed still image, probing its dimensions.
    pub fn encoded(data: impl Into<Bytes>) -> Result<Self, FrameError> {
        let data = data.into();
        if data.is_empty() {
            return Err(FrameError::Empty);
        }
        let (width, height) = ImageReader::new(Cursor::new(&data[..]))
            .with_guessed_format()
            .map_err(|e| FrameError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| FrameError::Decode(e.to_string()))?;
        Ok(Self {
            data,
            width,
            height,
            format: FrameFormat::Encoded,
        })
    }

    /// Creates a frame from 8-bit luma samples.
    pub fn gray(data: impl Into<Bytes>, width: u32, height: u32) -> Result<Self, FrameError> {
        Self::new(data, width, height, FrameFormat::Gray8)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    /// Raw buffer as supplied by the camera.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Returns the luma (grayscale) channel, one byte per pixel.
    ///
    /// Gray8 and Yuv420 frames borrow their luma plane directly. RGB
    /// frames are converted with integer BT.601 weights. Encoded frames
    /// are decoded first and then go through the same conversion, so a
    /// photo scores the same raw or compressed.
    pub fn luma(&self) -> Result<Cow<'_, [u8]>, FrameError> {
        let n = pixels(self.width, self.height);
        match self.format {
            FrameFormat::Gray8 | FrameFormat::Yuv420 => Ok(Cow::Borrowed(&self.data[..n])),
            FrameFormat::Rgb8 => Ok(Cow::Owned(
                self.data[..n * 3]
                    .chunks_exact(3)
                    .map(|p| bt601_luma(p[0], p[1], p[2]))
                    .collect(),
            )),
            FrameFormat::Rgba8 => Ok(Cow::Owned(
                self.data[..n * 4]
                    .chunks_exact(4)
                    .map(|p| bt601_luma(p[0], p[1], p[2]))
                    .collect(),
            )),
            FrameFormat::Encoded => Ok(Cow::Owned(match self.decode()? {
                DynamicImage::ImageLuma8(gray) => gray.into_raw(),
                img => img
                    .to_rgb8()
                    .pixels()
                    .map(|p| bt601_luma(p[0], p[1], p[2]))
                    .collect(),
            })),
        }
    }

    /// Decodes the frame into an [`image::DynamicImage`].
    pub fn decode(&self) -> Result<DynamicImage, FrameError> {
        let (w, h) = (self.width, self.height);
        let n = pixels(w, h);
        let img = match self.format {
            FrameFormat::Gray8 => GrayImage::from_raw(w, h, self.data[..n].to_vec()).map(DynamicImage::ImageLuma8),
            FrameFormat::Rgb8 => RgbImage::from_raw(w, h, self.data[..n * 3].to_vec()).map(DynamicImage::ImageRgb8),
            FrameFormat::Rgba8 => RgbaImage::from_raw(w, h, self.data[..n * 4].to_vec()).map(DynamicImage::ImageRgba8),
            FrameFormat::Yuv420 => Some(DynamicImage::ImageRgb8(self.i420_to_rgb())),
            FrameFormat::Encoded => {
                return image::load_from_memory(&self.data)
                    .map_err(|e| FrameError::Decode(e.to_string()));
            }
        };
        img.ok_or_else(|| FrameError::Decode(format!("invalid {:?} buffer for {w}x{h}", self.format)))
    }

    fn i420_to_rgb(&self) -> RgbImage {
        let (w, h) = (self.width as usize, self.height as usize);
        let cw = w.div_ceil(2);
        let y_plane = &self.data[..w * h];
        let u_plane = &self.data[w * h..w * h + chroma_pixels(self.width, self.height)];
        let v_plane = &self.data[w * h + u_plane.len()..w * h + 2 * u_plane.len()];

        let mut out = Vec::with_capacity(w * h * 3);
        for row in 0..h {
            for col in 0..w {
                let y = y_plane[row * w + col] as f32;
                let ci = (row / 2) * cw + col / 2;
                let u = u_plane[ci] as f32 - 128.0;
                let v = v_plane[ci] as f32 - 128.0;
                out.push(clamp_u8(y + 1.402 * v));
                out.push(clamp_u8(y - 0.344_136 * u - 0.714_136 * v));
                out.push(clamp_u8(y + 1.772 * u));
            }
        }
        // Length is exactly w*h*3 by construction.
        RgbImage::from_raw(self.width, self.height, out).unwrap_or_default()
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFrame")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

fn pixels(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

fn chroma_pixels(width: u32, height: u32) -> usize {
    (width as usize).div_ceil(2) * (height as usize).div_ceil(2)
}

fn bt601_luma(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32 + 128) >> 8) as u8
}

fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
