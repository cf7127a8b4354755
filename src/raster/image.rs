use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{MaskeditError, MaskeditResult};

/// Immutable in-memory bitmap: straight-alpha RGBA8, row-major.
///
/// Cloning is cheap; the pixel buffer is shared.
#[derive(Clone, Debug)]
pub struct RasterImage {
    width: u32,
    height: u32,
    rgba8: Arc<Vec<u8>>,
}

impl RasterImage {
    /// Decode encoded image bytes (PNG, JPEG, WebP, ...) into RGBA8.
    pub fn decode(bytes: &[u8]) -> MaskeditResult<Self> {
        let dyn_img = image::load_from_memory(bytes)
            .map_err(|e| MaskeditError::decode(format!("decode image from memory: {e}")))?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            rgba8: Arc::new(rgba.into_raw()),
        })
    }

    /// Wrap a raw straight-alpha RGBA8 buffer.
    pub fn from_rgba8(width: u32, height: u32, rgba8: Vec<u8>) -> MaskeditResult<Self> {
        if width == 0 || height == 0 {
            return Err(MaskeditError::validation("image dimensions must be nonzero"));
        }
        let expected = width as usize * height as usize * 4;
        if rgba8.len() != expected {
            return Err(MaskeditError::validation(format!(
                "rgba8 byte length {} does not match {width}x{height}",
                rgba8.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8: Arc::new(rgba8),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The straight-alpha RGBA8 pixel buffer.
    pub fn as_rgba8(&self) -> &[u8] {
        &self.rgba8
    }

    /// The RGBA8 value at `(x, y)`.
    ///
    /// Panics when `(x, y)` is outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.rgba8[i],
            self.rgba8[i + 1],
            self.rgba8[i + 2],
            self.rgba8[i + 3],
        ]
    }

    /// Encode as PNG (the lossless interchange format for masks and results).
    pub fn encode_png(&self) -> MaskeditResult<Vec<u8>> {
        let img = self.to_image_buffer()?;
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode png")?;
        Ok(buf)
    }

    /// Bilinear resample to `width` x `height`.
    ///
    /// Returns a cheap clone when the dimensions already match.
    pub fn resample(&self, width: u32, height: u32) -> MaskeditResult<Self> {
        if width == 0 || height == 0 {
            return Err(MaskeditError::validation(
                "resample dimensions must be nonzero",
            ));
        }
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        let img = self.to_image_buffer()?;
        let resized = image::imageops::resize(&img, width, height, image::imageops::FilterType::Triangle);
        Ok(Self {
            width,
            height,
            rgba8: Arc::new(resized.into_raw()),
        })
    }

    fn to_image_buffer(&self) -> MaskeditResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.rgba8.as_ref().clone())
            .ok_or_else(|| MaskeditError::validation("rgba8 buffer length mismatch"))
    }
}

/// Convert premultiplied RGBA8 (renderer output) back to straight alpha.
pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/image.rs"]
mod tests;
