//! Texture decoding into RGBA8 before GPU upload.

use std::path::Path;

use anyhow::{Context, Result, ensure};
use corelib::Color;

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureData {
    /// Wrap raw RGBA8 pixels. Fails if the buffer length does not match.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        ensure!(
            data.len() == expected,
            "RGBA8 data is {} bytes, expected {expected} for {width}x{height}",
            data.len()
        );
        Ok(Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        })
    }

    /// Decode an image file (PNG/JPEG) and convert it to RGBA8.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("Failed to open image {}", path.display()))?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let texture = Self::new_rgba8(width, height, rgba.into_raw())?;
        ensure!(texture.is_valid(), "Image {} is empty", path.display());

        log::info!(
            "Loaded texture {}: {}x{} ({} bytes)",
            path.display(),
            width,
            height,
            texture.data.len()
        );
        Ok(texture)
    }

    /// A `size`x`size` texture filled with one colour. Materials start out
    /// with a 1x1 white one until a diffuse map is bound.
    pub fn solid(size: u32, color: Color) -> Self {
        let texel = [color.r, color.g, color.b, color.a];
        let data = texel.repeat(size as usize * size as usize);
        Self {
            data,
            width: size,
            height: size,
            format: TextureFormat::Rgba8,
        }
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size = self.width as usize * self.height as usize * self.bytes_per_pixel() as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }
}
