//! Bitmap loading and texel conversion
//!
//! Reads 24/32-bit BMP files (any format the `image` crate decodes works),
//! optionally rescales them with nearest-neighbour sampling and converts the
//! result to the texel layout GLES expects for RGBA8888 or RGB565 uploads.

use std::path::Path;

use log::{debug, error};

use crate::error::GleshError;

/// Texel layout of an uploaded texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// `GL_RGBA` / `GL_UNSIGNED_BYTE`, 4 bytes per texel
    Rgba8888,
    /// `GL_RGB` / `GL_UNSIGNED_SHORT_5_6_5`, 2 bytes per texel
    Rgb565,
}

impl PixelFormat {
    pub fn bytes_per_texel(self) -> usize {
        match self {
            PixelFormat::Rgba8888 => 4,
            PixelFormat::Rgb565 => 2,
        }
    }

    /// (internal format, format, type) for `glTexImage2D`
    pub fn gl_formats(self) -> (u32, u32, u32) {
        match self {
            PixelFormat::Rgba8888 => (glow::RGBA, glow::RGBA, glow::UNSIGNED_BYTE),
            PixelFormat::Rgb565 => (glow::RGB, glow::RGB, glow::UNSIGNED_SHORT_5_6_5),
        }
    }
}

/// Decoded image, top row first, RGBA per pixel
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// Bits per pixel of the source file (24 or 32 for BMP)
    pub bit_count: u16,
    pub pixels: Vec<[u8; 4]>,
}

impl Bitmap {
    /// Convert to tightly packed texel bytes
    pub fn to_texels(&self, format: PixelFormat) -> Vec<u8> {
        encode_texels(&self.pixels, format)
    }
}

/// Pack `0xAARRGGBB` into RGB565
pub fn rgba8888_to_rgb565(val: u32) -> u16 {
    ((((val >> 19) & 0x1F) << 11) | (((val >> 10) & 0x3F) << 5) | ((val >> 3) & 0x1F)) as u16
}

fn pack_argb([r, g, b, a]: [u8; 4]) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Encode RGBA pixels into texel bytes (native endian for 565)
pub fn encode_texels(pixels: &[[u8; 4]], format: PixelFormat) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() * format.bytes_per_texel());
    for &px in pixels {
        match format {
            PixelFormat::Rgba8888 => out.extend_from_slice(&px),
            PixelFormat::Rgb565 => {
                out.extend_from_slice(&rgba8888_to_rgb565(pack_argb(px)).to_ne_bytes())
            }
        }
    }
    out
}

/// Pixels in a `width` x `height` image, computed without `u32` overflow
pub fn texel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// Test pattern: red ramps with x, green with y, blue falls with x
pub fn generate_pattern(width: u32, height: u32, offset: u32, format: PixelFormat) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(texel_count(width, height));
    for y in 0..height {
        for x in 0..width {
            let r = x.wrapping_add(offset) as u8;
            let g = y as u8;
            let b = (0xFFu8.wrapping_sub(x as u8)).wrapping_add(offset as u8);
            pixels.push([r, g, b, 0xFF]);
        }
    }
    encode_texels(&pixels, format)
}

/// Nearest-neighbour rescale using 16.16 fixed-point stepping
pub fn scale_nearest(
    pixels: &[[u8; 4]],
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
) -> Vec<[u8; 4]> {
    if dst_w == 0 || dst_h == 0 {
        return Vec::new();
    }
    let x_step = ((src_w as u64) << 16) / dst_w as u64;
    let y_step = ((src_h as u64) << 16) / dst_h as u64;

    let mut out = Vec::with_capacity(texel_count(dst_w, dst_h));
    for y in 0..dst_h as u64 {
        let row = ((y * y_step) >> 16) as usize * src_w as usize;
        for x in 0..dst_w as u64 {
            let col = ((x * x_step) >> 16) as usize;
            out.push(pixels[row + col]);
        }
    }
    out
}

/// Load a bitmap file; `scale_w`/`scale_h` of 0 keep the source size.
pub fn read_bitmap(path: &Path, scale_w: u32, scale_h: u32) -> Result<Bitmap, GleshError> {
    let img = image::open(path).map_err(|source| {
        error!("Failed to read file {}: {}", path.display(), source);
        GleshError::Bitmap {
            path: path.display().to_string(),
            source,
        }
    })?;

    let bit_count = img.color().bits_per_pixel();
    let rgba = img.to_rgba8();
    let (src_w, src_h) = rgba.dimensions();
    let pixels: Vec<[u8; 4]> = rgba.pixels().map(|p| p.0).collect();

    let width = if scale_w != 0 { scale_w } else { src_w };
    let height = if scale_h != 0 { scale_h } else { src_h };

    let pixels = if (width, height) == (src_w, src_h) {
        pixels
    } else {
        scale_nearest(&pixels, src_w, src_h, width, height)
    };

    debug!(
        "Bitmap {}: {}x{} ({} bpp) -> {}x{}",
        path.display(),
        src_w,
        src_h,
        bit_count,
        width,
        height
    );

    Ok(Bitmap {
        width,
        height,
        bit_count,
        pixels,
    })
}
