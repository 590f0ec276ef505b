//! Texture uploads

use glow::HasContext;
use log::{debug, error};

use crate::bitmap::{self, PixelFormat};
use crate::error::GleshError;

/// Bytes `glTexImage2D` reads for a `width` x `height` image
pub fn expected_len(format: PixelFormat, width: u32, height: u32) -> usize {
    bitmap::texel_count(width, height) * format.bytes_per_texel()
}

/// Upload tightly packed texels into `id` on texture unit 0.
///
/// Filtering is nearest, wrapping repeats. GL errors raised by the upload
/// are returned as `GleshError::Upload`.
pub fn upload_texture(
    gl: &glow::Context,
    id: glow::Texture,
    format: PixelFormat,
    width: u32,
    height: u32,
    texels: &[u8],
) -> Result<(), GleshError> {
    let expected = expected_len(format, width, height);
    if texels.len() != expected {
        error!(
            "Texture data is {} bytes, {}x{} {:?} needs {}",
            texels.len(),
            width,
            height,
            format,
            expected
        );
        return Err(GleshError::Upload(format!(
            "expected {} bytes, got {}",
            expected,
            texels.len()
        )));
    }

    let (internal, fmt, ty) = format.gl_formats();
    unsafe {
        gl.active_texture(glow::TEXTURE0);
        gl.bind_texture(glow::TEXTURE_2D, Some(id));
        // RGB565 rows of odd width are not 4-byte aligned
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            internal as i32,
            width as i32,
            height as i32,
            0,
            fmt,
            ty,
            Some(texels),
        );
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);

        let err = gl.get_error();
        if err != glow::NO_ERROR {
            error!("glTexImage2D failed (0x{:04x})", err);
            return Err(GleshError::Upload(format!("GL error 0x{:04x}", err)));
        }
    }

    debug!("Uploaded {}x{} {:?} texture", width, height, format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_len() {
        assert_eq!(expected_len(PixelFormat::Rgba8888, 64, 32), 64 * 32 * 4);
        assert_eq!(expected_len(PixelFormat::Rgb565, 3, 3), 18);
        assert_eq!(expected_len(PixelFormat::Rgb565, 0, 10), 0);
    }
}
