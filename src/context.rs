//! Rendering context
//!
//! Owns everything a benchmark touches: the window system, the EGL triple,
//! the GL function table, the object and texture pools, the cos/sin table and
//! the counters of the last render-loop run.

use std::path::Path;

use anyhow::{anyhow, Result};
use glow::HasContext;
use khronos_egl as egl;
use log::{debug, error, info};

use crate::bitmap::{self, Bitmap, PixelFormat};
use crate::constants::{COS_SIN_TABLE_SIZE, DEFAULT_DEPTH, MAX_OBJECTS, MAX_TEXTURES};
use crate::error::GleshError;
use crate::geometry::{Object, TextureHandle, TrigTable};
use crate::gpu::{self, EglContext, DEFAULT_CONFIG_ATTRIBS};
use crate::main_loop::LoopTarget;
use crate::matrix::Matrix;
use crate::perf::PerfData;
use crate::pool::{BoundedPool, Handle, Texture, TextureRegistry};
use crate::ws::WindowSystem;

/// Live EGL/GLES2 context bound to a window system
pub struct RenderingContext {
    window: Box<dyn WindowSystem>,
    egl: Option<EglContext>,
    gl: Option<glow::Context>,
    width: u32,
    height: u32,
    depth: u32,
    objects: BoundedPool<Object>,
    textures: TextureRegistry<glow::Texture>,
    trig: TrigTable,
    /// Projection shared by the scene's objects
    pub perspective: Matrix,
    perf: PerfData,
}

impl RenderingContext {
    /// Create the window, bring up EGL and make a GLES2 context current.
    ///
    /// `attribs` of `None` requests a windowed, GLES2-renderable config.
    /// `depth` of 0 means 32. Width and height are what EGL reports for the
    /// surface, which may differ from the request. Any failure releases what
    /// was created so far.
    pub fn create(
        mut window: Box<dyn WindowSystem>,
        attribs: Option<&[egl::Int]>,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Result<Self> {
        let trig = TrigTable::new(COS_SIN_TABLE_SIZE);
        let depth = if depth == 0 { DEFAULT_DEPTH } else { depth };

        let native = match window.create(width, height, depth) {
            Ok(native) => native,
            Err(e) => {
                window.destroy();
                return Err(e.context(format!("{} window creation failed", window.name())));
            }
        };

        let attribs = attribs.unwrap_or(&DEFAULT_CONFIG_ATTRIBS);
        let egl = match EglContext::new(&native, attribs) {
            Ok(egl) => egl,
            Err(e) => {
                window.destroy();
                return Err(e.context("EGL initialization failed"));
            }
        };

        let gl = unsafe { glow::Context::from_loader_function(|name| egl.get_proc_address(name)) };
        unsafe {
            info!("OpenGL ES: {}", gl.get_parameter_string(glow::VERSION));
            info!("Renderer: {}", gl.get_parameter_string(glow::RENDERER));
            debug!("Vendor: {}", gl.get_parameter_string(glow::VENDOR));
        }

        let (width, height) = match surface_size(egl.width(), egl.height()) {
            Ok(size) => size,
            Err(e) => {
                drop(gl);
                drop(egl);
                window.destroy();
                return Err(e);
            }
        };

        let ids = match allocate_texture_ids(&gl, MAX_TEXTURES) {
            Ok(ids) => ids,
            Err(e) => {
                drop(gl);
                drop(egl);
                window.destroy();
                return Err(e);
            }
        };

        info!("Surface: {} x {} x {} ({})", width, height, depth, window.name());

        Ok(Self {
            window,
            egl: Some(egl),
            gl: Some(gl),
            width,
            height,
            depth,
            objects: BoundedPool::new("objects", MAX_OBJECTS),
            textures: TextureRegistry::new(MAX_TEXTURES, ids),
            trig,
            perspective: Matrix::identity(),
            perf: PerfData::default(),
        })
    }

    /// Release pooled objects, texture ids, EGL and the window, in that order.
    ///
    /// Calling it again is a no-op.
    pub fn destroy(&mut self) {
        if self.gl.is_none() && self.egl.is_none() {
            return;
        }

        self.objects.clear();

        if let Some(gl) = self.gl.take() {
            unsafe {
                for &id in self.textures.all_ids() {
                    gl.delete_texture(id);
                }
            }
        }
        self.textures.clear();

        // EglContext drop releases the binding before terminating
        self.egl = None;
        self.window.destroy();

        self.trig.clear();
        self.width = 0;
        self.height = 0;
        self.depth = 0;
        self.perspective = Matrix::identity();
        self.perf = PerfData::default();
        info!("Rendering context destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.gl.is_none()
    }

    /// GL function table
    pub fn gl(&self) -> Result<&glow::Context, GleshError> {
        self.gl.as_ref().ok_or(GleshError::ContextDestroyed)
    }

    pub fn swap_buffers(&self) -> Result<()> {
        self.egl
            .as_ref()
            .ok_or_else(|| anyhow!(GleshError::ContextDestroyed))?
            .swap_buffers()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Width over height, 1.0 for a degenerate surface
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn trig(&self) -> &TrigTable {
        &self.trig
    }

    /// Metrics of the last render-loop run
    pub fn perf_data(&self) -> &PerfData {
        &self.perf
    }

    pub fn window_system(&self) -> &dyn WindowSystem {
        self.window.as_ref()
    }

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    pub fn add_object(&mut self, object: Object) -> Result<Handle<Object>, GleshError> {
        self.objects.push(object)
    }

    pub fn object(&self, handle: Handle<Object>) -> Option<&Object> {
        self.objects.get(handle)
    }

    pub fn object_mut(&mut self, handle: Handle<Object>) -> Option<&mut Object> {
        self.objects.get_mut(handle)
    }

    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.iter()
    }

    /// Point `object` at a pooled texture (the pool keeps ownership)
    pub fn attach_texture(&mut self, object: Handle<Object>, texture: TextureHandle) -> bool {
        match self.objects.get_mut(object) {
            Some(obj) => {
                obj.attach_texture(texture);
                true
            }
            None => false,
        }
    }

    /// Triangles across every pooled object
    pub fn triangle_count(&self) -> u32 {
        self.objects.iter().map(|o| o.num_triangles).sum()
    }

    // ------------------------------------------------------------------
    // Textures
    // ------------------------------------------------------------------

    /// First texture whose name contains `name`
    pub fn texture_by_name(&self, name: &str) -> Option<TextureHandle> {
        self.textures.find(name)
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&Texture<glow::Texture>> {
        self.textures.get(handle)
    }

    /// Next unused pre-allocated texture id, `None` once all are taken
    pub fn texture_id_from_pool(&mut self) -> Option<glow::Texture> {
        self.textures.take_id()
    }

    /// Procedural test-pattern texture; reuses an existing texture of that name
    pub fn generate_texture(
        &mut self,
        format: PixelFormat,
        width: u32,
        height: u32,
        name: &str,
    ) -> Result<TextureHandle, GleshError> {
        if let Some(handle) = self.textures.find(name) {
            return Ok(handle);
        }
        let texels = bitmap::generate_pattern(width, height, 0, format);
        self.upload_named(name, format, width, height, &texels)
    }

    /// Upload a decoded bitmap; reuses an existing texture of that name
    pub fn bitmap_to_texture(
        &mut self,
        format: PixelFormat,
        name: &str,
        bitmap: &Bitmap,
    ) -> Result<TextureHandle, GleshError> {
        if let Some(handle) = self.textures.find(name) {
            return Ok(handle);
        }
        let texels = bitmap.to_texels(format);
        self.upload_named(name, format, bitmap.width, bitmap.height, &texels)
    }

    /// Load a BMP file, optionally rescaled (0 keeps the source size)
    pub fn texture_from_bmp_file(
        &mut self,
        format: PixelFormat,
        name: &str,
        path: &Path,
        scale_w: u32,
        scale_h: u32,
    ) -> Result<TextureHandle, GleshError> {
        if let Some(handle) = self.textures.find(name) {
            return Ok(handle);
        }
        let bitmap = bitmap::read_bitmap(path, scale_w, scale_h)?;
        self.bitmap_to_texture(format, name, &bitmap)
    }

    fn upload_named(
        &mut self,
        name: &str,
        format: PixelFormat,
        width: u32,
        height: u32,
        texels: &[u8],
    ) -> Result<TextureHandle, GleshError> {
        let gl = self.gl.as_ref().ok_or(GleshError::ContextDestroyed)?;
        let handle = self.textures.get_or_create(name, width, height, |id| {
            gpu::upload_texture(gl, id, format, width, height, texels)
        })?;
        debug!("Texture '{}' ready ({}x{} {:?})", name, width, height, format);
        Ok(handle)
    }
}

/// Surface size reported by EGL; both sides must be positive
fn surface_size(width: i32, height: i32) -> Result<(u32, u32)> {
    if width <= 0 || height <= 0 {
        error!("EGL reports a {}x{} surface", width, height);
        return Err(anyhow!("unusable {}x{} EGL surface", width, height));
    }
    Ok((width as u32, height as u32))
}

fn allocate_texture_ids(gl: &glow::Context, count: usize) -> Result<Vec<glow::Texture>> {
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        match unsafe { gl.create_texture() } {
            Ok(id) => ids.push(id),
            Err(e) => {
                error!("glGenTextures failed: {}", e);
                unsafe {
                    for &id in &ids {
                        gl.delete_texture(id);
                    }
                }
                return Err(anyhow!("Failed to allocate texture ids: {}", e));
            }
        }
    }
    Ok(ids)
}

impl LoopTarget for RenderingContext {
    fn perf_data_mut(&mut self) -> &mut PerfData {
        &mut self.perf
    }

    fn pump_events(&mut self) -> Result<()> {
        self.window.step()
    }

    fn triangle_count(&self) -> u32 {
        RenderingContext::triangle_count(self)
    }
}

impl Drop for RenderingContext {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::NativeWindow;
    use std::cell::Cell;
    use std::rc::Rc;

    struct BrokenWindow {
        destroyed: Rc<Cell<u32>>,
    }

    impl WindowSystem for BrokenWindow {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn create(&mut self, _: u32, _: u32, _: u32) -> Result<NativeWindow> {
            Err(anyhow!("no display"))
        }

        fn destroy(&mut self) {
            self.destroyed.set(self.destroyed.get() + 1);
        }

        fn step(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_degenerate_surface_is_rejected() {
        assert_eq!(surface_size(800, 480).unwrap(), (800, 480));
        assert!(surface_size(0, 480).is_err());
        assert!(surface_size(800, 0).is_err());
        assert!(surface_size(-1, -1).is_err());
    }

    #[test]
    fn test_failed_window_creation_is_rolled_back() {
        let destroyed = Rc::new(Cell::new(0));
        let window = Box::new(BrokenWindow {
            destroyed: destroyed.clone(),
        });

        let err = RenderingContext::create(window, None, 640, 480, 0)
            .err()
            .expect("creation must fail");
        assert!(format!("{:#}", err).contains("broken window creation failed"));
        assert!(format!("{:#}", err).contains("no display"));
        assert_eq!(destroyed.get(), 1);
    }
}
