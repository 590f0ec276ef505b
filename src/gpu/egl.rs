//! EGL display, surface and context setup
//!
//! libEGL is loaded at runtime so the same binary runs against whatever
//! vendor driver the board ships.

use std::ffi::c_void;

use anyhow::{anyhow, Context, Result};
use khronos_egl as egl;
use log::{debug, error, info, warn};

use crate::constants::MAX_EGL_CONFIGS;
use crate::ws::NativeWindow;

/// EGL instance type (dynamic loading)
type EglInstance = egl::Instance<egl::Dynamic<libloading::Library, egl::EGL1_4>>;

/// Windowed, GLES2-renderable
pub const DEFAULT_CONFIG_ATTRIBS: [egl::Int; 5] = [
    egl::SURFACE_TYPE,
    egl::WINDOW_BIT,
    egl::RENDERABLE_TYPE,
    egl::OPENGL_ES2_BIT,
    egl::NONE,
];

const CONTEXT_ATTRIBS: [egl::Int; 3] = [egl::CONTEXT_CLIENT_VERSION, 2, egl::NONE];

/// Symbolic name of an EGL error code
pub fn egl_error_name(err: egl::Error) -> &'static str {
    match err {
        egl::Error::NotInitialized => "EGL_NOT_INITIALIZED",
        egl::Error::BadAccess => "EGL_BAD_ACCESS",
        egl::Error::BadAlloc => "EGL_BAD_ALLOC",
        egl::Error::BadAttribute => "EGL_BAD_ATTRIBUTE",
        egl::Error::BadContext => "EGL_BAD_CONTEXT",
        egl::Error::BadConfig => "EGL_BAD_CONFIG",
        egl::Error::BadCurrentSurface => "EGL_BAD_CURRENT_SURFACE",
        egl::Error::BadDisplay => "EGL_BAD_DISPLAY",
        egl::Error::BadSurface => "EGL_BAD_SURFACE",
        egl::Error::BadMatch => "EGL_BAD_MATCH",
        egl::Error::BadParameter => "EGL_BAD_PARAMETER",
        egl::Error::BadNativePixmap => "EGL_BAD_NATIVE_PIXMAP",
        egl::Error::BadNativeWindow => "EGL_BAD_NATIVE_WINDOW",
        egl::Error::ContextLost => "EGL_CONTEXT_LOST",
        #[allow(unreachable_patterns)]
        _ => "unknown",
    }
}

/// Log a failed EGL call and turn it into an error carrying the call name
fn egl_failure(call: &str, err: egl::Error) -> anyhow::Error {
    let name = egl_error_name(err);
    error!("{} failed ({})", call, name);
    anyhow!("{} failed ({})", call, name)
}

/// Copy `attribs` and make sure the list ends with `EGL_NONE`
fn terminated_attribs(attribs: &[egl::Int]) -> Vec<egl::Int> {
    let mut list = attribs.to_vec();
    if list.last() != Some(&egl::NONE) {
        list.push(egl::NONE);
    }
    list
}

/// Current EGL display/surface/context triple.
///
/// Dropping releases the current binding, destroys surface and context and
/// terminates the display.
pub struct EglContext {
    instance: EglInstance,
    display: egl::Display,
    surface: egl::Surface,
    context: egl::Context,
    #[allow(dead_code)]
    config: egl::Config,
    width: i32,
    height: i32,
}

impl EglContext {
    /// Initialize EGL on `native` and make a GLES2 context current.
    ///
    /// `config_attribs` selects the configs tried (up to `MAX_EGL_CONFIGS`,
    /// in driver order). The display is terminated again on any failure.
    pub fn new(native: &NativeWindow, config_attribs: &[egl::Int]) -> Result<Self> {
        // Load EGL library
        let lib = unsafe {
            libloading::Library::new("libEGL.so.1")
                .or_else(|_| libloading::Library::new("libEGL.so"))
                .context("Failed to load EGL library")?
        };

        let instance: EglInstance = unsafe {
            egl::DynamicInstance::<egl::EGL1_4>::load_required_from(lib)
                .context("Failed to create EGL instance")?
        };

        #[allow(unused_unsafe)]
        let display = unsafe { instance.get_display(native.display) }.ok_or_else(|| {
            error!("eglGetDisplay failed");
            anyhow!("eglGetDisplay failed")
        })?;

        let (major, minor) = instance
            .initialize(display)
            .map_err(|e| egl_failure("eglInitialize", e))?;
        info!("EGL {}.{} initialized", major, minor);

        match Self::create_surface_and_context(&instance, display, native, config_attribs) {
            Ok((surface, context, config, width, height)) => {
                info!(
                    "EGL surface: {} x {} x {}",
                    width, height, native.depth
                );
                Ok(Self {
                    instance,
                    display,
                    surface,
                    context,
                    config,
                    width,
                    height,
                })
            }
            Err(e) => {
                let _ = instance.terminate(display);
                Err(e)
            }
        }
    }

    fn create_surface_and_context(
        instance: &EglInstance,
        display: egl::Display,
        native: &NativeWindow,
        config_attribs: &[egl::Int],
    ) -> Result<(egl::Surface, egl::Context, egl::Config, i32, i32)> {
        instance
            .bind_api(egl::OPENGL_ES_API)
            .map_err(|e| egl_failure("eglBindAPI", e))?;

        let attribs = terminated_attribs(config_attribs);
        let mut configs = Vec::with_capacity(MAX_EGL_CONFIGS);
        instance
            .choose_config(display, &attribs, &mut configs)
            .map_err(|e| egl_failure("eglChooseConfig", e))?;
        if configs.is_empty() {
            error!("eglChooseConfig failed (no matching configs)");
            return Err(anyhow!("eglChooseConfig returned no matching configs"));
        }
        debug!("{} EGL configs match", configs.len());

        let mut last_err = None;
        let mut accepted = None;
        for (i, &config) in configs.iter().enumerate() {
            let surface =
                match unsafe { instance.create_window_surface(display, config, native.window, None) }
                {
                    Ok(surface) => surface,
                    Err(e) => {
                        debug!("config {}: eglCreateWindowSurface failed ({})", i, egl_error_name(e));
                        last_err = Some(e);
                        continue;
                    }
                };

            match instance.create_context(display, config, None, &CONTEXT_ATTRIBS) {
                Ok(context) => {
                    debug!("config {} accepted", i);
                    accepted = Some((surface, context, config));
                    break;
                }
                Err(e) => {
                    debug!("config {}: eglCreateContext failed ({})", i, egl_error_name(e));
                    let _ = instance.destroy_surface(display, surface);
                    last_err = Some(e);
                }
            }
        }

        let (surface, context, config) = match accepted {
            Some(found) => found,
            None => {
                return Err(egl_failure(
                    "eglCreateContext",
                    last_err.unwrap_or(egl::Error::BadConfig),
                ))
            }
        };

        let release = |err: anyhow::Error| {
            let _ = instance.make_current(display, None, None, None);
            let _ = instance.destroy_context(display, context);
            let _ = instance.destroy_surface(display, surface);
            err
        };

        instance
            .make_current(display, Some(surface), Some(surface), Some(context))
            .map_err(|e| release(egl_failure("eglMakeCurrent", e)))?;

        let width = instance
            .query_surface(display, surface, egl::WIDTH)
            .map_err(|e| release(egl_failure("eglQuerySurface", e)))?;
        let height = instance
            .query_surface(display, surface, egl::HEIGHT)
            .map_err(|e| release(egl_failure("eglQuerySurface", e)))?;

        Ok((surface, context, config, width, height))
    }

    /// Surface width reported by EGL
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Surface height reported by EGL
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Swap buffers
    pub fn swap_buffers(&self) -> Result<()> {
        self.instance
            .swap_buffers(self.display, self.surface)
            .map_err(|e| egl_failure("eglSwapBuffers", e))
    }

    /// Load GL function pointers
    pub fn get_proc_address(&self, name: &str) -> *const c_void {
        self.instance
            .get_proc_address(name)
            .map(|f| f as *const c_void)
            .unwrap_or(std::ptr::null())
    }
}

impl Drop for EglContext {
    fn drop(&mut self) {
        if let Err(e) = self.instance.make_current(self.display, None, None, None) {
            warn!("eglMakeCurrent(NONE) failed ({})", egl_error_name(e));
        }
        let _ = self.instance.destroy_surface(self.display, self.surface);
        let _ = self.instance.destroy_context(self.display, self.context);
        let _ = self.instance.terminate(self.display);
        debug!("EGL display terminated");
    }
}
