//! Linux framebuffer backend
//!
//! The EGL driver owns the framebuffer: the native display is
//! `EGL_DEFAULT_DISPLAY` and the native window is null. Requested sizes are
//! passed through untouched; EGL reports the real (fullscreen) size.

use anyhow::Result;
use khronos_egl as egl;
use log::debug;

use super::{NativeWindow, WindowSystem};

#[derive(Debug, Default)]
pub struct FbdevWindowSystem {
    created: bool,
}

impl FbdevWindowSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowSystem for FbdevWindowSystem {
    fn name(&self) -> &'static str {
        "fbdev"
    }

    fn create(&mut self, width: u32, height: u32, depth: u32) -> Result<NativeWindow> {
        debug!("fbdev: {}x{} requested, depth {}", width, height, depth);
        self.created = true;
        Ok(NativeWindow {
            display: egl::DEFAULT_DISPLAY,
            window: std::ptr::null_mut(),
            width,
            height,
            depth,
        })
    }

    fn destroy(&mut self) {
        if self.created {
            debug!("fbdev: released");
            self.created = false;
        }
    }

    fn step(&mut self) -> Result<()> {
        Ok(())
    }
}
