//! Windowing backends
//!
//! A backend produces the native display/window pair EGL renders into and
//! pumps its own events between frames. Two are built in:
//! - `wayland`: `wl_shell` toplevel surface wrapped in a `wl_egl_window`
//! - `fbdev`: EGL default display, fullscreen framebuffer

pub mod fbdev;
#[cfg(feature = "wayland")]
pub mod wayland;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Result};
use khronos_egl as egl;
use serde::{Deserialize, Serialize};

pub use fbdev::FbdevWindowSystem;
#[cfg(feature = "wayland")]
pub use wayland::WaylandWindowSystem;

/// Native handles handed to EGL, plus the resolved window size
#[derive(Debug, Clone, Copy)]
pub struct NativeWindow {
    pub display: egl::NativeDisplayType,
    pub window: egl::NativeWindowType,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

/// Platform window system behind a rendering context
pub trait WindowSystem {
    fn name(&self) -> &'static str;

    /// Open the native display and a window of `width` x `height`.
    ///
    /// A size of 0 lets the backend pick (output size on Wayland).
    /// On failure everything acquired so far is released.
    fn create(&mut self, width: u32, height: u32, depth: u32) -> Result<NativeWindow>;

    /// Release native resources. Safe to call repeatedly.
    fn destroy(&mut self);

    /// One event-pump iteration between frames
    fn step(&mut self) -> Result<()>;
}

/// Built-in backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Wayland,
    Fbdev,
}

impl Default for Backend {
    fn default() -> Self {
        if cfg!(feature = "wayland") {
            Backend::Wayland
        } else {
            Backend::Fbdev
        }
    }
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Wayland => "wayland",
            Backend::Fbdev => "fbdev",
        }
    }

    /// Instantiate the backend.
    ///
    /// `readiness_timeout` bounds the Wayland startup wait (`None` blocks).
    pub fn window_system(self, readiness_timeout: Option<Duration>) -> Result<Box<dyn WindowSystem>> {
        match self {
            #[cfg(feature = "wayland")]
            Backend::Wayland => Ok(Box::new(WaylandWindowSystem::new(readiness_timeout))),
            #[cfg(not(feature = "wayland"))]
            Backend::Wayland => {
                let _ = readiness_timeout;
                bail!("glesh was built without the `wayland` feature")
            }
            Backend::Fbdev => Ok(Box::new(FbdevWindowSystem::new())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wayland" => Ok(Backend::Wayland),
            "fbdev" | "fb" => Ok(Backend::Fbdev),
            other => bail!("unknown backend '{}' (expected wayland or fbdev)", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("wayland".parse::<Backend>().unwrap(), Backend::Wayland);
        assert_eq!("FBDEV".parse::<Backend>().unwrap(), Backend::Fbdev);
        assert_eq!("fb".parse::<Backend>().unwrap(), Backend::Fbdev);
        assert!("x11".parse::<Backend>().is_err());
        assert_eq!(Backend::Fbdev.to_string(), "fbdev");
    }

    #[test]
    fn test_backend_serde_lowercase() {
        #[derive(Deserialize)]
        struct Doc {
            backend: Backend,
        }
        let doc: Doc = toml::from_str("backend = \"fbdev\"").unwrap();
        assert_eq!(doc.backend, Backend::Fbdev);
        assert!(toml::from_str::<Doc>("backend = \"Fbdev\"").is_err());
    }

    #[test]
    fn test_fbdev_window_system_from_backend() {
        let ws = Backend::Fbdev.window_system(None).unwrap();
        assert_eq!(ws.name(), "fbdev");
    }
}
