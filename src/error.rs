//! Library error types
//!
//! Setup code talking to EGL/Wayland returns `anyhow::Result` with context;
//! the failures callers are expected to match on live here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GleshError {
    /// Bounded pool reached its compile-time capacity
    #[error("maximum number of {pool} reached ({capacity})")]
    PoolFull { pool: &'static str, capacity: usize },

    /// Every pre-allocated texture id has been handed out
    #[error("texture id pool exhausted")]
    TextureIdsExhausted,

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Draw callback reported failure; `frame` is the zero-based frame index
    #[error("failed to draw frame {frame}")]
    DrawFailed {
        frame: u32,
        #[source]
        source: anyhow::Error,
    },

    /// Loop ended before a single frame was drawn
    #[error("no frames rendered")]
    NoFramesRendered,

    #[error("failed to read bitmap {path}")]
    Bitmap {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("texture upload failed: {0}")]
    Upload(String),

    /// GL call attempted on a context after `destroy()`
    #[error("rendering context already destroyed")]
    ContextDestroyed,
}
