//! GPU plumbing over EGL and OpenGL ES 2
//!
//! Handles:
//! - EGL display/config/surface/context setup (dynamic libEGL)
//! - Shader compilation
//! - Texture and vertex buffer uploads

pub mod egl;
pub mod mesh;
pub mod shader;
pub mod texture;

pub use egl::{egl_error_name, EglContext, DEFAULT_CONFIG_ATTRIBS};
pub use mesh::{AttribLocations, GpuMesh, IndexData};
pub use shader::{attrib_location, load_program, load_shader, uniform_location};
pub use texture::upload_texture;
