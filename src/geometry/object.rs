//! Drawable mesh

use crate::matrix::Matrix;
use crate::pool::{Handle, Texture};

/// Handle to a texture pooled in a `RenderingContext`
pub type TextureHandle = Handle<Texture<glow::Texture>>;

/// Mesh with exclusively owned geometry buffers.
///
/// Buffers are flat: 3 floats per vertex/normal, 2 per texcoord.
/// The texture is referenced by handle; the context owns it.
#[derive(Debug, Clone, Default)]
pub struct Object {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub texcoords: Vec<f32>,
    pub indices: Vec<u32>,
    pub modelview: Matrix,
    pub num_triangles: u32,
    pub texture: Option<TextureHandle>,
}

impl Object {
    /// Empty object with identity model-view
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn num_indices(&self) -> usize {
        self.indices.len()
    }

    pub fn attach_texture(&mut self, texture: TextureHandle) {
        self.texture = Some(texture);
    }

    /// Grow the vertex buffer by `count` zeroed vertices and return the new tail
    pub fn add_vertices(&mut self, count: usize) -> &mut [f32] {
        let start = self.vertices.len();
        self.vertices.resize(start + count * 3, 0.0);
        &mut self.vertices[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_object_is_empty_identity() {
        let obj = Object::new();
        assert_eq!(obj.num_vertices(), 0);
        assert_eq!(obj.modelview, Matrix::identity());
        assert!(obj.texture.is_none());
    }

    #[test]
    fn test_add_vertices_appends() {
        let mut obj = Object::new();
        obj.add_vertices(2).copy_from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let tail = obj.add_vertices(1);
        assert_eq!(tail.len(), 3);
        tail[0] = 7.0;
        assert_eq!(obj.num_vertices(), 3);
        assert_eq!(obj.vertices[6], 7.0);
        assert_eq!(obj.vertices[5], 6.0);
    }
}
