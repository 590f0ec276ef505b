//! GPU-side copies of `Object` geometry

use anyhow::{anyhow, Result};
use glow::HasContext;
use log::debug;

use crate::geometry::Object;

/// Index data in the narrowest type GLES2 can draw
#[derive(Debug, Clone, PartialEq)]
pub enum IndexData {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexData {
    /// `u16` whenever every index fits; `u32` needs `OES_element_index_uint`
    pub fn from_indices(indices: &[u32]) -> Self {
        if indices.iter().all(|&i| i <= u16::MAX as u32) {
            IndexData::U16(indices.iter().map(|&i| i as u16).collect())
        } else {
            IndexData::U32(indices.to_vec())
        }
    }

    pub fn gl_type(&self) -> u32 {
        match self {
            IndexData::U16(_) => glow::UNSIGNED_SHORT,
            IndexData::U32(_) => glow::UNSIGNED_INT,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexData::U16(v) => v.len(),
            IndexData::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::U16(v) => bytemuck::cast_slice(v),
            IndexData::U32(v) => bytemuck::cast_slice(v),
        }
    }
}

/// Vertex attribute locations of the program drawing a mesh
#[derive(Debug, Clone, Copy, Default)]
pub struct AttribLocations {
    pub position: u32,
    pub normal: Option<u32>,
    pub texcoord: Option<u32>,
}

/// VBOs holding one object's vertex streams and indices
pub struct GpuMesh {
    positions: glow::Buffer,
    normals: Option<glow::Buffer>,
    texcoords: Option<glow::Buffer>,
    indices: glow::Buffer,
    index_type: u32,
    index_count: i32,
    vertex_count: i32,
}

impl GpuMesh {
    /// Upload `object`'s streams; buffers created before a failure are deleted
    pub fn upload(gl: &glow::Context, object: &Object) -> Result<Self> {
        let mut created = Created::new();
        match Self::upload_streams(gl, object, &mut created) {
            Ok(mesh) => Ok(mesh),
            Err(e) => {
                created.release(|buffer| unsafe { gl.delete_buffer(buffer) });
                Err(e)
            }
        }
    }

    fn upload_streams(
        gl: &glow::Context,
        object: &Object,
        created: &mut Created<glow::Buffer>,
    ) -> Result<Self> {
        let index_data = IndexData::from_indices(&object.indices);
        unsafe {
            let positions = created.track(array_buffer(gl, bytemuck::cast_slice(&object.vertices)))?;
            let normals = if object.normals.is_empty() {
                None
            } else {
                Some(created.track(array_buffer(gl, bytemuck::cast_slice(&object.normals)))?)
            };
            let texcoords = if object.texcoords.is_empty() {
                None
            } else {
                Some(created.track(array_buffer(gl, bytemuck::cast_slice(&object.texcoords)))?)
            };

            let indices = created.track(
                gl.create_buffer()
                    .map_err(|e| anyhow!("Failed to create index buffer: {}", e)),
            )?;
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(indices));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                index_data.as_bytes(),
                glow::STATIC_DRAW,
            );
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);

            debug!(
                "Mesh uploaded: {} vertices, {} indices",
                object.num_vertices(),
                index_data.len()
            );

            Ok(Self {
                positions,
                normals,
                texcoords,
                indices,
                index_type: index_data.gl_type(),
                index_count: index_data.len() as i32,
                vertex_count: object.num_vertices() as i32,
            })
        }
    }

    fn bind_streams(&self, gl: &glow::Context, locations: &AttribLocations) {
        unsafe {
            bind_stream(gl, self.positions, locations.position, 3);
            if let (Some(buf), Some(loc)) = (self.normals, locations.normal) {
                bind_stream(gl, buf, loc, 3);
            }
            if let (Some(buf), Some(loc)) = (self.texcoords, locations.texcoord) {
                bind_stream(gl, buf, loc, 2);
            }
        }
    }

    /// Bind the streams to `locations` and draw indexed triangles
    pub fn draw(&self, gl: &glow::Context, locations: &AttribLocations) {
        self.bind_streams(gl, locations);
        unsafe {
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.indices));
            gl.draw_elements(glow::TRIANGLES, self.index_count, self.index_type, 0);
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    /// Draw the vertices in order as a triangle strip (indices unused)
    pub fn draw_strip(&self, gl: &glow::Context, locations: &AttribLocations) {
        self.bind_streams(gl, locations);
        unsafe {
            gl.draw_arrays(glow::TRIANGLE_STRIP, 0, self.vertex_count);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_buffer(self.positions);
            if let Some(buf) = self.normals {
                gl.delete_buffer(buf);
            }
            if let Some(buf) = self.texcoords {
                gl.delete_buffer(buf);
            }
            gl.delete_buffer(self.indices);
        }
    }
}

/// Buffers created so far by an upload
struct Created<B> {
    buffers: Vec<B>,
}

impl<B: Copy> Created<B> {
    fn new() -> Self {
        Self { buffers: Vec::new() }
    }

    fn track(&mut self, result: Result<B>) -> Result<B> {
        let buffer = result?;
        self.buffers.push(buffer);
        Ok(buffer)
    }

    /// Hand every tracked buffer to `delete`, newest first
    fn release(self, mut delete: impl FnMut(B)) {
        for buffer in self.buffers.into_iter().rev() {
            delete(buffer);
        }
    }
}

unsafe fn array_buffer(gl: &glow::Context, data: &[u8]) -> Result<glow::Buffer> {
    let buffer = gl
        .create_buffer()
        .map_err(|e| anyhow!("Failed to create vertex buffer: {}", e))?;
    gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
    gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW);
    gl.bind_buffer(glow::ARRAY_BUFFER, None);
    Ok(buffer)
}

unsafe fn bind_stream(gl: &glow::Context, buffer: glow::Buffer, location: u32, components: i32) {
    gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
    gl.vertex_attrib_pointer_f32(location, components, glow::FLOAT, false, 0, 0);
    gl.enable_vertex_attrib_array(location);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{cube, sphere};

    #[test]
    fn test_small_meshes_use_u16_indices() {
        let data = IndexData::from_indices(&cube(1.0).indices);
        assert_eq!(data.gl_type(), glow::UNSIGNED_SHORT);
        assert_eq!(data.len(), 36);
        assert_eq!(data.as_bytes().len(), 72);
    }

    #[test]
    fn test_large_indices_stay_u32() {
        let data = IndexData::from_indices(&[0, 1, 70_000]);
        assert_eq!(data, IndexData::U32(vec![0, 1, 70_000]));
        assert_eq!(data.as_bytes().len(), 12);
    }

    #[test]
    fn test_partial_upload_releases_created_buffers() {
        let mut created = Created::new();
        assert_eq!(created.track(Ok(1u32)).unwrap(), 1);
        assert_eq!(created.track(Ok(2u32)).unwrap(), 2);
        assert!(created.track(Err(anyhow!("out of memory"))).is_err());

        let mut deleted = Vec::new();
        created.release(|b| deleted.push(b));
        assert_eq!(deleted, vec![2, 1]);
    }

    #[test]
    fn test_sphere_indices_convert() {
        let obj = sphere(32, 1.0).unwrap();
        let data = IndexData::from_indices(&obj.indices);
        assert!(matches!(data, IndexData::U16(ref v) if v.len() == obj.num_indices()));
    }
}
