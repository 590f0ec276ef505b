//! Mesh generators
//!
//! Sphere and plane are indexed triangle lists (`num_triangles == indices / 3`).
//! Triangle and quad are strips meant for `glDrawArrays(GL_TRIANGLE_STRIP)`.

use std::f32::consts::PI;

use super::object::Object;
use crate::error::GleshError;

/// Unit cube corners, 4 per face (bottom, top, back, front, left, right)
#[rustfmt::skip]
const CUBE_VERTICES: [f32; 72] = [
    -0.5, -0.5, -0.5,  -0.5, -0.5,  0.5,   0.5, -0.5,  0.5,   0.5, -0.5, -0.5,
    -0.5,  0.5, -0.5,  -0.5,  0.5,  0.5,   0.5,  0.5,  0.5,   0.5,  0.5, -0.5,
    -0.5, -0.5, -0.5,  -0.5,  0.5, -0.5,   0.5,  0.5, -0.5,   0.5, -0.5, -0.5,
    -0.5, -0.5,  0.5,  -0.5,  0.5,  0.5,   0.5,  0.5,  0.5,   0.5, -0.5,  0.5,
    -0.5, -0.5, -0.5,  -0.5, -0.5,  0.5,  -0.5,  0.5,  0.5,  -0.5,  0.5, -0.5,
     0.5, -0.5, -0.5,   0.5, -0.5,  0.5,   0.5,  0.5,  0.5,   0.5,  0.5, -0.5,
];

#[rustfmt::skip]
const CUBE_NORMALS: [f32; 72] = [
    0.0, -1.0, 0.0,   0.0, -1.0, 0.0,   0.0, -1.0, 0.0,   0.0, -1.0, 0.0,
    0.0,  1.0, 0.0,   0.0,  1.0, 0.0,   0.0,  1.0, 0.0,   0.0,  1.0, 0.0,
    0.0, 0.0, -1.0,   0.0, 0.0, -1.0,   0.0, 0.0, -1.0,   0.0, 0.0, -1.0,
    0.0, 0.0,  1.0,   0.0, 0.0,  1.0,   0.0, 0.0,  1.0,   0.0, 0.0,  1.0,
   -1.0, 0.0,  0.0,  -1.0, 0.0,  0.0,  -1.0, 0.0,  0.0,  -1.0, 0.0,  0.0,
    1.0, 0.0,  0.0,   1.0, 0.0,  0.0,   1.0, 0.0,  0.0,   1.0, 0.0,  0.0,
];

#[rustfmt::skip]
const CUBE_TEXCOORDS: [f32; 48] = [
    0.0, 0.0,  0.0, 1.0,  1.0, 1.0,  1.0, 0.0,
    1.0, 0.0,  1.0, 1.0,  0.0, 1.0,  0.0, 0.0,
    0.0, 0.0,  0.0, 1.0,  1.0, 1.0,  1.0, 0.0,
    0.0, 0.0,  0.0, 1.0,  1.0, 1.0,  1.0, 0.0,
    0.0, 0.0,  0.0, 1.0,  1.0, 1.0,  1.0, 0.0,
    0.0, 0.0,  0.0, 1.0,  1.0, 1.0,  1.0, 0.0,
];

#[rustfmt::skip]
const CUBE_INDICES: [u32; 36] = [
    0, 2, 1,    0, 3, 2,
    4, 5, 6,    4, 6, 7,
    8, 9, 10,   8, 10, 11,
    12, 15, 14, 12, 14, 13,
    16, 17, 18, 16, 18, 19,
    20, 23, 22, 20, 22, 21,
];

/// Two triangles per grid cell of a `(rows + 1) x (cols + 1)` vertex lattice
fn grid_indices(rows: u32, cols: u32) -> Vec<u32> {
    let stride = cols + 1;
    let mut indices = Vec::with_capacity((rows * cols * 6) as usize);
    for i in 0..rows {
        for j in 0..cols {
            indices.extend_from_slice(&[
                i * stride + j,
                (i + 1) * stride + j,
                (i + 1) * stride + j + 1,
                i * stride + j,
                (i + 1) * stride + j + 1,
                i * stride + j + 1,
            ]);
        }
    }
    indices
}

/// UV sphere with `num_slices` meridians and `num_slices / 2` parallels.
///
/// Requires `num_slices >= 4` so the texture V step is finite.
pub fn sphere(num_slices: u32, radius: f32) -> Result<Object, GleshError> {
    if num_slices < 4 {
        return Err(GleshError::InvalidGeometry(format!(
            "sphere needs at least 4 slices, got {}",
            num_slices
        )));
    }
    if radius <= 0.0 {
        return Err(GleshError::InvalidGeometry(format!(
            "sphere radius must be positive, got {}",
            radius
        )));
    }

    let parallels = num_slices / 2;
    let num_vertices = ((parallels + 1) * (num_slices + 1)) as usize;
    let step = 2.0 * PI / num_slices as f32;

    let mut obj = Object::new();
    obj.vertices.reserve(num_vertices * 3);
    obj.normals.reserve(num_vertices * 3);
    obj.texcoords.reserve(num_vertices * 2);

    for i in 0..=parallels {
        let (sin_i, cos_i) = (step * i as f32).sin_cos();
        for j in 0..=num_slices {
            let (sin_j, cos_j) = (step * j as f32).sin_cos();
            let v = [radius * sin_i * sin_j, radius * cos_i, radius * sin_i * cos_j];

            obj.vertices.extend_from_slice(&v);
            obj.normals.extend(v.iter().map(|c| c / radius));
            obj.texcoords.push(j as f32 / num_slices as f32);
            obj.texcoords.push((1.0 - i as f32) / (parallels - 1) as f32);
        }
    }

    obj.indices = grid_indices(parallels, num_slices);
    obj.num_triangles = (obj.indices.len() / 3) as u32;
    Ok(obj)
}

/// Axis-aligned cube with edge length `scale`, 24 vertices (4 per face)
pub fn cube(scale: f32) -> Object {
    let mut obj = Object::new();
    obj.vertices = CUBE_VERTICES.iter().map(|v| v * scale).collect();
    obj.normals = CUBE_NORMALS.to_vec();
    obj.texcoords = CUBE_TEXCOORDS.to_vec();
    obj.indices = CUBE_INDICES.to_vec();
    obj.num_triangles = (obj.indices.len() / 3) as u32;
    obj
}

/// Flat grid in the XY plane facing -Z, `num_slices` cells per side.
///
/// Requires `num_slices >= 2`.
pub fn plane(scale: f32, num_slices: u32) -> Result<Object, GleshError> {
    if num_slices < 2 {
        return Err(GleshError::InvalidGeometry(format!(
            "plane needs at least 2 slices, got {}",
            num_slices
        )));
    }

    let n = num_slices as i64;
    let num_vertices = ((num_slices + 1) * (num_slices + 1)) as usize;
    let mut obj = Object::new();
    obj.vertices.reserve(num_vertices * 3);
    obj.normals.reserve(num_vertices * 3);
    obj.texcoords.reserve(num_vertices * 2);

    for i in 0..=n {
        for j in 0..=n {
            // Integer half offset keeps odd slice counts slightly off-center
            obj.vertices.push(scale * (i - n / 2) as f32 / n as f32);
            obj.vertices.push(scale * (j - n / 2) as f32 / n as f32);
            obj.vertices.push(0.0);

            obj.normals.extend_from_slice(&[0.0, 0.0, -1.0]);

            obj.texcoords.push(j as f32 / n as f32);
            obj.texcoords.push((1.0 - i as f32) / (n - 1) as f32);
        }
    }

    obj.indices = grid_indices(num_slices, num_slices);
    obj.num_triangles = (obj.indices.len() / 3) as u32;
    Ok(obj)
}

/// Single triangle, drawn as a 3-vertex strip
pub fn triangle_strip(scale: f32) -> Object {
    #[rustfmt::skip]
    const VERTICES: [f32; 9] = [
        -0.5, -0.5, 0.0,
         0.0,  0.5, 0.0,
         0.5, -0.5, 0.0,
    ];

    let mut obj = Object::new();
    obj.vertices = VERTICES.iter().map(|v| v * scale).collect();
    obj.normals = [0.0, 0.0, -1.0].repeat(3);
    obj.texcoords = vec![1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
    obj.indices = vec![0, 2, 1];
    obj.num_triangles = 1;
    obj
}

/// Quad of `scale_x` by `scale_y`, drawn as a 4-vertex strip
pub fn rectangle_strip(scale_x: f32, scale_y: f32) -> Object {
    #[rustfmt::skip]
    const VERTICES: [f32; 12] = [
        -0.5, -0.5, 0.0,
        -0.5,  0.5, 0.0,
         0.5, -0.5, 0.0,
         0.5,  0.5, 0.0,
    ];

    let mut obj = Object::new();
    obj.vertices = VERTICES
        .chunks(3)
        .flat_map(|v| [v[0] * scale_x, v[1] * scale_y, v[2]])
        .collect();
    obj.normals = [0.0, 0.0, -1.0].repeat(4);
    obj.texcoords = vec![1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    obj.indices = vec![0, 2, 1, 3];
    obj.num_triangles = 2;
    obj
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_in_range(obj: &Object) {
        let n = obj.num_vertices() as u32;
        assert!(obj.indices.iter().all(|&i| i < n), "index out of range");
        assert_eq!(obj.normals.len(), obj.vertices.len());
        assert_eq!(obj.texcoords.len() / 2, obj.num_vertices());
    }

    #[test]
    fn test_sphere_counts() {
        for slices in [4, 8, 17, 32] {
            let obj = sphere(slices, 2.0).unwrap();
            let parallels = slices / 2;
            assert_eq!(obj.num_vertices() as u32, (parallels + 1) * (slices + 1));
            assert_eq!(obj.num_indices() as u32, parallels * slices * 6);
            assert_eq!(obj.num_triangles as usize, obj.num_indices() / 3);
            assert_indices_in_range(&obj);
        }
    }

    #[test]
    fn test_sphere_vertices_on_surface() {
        let obj = sphere(16, 3.0).unwrap();
        for v in obj.vertices.chunks(3) {
            let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert!((r - 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_sphere_rejects_too_few_slices() {
        assert!(matches!(sphere(2, 1.0), Err(GleshError::InvalidGeometry(_))));
        assert!(sphere(8, 0.0).is_err());
    }

    #[test]
    fn test_cube() {
        let obj = cube(2.0);
        assert_eq!(obj.num_vertices(), 24);
        assert_eq!(obj.num_triangles, 12);
        assert_eq!(obj.num_triangles as usize, obj.num_indices() / 3);
        assert!(obj.vertices.iter().all(|v| v.abs() == 1.0));
        assert_indices_in_range(&obj);
    }

    #[test]
    fn test_plane() {
        let obj = plane(10.0, 4).unwrap();
        assert_eq!(obj.num_vertices(), 25);
        assert_eq!(obj.num_indices(), 4 * 4 * 6);
        assert_eq!(obj.num_triangles as usize, obj.num_indices() / 3);
        assert_indices_in_range(&obj);
        assert_eq!(&obj.vertices[0..3], &[-5.0, -5.0, 0.0]);
        assert!(plane(1.0, 1).is_err());
    }

    #[test]
    fn test_strips() {
        let tri = triangle_strip(4.0);
        assert_eq!(tri.num_vertices(), 3);
        assert_eq!(tri.num_triangles, 1);
        assert_eq!(&tri.vertices[3..6], &[0.0, 2.0, 0.0]);
        assert_indices_in_range(&tri);

        let quad = rectangle_strip(2.0, 4.0);
        assert_eq!(quad.num_vertices(), 4);
        assert_eq!(quad.num_triangles, 2);
        assert_eq!(&quad.vertices[9..12], &[1.0, 2.0, 0.0]);
        assert_indices_in_range(&quad);
    }
}
