//! 4x4 matrix helpers
//!
//! Row-of-columns layout (`m[col][row]`) matching what GLES expects from
//! `glUniformMatrix4fv` with `transpose = false`.

use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub m: [[f32; 4]; 4],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub fn identity() -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { m }
    }

    pub fn set_to_identity(&mut self) {
        *self = Self::identity();
    }

    /// `a * b`
    pub fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
        let mut out = [[0.0; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| a.m[i][k] * b.m[k][j]).sum();
            }
        }
        Matrix { m: out }
    }

    /// Rotation of `angle` degrees around axis (x, y, z).
    ///
    /// A zero-length axis yields identity.
    pub fn rotation(angle: f32, x: f32, y: f32, z: f32) -> Matrix {
        let mag = (x * x + y * y + z * z).sqrt();
        if mag <= 0.0 {
            return Matrix::identity();
        }

        let (sin, cos) = (angle * PI / 180.0).sin_cos();
        let (x, y, z) = (x / mag, y / mag, z / mag);
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, yz, zx) = (x * y, y * z, z * x);
        let (xs, ys, zs) = (x * sin, y * sin, z * sin);
        let one_minus_cos = 1.0 - cos;

        Matrix {
            m: [
                [
                    one_minus_cos * xx + cos,
                    one_minus_cos * xy - zs,
                    one_minus_cos * zx + ys,
                    0.0,
                ],
                [
                    one_minus_cos * xy + zs,
                    one_minus_cos * yy + cos,
                    one_minus_cos * yz - xs,
                    0.0,
                ],
                [
                    one_minus_cos * zx - ys,
                    one_minus_cos * yz + xs,
                    one_minus_cos * zz + cos,
                    0.0,
                ],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Pre-multiply by a rotation (`self = R * self`)
    pub fn rotate(&mut self, angle: f32, x: f32, y: f32, z: f32) {
        *self = Matrix::multiply(&Matrix::rotation(angle, x, y, z), self);
    }

    /// Apply a perspective frustum (`self = F * self`).
    ///
    /// Degenerate planes (non-positive near/far or empty extents) leave
    /// the matrix untouched.
    pub fn frustum(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        let dx = right - left;
        let dy = top - bottom;
        let dz = far - near;
        if near <= 0.0 || far <= 0.0 || dx <= 0.0 || dy <= 0.0 || dz <= 0.0 {
            return;
        }

        let frust = Matrix {
            m: [
                [2.0 * near / dx, 0.0, 0.0, 0.0],
                [0.0, 2.0 * near / dy, 0.0, 0.0],
                [(right + left) / dx, (top + bottom) / dy, -(near + far) / dz, -1.0],
                [0.0, 0.0, -2.0 * near * far / dz, 0.0],
            ],
        };
        *self = Matrix::multiply(&frust, self);
    }

    /// Apply a symmetric perspective projection, `fovy` in degrees
    pub fn perspective(&mut self, fovy: f32, aspect: f32, near: f32, far: f32) {
        let h = (fovy / 360.0 * PI).tan() * near;
        let w = h * aspect;
        self.frustum(-w, w, -h, h, near, far);
    }

    /// Post-multiply by a translation
    pub fn translate(&mut self, tx: f32, ty: f32, tz: f32) {
        for col in 0..4 {
            self.m[3][col] += self.m[0][col] * tx + self.m[1][col] * ty + self.m[2][col] * tz;
        }
    }

    /// Flat column-major array for uniform upload
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (i, row) in self.m.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(row);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn transform(m: &Matrix, v: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0; 4];
        for (row, cell) in out.iter_mut().enumerate() {
            *cell = (0..4).map(|col| m.m[col][row] * v[col]).sum();
        }
        out
    }

    #[test]
    fn test_identity_multiply() {
        let r = Matrix::rotation(30.0, 0.0, 1.0, 0.0);
        assert_eq!(Matrix::multiply(&Matrix::identity(), &r), r);
        assert_eq!(Matrix::multiply(&r, &Matrix::identity()), r);
    }

    #[test]
    fn test_rotation_about_z() {
        let r = Matrix::rotation(90.0, 0.0, 0.0, 2.0);
        let v = transform(&r, [1.0, 0.0, 0.0, 1.0]);
        assert_relative_eq!(v[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(v[1].abs(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(v[2], 0.0, epsilon = 1e-6);
        assert_relative_eq!(v[3], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotate_back_and_forth() {
        let mut m = Matrix::identity();
        m.rotate(37.0, 1.0, 1.0, 0.0);
        m.rotate(-37.0, 1.0, 1.0, 0.0);
        for (row, expected) in m.m.iter().zip(Matrix::identity().m.iter()) {
            for (a, b) in row.iter().zip(expected.iter()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_zero_axis_rotation_is_identity() {
        assert_eq!(Matrix::rotation(45.0, 0.0, 0.0, 0.0), Matrix::identity());
    }

    #[test]
    fn test_translate_moves_origin() {
        let mut m = Matrix::identity();
        m.translate(1.0, 2.0, -5.0);
        let v = transform(&m, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(v, [1.0, 2.0, -5.0, 1.0]);
    }

    #[test]
    fn test_perspective_maps_near_plane() {
        let mut p = Matrix::identity();
        p.perspective(90.0, 1.0, 1.0, 10.0);
        let v = transform(&p, [0.0, 0.0, -1.0, 1.0]);
        assert_relative_eq!(v[2] / v[3], -1.0, epsilon = 1e-5);
        let v = transform(&p, [0.0, 0.0, -10.0, 1.0]);
        assert_relative_eq!(v[2] / v[3], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_degenerate_frustum_is_ignored() {
        let mut m = Matrix::identity();
        m.frustum(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0);
        assert_eq!(m, Matrix::identity());
    }

    #[test]
    fn test_cols_array_layout() {
        let mut m = Matrix::identity();
        m.translate(3.0, 4.0, 5.0);
        let a = m.to_cols_array();
        assert_eq!(&a[12..16], &[3.0, 4.0, 5.0, 1.0]);
    }
}
