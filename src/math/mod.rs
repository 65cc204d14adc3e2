//! 4x4 transform math for the render loop.
//!
//! Matrices are column-major and `#[repr(C)]`, so a [`Mat4`] can be written
//! straight into a uniform buffer and read as a Metal `float4x4`. All
//! operations are pure functions of their inputs.

use thiserror::Error;

/// Errors from constructing a transform with invalid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MathError {
    #[error("perspective requires a positive aspect ratio, got {0}")]
    InvalidAspectRatio(f32),

    #[error("perspective requires 0 < near < far, got near {near} and far {far}")]
    InvalidDepthRange { near: f32, far: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[must_use]
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[must_use]
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

/// Column-major 4x4 matrix. `cols[c][r]` is row `r` of column `c`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Translation by `(x, y, z)`; every other component is identity.
    #[must_use]
    pub const fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::identity();
        m.cols[3] = [x, y, z, 1.0];
        m
    }

    /// Rotation of `angle` radians about `axis` (Rodrigues' formula).
    ///
    /// `axis` must be unit length. A non-unit axis is not rejected and
    /// silently produces a skewed, non-rigid transform.
    #[must_use]
    pub fn rotation(angle: f32, axis: Vec3) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        let ci = 1.0 - c;
        let Vec3 { x, y, z } = axis;

        Self {
            cols: [
                [c + x * x * ci, y * x * ci + z * s, z * x * ci - y * s, 0.0],
                [x * y * ci - z * s, c + y * y * ci, z * y * ci + x * s, 0.0],
                [x * z * ci + y * s, y * z * ci - x * s, c + z * z * ci, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Right-handed perspective projection.
    ///
    /// Maps the near plane to NDC depth -1 and the far plane to +1.
    ///
    /// # Errors
    /// Rejects `aspect_ratio <= 0`, `near <= 0`, and `far <= near`.
    pub fn perspective(
        aspect_ratio: f32,
        fov_y: f32,
        near: f32,
        far: f32,
    ) -> Result<Self, MathError> {
        if aspect_ratio <= 0.0 {
            return Err(MathError::InvalidAspectRatio(aspect_ratio));
        }
        if near <= 0.0 || far <= near {
            return Err(MathError::InvalidDepthRange { near, far });
        }

        let y_scale = 1.0 / (fov_y * 0.5).tan();
        let x_scale = y_scale / aspect_ratio;
        let z_range = far - near;
        let z_scale = -(far + near) / z_range;
        let wz_scale = -2.0 * far * near / z_range;

        Ok(Self {
            cols: [
                [x_scale, 0.0, 0.0, 0.0],
                [0.0, y_scale, 0.0, 0.0],
                [0.0, 0.0, z_scale, -1.0],
                [0.0, 0.0, wz_scale, 0.0],
            ],
        })
    }

    /// Matrix product `self * other`. Not commutative; the render loop
    /// composes `projection * (view * model)`.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        let mut cols = [[0.0f32; 4]; 4];
        for (c, col) in cols.iter_mut().enumerate() {
            for (r, value) in col.iter_mut().enumerate() {
                *value = (0..4).map(|k| self.cols[k][r] * other.cols[c][k]).sum();
            }
        }
        Self { cols }
    }

    #[must_use]
    pub fn multiply_vec4(&self, v: &Vec4) -> Vec4 {
        let v = [v.x, v.y, v.z, v.w];
        let mut out = [0.0f32; 4];
        for (r, value) in out.iter_mut().enumerate() {
            *value = (0..4).map(|c| self.cols[c][r] * v[c]).sum();
        }
        Vec4::new(out[0], out[1], out[2], out[3])
    }
}

/// Normalizes an angle into `[0, 2π)`.
///
/// The renderer accumulates its rotation through this each frame so the
/// angle never grows without bound.
#[must_use]
pub fn wrap_angle(radians: f32) -> f32 {
    radians.rem_euclid(std::f32::consts::TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

    const Y_AXIS: Vec3 = Vec3::new(0.0, 1.0, 0.0);

    fn assert_mat_eq(a: &Mat4, b: &Mat4, epsilon: f32) {
        for c in 0..4 {
            for r in 0..4 {
                assert_abs_diff_eq!(a.cols[c][r], b.cols[c][r], epsilon = epsilon);
            }
        }
    }

    #[test]
    fn zero_rotation_is_identity() {
        for axis in [Y_AXIS, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)] {
            assert_mat_eq(&Mat4::rotation(0.0, axis), &Mat4::identity(), 1e-6);
        }
    }

    #[test]
    fn four_quarter_turns_return_to_identity() {
        let quarter = Mat4::rotation(FRAC_PI_2, Y_AXIS);
        let full = quarter
            .multiply(&quarter)
            .multiply(&quarter)
            .multiply(&quarter);
        assert_mat_eq(&full, &Mat4::identity(), 1e-5);
    }

    #[test]
    fn multiplication_is_associative() {
        let a = Mat4::rotation(0.7, Y_AXIS);
        let b = Mat4::translation(1.0, -2.0, 3.0);
        let c = Mat4::rotation(1.3, Vec3::new(1.0, 0.0, 0.0));

        let left = a.multiply(&b).multiply(&c);
        let right = a.multiply(&b.multiply(&c));
        assert_mat_eq(&left, &right, 1e-5);
    }

    #[test]
    fn translation_moves_a_point() {
        let m = Mat4::translation(1.0, 2.0, 3.0);
        let p = m.multiply_vec4(&Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(p, Vec4::new(1.0, 2.0, 3.0, 1.0));
    }

    #[test]
    fn perspective_maps_near_and_far_planes() {
        let (near, far) = (0.1, 100.0);
        let proj = Mat4::perspective(16.0 / 9.0, FRAC_PI_4, near, far).unwrap();

        // The camera looks down -z; points on the near/far planes land at
        // NDC depth -1 and +1 after the perspective divide.
        let on_near = proj.multiply_vec4(&Vec4::new(0.0, 0.0, -near, 1.0));
        assert_abs_diff_eq!(on_near.z / on_near.w, -1.0, epsilon = 1e-5);

        let on_far = proj.multiply_vec4(&Vec4::new(0.0, 0.0, -far, 1.0));
        assert_abs_diff_eq!(on_far.z / on_far.w, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn perspective_rejects_invalid_parameters() {
        assert_eq!(
            Mat4::perspective(0.0, FRAC_PI_4, 0.1, 100.0),
            Err(MathError::InvalidAspectRatio(0.0))
        );
        assert_eq!(
            Mat4::perspective(1.0, FRAC_PI_4, -0.1, 100.0),
            Err(MathError::InvalidDepthRange {
                near: -0.1,
                far: 100.0
            })
        );
        assert_eq!(
            Mat4::perspective(1.0, FRAC_PI_4, 10.0, 1.0),
            Err(MathError::InvalidDepthRange {
                near: 10.0,
                far: 1.0
            })
        );
    }

    #[test]
    fn wrap_angle_stays_in_one_turn() {
        assert_abs_diff_eq!(wrap_angle(TAU + 0.25), 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(wrap_angle(-FRAC_PI_2), 1.5 * PI, epsilon = 1e-6);
        assert_abs_diff_eq!(wrap_angle(0.02), 0.02, epsilon = 1e-6);
    }

    #[test]
    fn rotation_preserves_axis() {
        let rotated = Mat4::rotation(1.1, Y_AXIS).multiply_vec4(&Vec4::new(0.0, 2.0, 0.0, 1.0));
        assert_abs_diff_eq!(rotated.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(rotated.y, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(rotated.z, 0.0, epsilon = 1e-6);
    }
}
