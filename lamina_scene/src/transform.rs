// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 transforms for native scene nodes.
//!
//! Native entity nodes are positioned by translation, scale, and rotation
//! rather than by a matrix. [`Transform3d::decompose`] splits a transform
//! into those parts.

use core::ops::Mul;

use kurbo::Affine;

/// A column-major 4×4 affine transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

/// Translation, scale, and rotation parts of a [`Transform3d`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decomposition {
    /// Translation along x, y, and z.
    pub translation: [f64; 3],
    /// Scale along x, y, and z.
    pub scale: [f64; 3],
    /// Rotation as a unit quaternion `[x, y, z, w]`.
    pub rotation: [f64; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a transform from four column arrays.
    #[inline]
    #[must_use]
    pub const fn from_cols(col0: [f64; 4], col1: [f64; 4], col2: [f64; 4], col3: [f64; 4]) -> Self {
        Self {
            cols: [col0, col1, col2, col3],
        }
    }

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self::from_cols(
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [x, y, z, 1.0],
        )
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self::from_cols(
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, sz, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_cols(
            [c, s, 0.0, 0.0],
            [-s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    /// Embeds a 2D affine transform in the z = 0 plane.
    #[must_use]
    pub fn from_affine(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self::from_cols(
            [a, b, 0.0, 0.0],
            [c, d, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [e, f, 0.0, 1.0],
        )
    }

    /// Is this transform the identity?
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Splits the transform into translation, scale, and rotation.
    ///
    /// Only transforms whose upper-left block acts in the xy plane are
    /// handled; shear and perspective are dropped. Returns `None` for
    /// non-finite or degenerate transforms.
    #[must_use]
    pub fn decompose(&self) -> Option<Decomposition> {
        if !self.is_finite() || self.cols[3][3] == 0.0 {
            return None;
        }
        let w = self.cols[3][3];
        let [a, b] = [self.cols[0][0] / w, self.cols[0][1] / w];
        let [c, d] = [self.cols[1][0] / w, self.cols[1][1] / w];
        let scale_x = a.hypot(b);
        if scale_x == 0.0 {
            return None;
        }
        let determinant = a * d - b * c;
        if determinant == 0.0 {
            return None;
        }
        // A reflection shows up as a negative y scale.
        let scale_y = determinant / scale_x;
        let angle = b.atan2(a);
        let (sin_half, cos_half) = (angle * 0.5).sin_cos();
        Some(Decomposition {
            translation: [self.cols[3][0] / w, self.cols[3][1] / w, self.cols[3][2] / w],
            scale: [scale_x, scale_y, self.cols[2][2] / w],
            rotation: [0.0, 0.0, sin_half, cos_half],
        })
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Affine> for Transform3d {
    fn from(affine: Affine) -> Self {
        Self::from_affine(affine)
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        for (j, col) in out.iter_mut().enumerate() {
            for (i, value) in col.iter_mut().enumerate() {
                *value = a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
            }
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn affine_embedding_matches_multiplication() {
        let a = Affine::translate((3.0, 4.0)) * Affine::scale_non_uniform(2.0, 5.0);
        let b = Affine::rotate(0.5);
        let product = Transform3d::from(a) * Transform3d::from(b);
        let expected = Transform3d::from(a * b);
        for (p, e) in product.cols.iter().flatten().zip(expected.cols.iter().flatten()) {
            assert!(close(*p, *e), "{product:?} != {expected:?}");
        }
    }

    #[test]
    fn decompose_translate_scale() {
        let t = Transform3d::from_translation(3.0, 4.0, 5.0) * Transform3d::from_scale(2.0, 3.0, 1.0);
        let parts = t.decompose().unwrap();
        assert_eq!(parts.translation, [3.0, 4.0, 5.0]);
        assert_eq!(parts.scale, [2.0, 3.0, 1.0]);
        assert_eq!(parts.rotation, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn decompose_rotation() {
        let t = Transform3d::from_rotation_z(core::f64::consts::FRAC_PI_2) * Transform3d::from_scale(2.0, 2.0, 1.0);
        let parts = t.decompose().unwrap();
        assert!(close(parts.scale[0], 2.0), "{parts:?}");
        assert!(close(parts.scale[1], 2.0), "{parts:?}");
        let half = core::f64::consts::FRAC_PI_4;
        assert!(close(parts.rotation[2], half.sin()), "{parts:?}");
        assert!(close(parts.rotation[3], half.cos()), "{parts:?}");
    }

    #[test]
    fn degenerate_transforms_do_not_decompose() {
        assert!(Transform3d::from_scale(0.0, 1.0, 1.0).decompose().is_none());
        assert!(Transform3d::from_affine(Affine::new([1.0, 2.0, 2.0, 4.0, 0.0, 0.0])).decompose().is_none());
        let mut t = Transform3d::IDENTITY;
        t.cols[2][1] = f64::NAN;
        assert!(!t.is_finite());
        assert!(t.decompose().is_none());
    }

    #[test]
    fn identity_checks() {
        assert!(Transform3d::default().is_identity());
        assert!(!Transform3d::from_translation(1.0, 0.0, 0.0).is_identity());
    }
}
