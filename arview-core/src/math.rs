//! Geometry helpers shared by the reticle, gesture and placement code
//!
//! Screen-space quantities use `Vec2` in CSS pixels; world-space quantities
//! use `Vec3` in meters with +Y up, matching the WebXR `local` reference space.

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Translation, rotation and scale recovered from an affine transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position in world space
    pub position: Vec3,
    /// Orientation
    pub rotation: Quat,
    /// Per-axis scale
    pub scale: Vec3,
}

impl Pose {
    /// Decompose a transform matrix into its parts
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Rebuild the transform matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Build a matrix from 16 column-major floats, the layout WebXR poses use
pub fn matrix_from_slice(values: &[f32]) -> Option<Mat4> {
    if values.len() != 16 || values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(Mat4::from_cols_slice(values))
}

/// Map a screen-space drag onto the ground plane.
///
/// Horizontal screen motion moves along local X, vertical motion along local Z.
/// The Y component is always zero.
pub fn ground_plane_offset(screen_delta: Vec2, sensitivity: f32) -> Vec3 {
    Vec3::new(screen_delta.x * sensitivity, 0.0, screen_delta.y * sensitivity)
}

/// Distance between two screen points
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Angle of the segment from `a` to `b`, in radians within (-PI, PI]
pub fn angle(a: Vec2, b: Vec2) -> f32 {
    let d = b - a;
    d.y.atan2(d.x)
}

/// Clamp into `[min, max]`; NaN collapses to `min`
pub fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.max(min).min(max)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Box containing nothing; extending it with any point yields that point
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a box from two corners, in any order
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box containing all points
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut acc, p| {
            acc.extend(p);
            acc
        })
    }

    /// True if no point has been added
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow to include a point
    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Bounds of this box after transforming all eight corners
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        Self::from_points(self.corners().map(|c| matrix.transform_point3(c)))
    }

    /// The eight corners
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Center point
    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        (self.min + self.max) * 0.5
    }

    /// Extent along each axis
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        self.max - self.min
    }

    /// Largest extent
    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_pose_roundtrip_keeps_translation() {
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_y(0.5),
            Vec3::new(1.0, -0.5, 3.0),
        );
        let pose = Pose::from_matrix(&matrix);

        assert!(pose.position.abs_diff_eq(Vec3::new(1.0, -0.5, 3.0), 1e-5));
        assert!(pose.scale.abs_diff_eq(Vec3::splat(2.0), 1e-5));
        assert!(pose.to_matrix().abs_diff_eq(matrix, 1e-5));
    }

    #[test]
    fn test_matrix_from_slice_rejects_bad_input() {
        assert!(matrix_from_slice(&[0.0; 15]).is_none());

        let mut values = Mat4::IDENTITY.to_cols_array();
        values[13] = 1.5;
        let matrix = matrix_from_slice(&values).unwrap();
        assert_eq!(Pose::from_matrix(&matrix).position, Vec3::new(0.0, 1.5, 0.0));

        values[0] = f32::NAN;
        assert!(matrix_from_slice(&values).is_none());
    }

    #[test]
    fn test_ground_plane_offset_never_moves_height() {
        let offset = ground_plane_offset(Vec2::new(50.0, -25.0), 0.002);
        assert!((offset.x - 0.1).abs() < 1e-6);
        assert_eq!(offset.y, 0.0);
        assert!((offset.z + 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_distance_and_angle() {
        let a = Vec2::new(0.0, 0.0);
        assert_eq!(distance(a, Vec2::new(3.0, 4.0)), 5.0);
        assert!((angle(a, Vec2::new(0.0, 10.0)) - FRAC_PI_2).abs() < 1e-6);
        assert!((angle(a, Vec2::new(-1.0, 0.0)) - PI).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_finite() {
        assert_eq!(clamp_finite(5.0, 0.1, 2.0), 2.0);
        assert_eq!(clamp_finite(-1.0, 0.1, 2.0), 0.1);
        assert_eq!(clamp_finite(f32::NAN, 0.1, 2.0), 0.1);
        assert_eq!(clamp_finite(f32::INFINITY, 0.1, 2.0), 2.0);
    }

    #[test]
    fn test_aabb_center_size() {
        let aabb = Aabb::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 0.0, -1.0));
        assert_eq!(aabb.center(), Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(aabb.size(), Vec3::new(2.0, 2.0, 4.0));
        assert_eq!(aabb.max_dimension(), 4.0);
        assert!(Aabb::EMPTY.is_empty());
        assert_eq!(Aabb::EMPTY.size(), Vec3::ZERO);
    }

    #[test]
    fn test_aabb_transformed() {
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let moved = aabb.transformed(&Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)));
        assert_eq!(moved.center(), Vec3::new(0.0, 5.0, 0.0));

        let rotated = Aabb::new(Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0))
            .transformed(&Mat4::from_rotation_y(FRAC_PI_2));
        assert!((rotated.size().z - 2.0).abs() < 1e-5);
        assert!((rotated.size().x - 1.0).abs() < 1e-5);
    }
}
