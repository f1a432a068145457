//! Framing of the model in preview mode

use crate::math::Aabb;
use glam::{Mat4, Vec3};

/// Centers a model at the origin and fits it to a target size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewFraming {
    bounds: Aabb,
    target_size: f32,
}

impl PreviewFraming {
    /// Frame a model with the given bounds
    pub fn new(bounds: Aabb, target_size: f32) -> Self {
        Self {
            bounds,
            target_size,
        }
    }

    /// Offset that moves the bounds center to the origin
    pub fn center_offset(&self) -> Vec3 {
        -self.bounds.center()
    }

    /// Uniform scale that makes the largest dimension `target_size`
    pub fn fit_scale(&self) -> f32 {
        let max_dim = self.bounds.max_dimension();
        if max_dim > f32::EPSILON && max_dim.is_finite() {
            self.target_size / max_dim
        } else {
            1.0
        }
    }

    /// Model matrix for preview mode: centered, then scaled about the origin
    pub fn preview_matrix(&self) -> Mat4 {
        Mat4::from_scale(Vec3::splat(self.fit_scale())) * self.centering_matrix()
    }

    /// Centering only; used under the AR placement transform
    pub fn centering_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.center_offset())
    }

    /// Bounds the framing was computed from
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }
}
