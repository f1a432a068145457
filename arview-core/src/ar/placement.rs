//! Transform of the placed object

use crate::ar::reticle::ReticlePose;
use crate::config::PlacementLimits;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position, scale and yaw of the placed object.
///
/// The object counts as placed exactly when `position` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementTransform {
    /// World position, `None` while unplaced
    pub position: Option<Vec3>,
    /// Uniform scale
    pub scale: f32,
    /// Rotation around the vertical axis
    pub yaw_radians: f32,
}

impl PlacementTransform {
    /// Unplaced transform with the given scale
    pub fn unplaced(default_scale: f32) -> Self {
        Self {
            position: None,
            scale: default_scale,
            yaw_radians: 0.0,
        }
    }

    /// Whether the object has been placed
    pub fn placed(&self) -> bool {
        self.position.is_some()
    }

    /// Model matrix (scale, then yaw, then translation)
    pub fn matrix(&self) -> Option<Mat4> {
        self.position.map(|position| {
            Mat4::from_scale_rotation_translation(
                Vec3::splat(self.scale),
                Quat::from_rotation_y(self.yaw_radians),
                position,
            )
        })
    }
}

/// Update produced by the gesture interpreter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlacementUpdate {
    /// Move to an absolute ground-plane position
    Translate {
        /// Target position; its height is ignored
        position: Vec3,
    },
    /// Set scale and yaw together
    ScaleRotate {
        /// Target scale, clamped on write
        scale: f32,
        /// Target yaw
        yaw_radians: f32,
    },
}

/// Owns the placed object's transform
#[derive(Debug, Clone)]
pub struct PlacementController {
    transform: PlacementTransform,
    limits: PlacementLimits,
}

impl Default for PlacementController {
    fn default() -> Self {
        Self::new(PlacementLimits::default())
    }
}

impl PlacementController {
    /// Create an unplaced controller
    pub fn new(limits: PlacementLimits) -> Self {
        Self {
            transform: PlacementTransform::unplaced(limits.clamp_scale(limits.default_scale)),
            limits,
        }
    }

    /// Place the object at the reticle.
    ///
    /// Does nothing if already placed or if the reticle is not visible.
    /// Returns whether placement happened.
    pub fn commit_placement(&mut self, reticle: &ReticlePose) -> bool {
        if self.transform.placed() || !reticle.visible {
            return false;
        }
        let position = reticle.position();
        self.transform = PlacementTransform {
            position: Some(position),
            scale: self.limits.clamp_scale(self.limits.default_scale),
            yaw_radians: 0.0,
        };
        log::info!("Model placed at {:?}", position);
        true
    }

    /// Apply a gesture update; ignored while unplaced
    pub fn apply(&mut self, update: PlacementUpdate) -> bool {
        let Some(current) = self.transform.position else {
            return false;
        };
        match update {
            PlacementUpdate::Translate { position } => {
                if !(position.x.is_finite() && position.z.is_finite()) {
                    return false;
                }
                self.transform.position = Some(Vec3::new(position.x, current.y, position.z));
            }
            PlacementUpdate::ScaleRotate { scale, yaw_radians } => {
                self.transform.scale = self.limits.clamp_scale(scale);
                if yaw_radians.is_finite() {
                    self.transform.yaw_radians = yaw_radians;
                }
            }
        }
        true
    }

    /// Back to the unplaced default; safe to call at any time
    pub fn reset(&mut self) {
        self.transform = PlacementTransform::unplaced(self.limits.clamp_scale(self.limits.default_scale));
    }

    /// Current transform
    pub fn transform(&self) -> PlacementTransform {
        self.transform
    }

    /// Whether the object has been placed
    pub fn is_placed(&self) -> bool {
        self.transform.placed()
    }

    /// Scale bounds in effect
    pub fn limits(&self) -> &PlacementLimits {
        &self.limits
    }
}
