//! Surface reticle tracking from per-frame hit-test results

use crate::ar::frame::{ArFrame, HitTestSourceId, SessionId};
use crate::error::ArError;
use crate::math::Pose;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Current surface-hit pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReticlePose {
    /// Pose of the detected surface point
    pub matrix: Mat4,
    /// Whether a surface is currently under the reticle
    pub visible: bool,
}

impl Default for ReticlePose {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            visible: false,
        }
    }
}

impl ReticlePose {
    /// Surface hit decomposed into position, orientation and scale
    pub fn hit_pose(&self) -> Pose {
        Pose::from_matrix(&self.matrix)
    }

    /// Position of the surface hit
    pub fn position(&self) -> Vec3 {
        self.hit_pose().position
    }

    /// Transform for the ring mesh, laid flat onto the surface
    pub fn reticle_matrix(&self) -> Mat4 {
        self.matrix * Mat4::from_rotation_x(-FRAC_PI_2)
    }
}

/// Lifecycle of the per-session hit-test source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitTestQueryState {
    /// No session
    Inactive,
    /// Creation requested, not resolved yet
    Pending {
        /// Owning session
        session: SessionId,
    },
    /// Source available for frame queries
    Ready {
        /// Owning session
        session: SessionId,
        /// Platform handle
        source: HitTestSourceId,
    },
}

impl HitTestQueryState {
    fn session(&self) -> Option<SessionId> {
        match *self {
            HitTestQueryState::Inactive => None,
            HitTestQueryState::Pending { session } | HitTestQueryState::Ready { session, .. } => {
                Some(session)
            }
        }
    }
}

/// Tracks where the reticle sits for the current session
#[derive(Debug, Clone)]
pub struct ReticleTracker {
    pose: ReticlePose,
    query: HitTestQueryState,
}

impl Default for ReticleTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ReticleTracker {
    /// Create an inactive tracker
    pub fn new() -> Self {
        Self {
            pose: ReticlePose::default(),
            query: HitTestQueryState::Inactive,
        }
    }

    /// Start tracking for `session`.
    ///
    /// Returns `true` when the caller must issue the hit-test source request.
    /// A second call for the same session returns `false`, so the source is
    /// created once per session.
    pub fn begin_session(&mut self, session: SessionId) -> bool {
        if self.query.session() == Some(session) {
            return false;
        }
        log::debug!("Hit-test source requested for {}", session);
        self.query = HitTestQueryState::Pending { session };
        self.pose = ReticlePose::default();
        true
    }

    /// The platform resolved the hit-test source
    pub fn on_source_ready(
        &mut self,
        session: SessionId,
        source: HitTestSourceId,
    ) -> Result<(), ArError> {
        match self.query {
            HitTestQueryState::Pending { session: current } if current == session => {
                log::debug!("Hit-test source {:?} ready for {}", source, session);
                self.query = HitTestQueryState::Ready { session, source };
                Ok(())
            }
            HitTestQueryState::Ready { session: current, .. } if current == session => {
                log::warn!("Ignoring duplicate hit-test source for {}", session);
                Ok(())
            }
            _ => Err(ArError::StaleQueryResult {
                expected: self.query.session(),
                received: session,
            }),
        }
    }

    /// Update the reticle from this frame's hit-test results.
    ///
    /// Frames from any other session are rejected without touching the pose.
    pub fn update(&mut self, frame: &ArFrame) -> Result<&ReticlePose, ArError> {
        match self.query {
            HitTestQueryState::Ready { session, source } if session == frame.session => {
                let first_hit = frame
                    .hit_results
                    .as_ref()
                    .filter(|results| results.source == source)
                    .and_then(|results| results.hits.first());

                match first_hit {
                    Some(hit) => {
                        self.pose.matrix = hit.pose;
                        self.pose.visible = true;
                    }
                    None => self.pose.visible = false,
                }
                Ok(&self.pose)
            }
            HitTestQueryState::Pending { session } if session == frame.session => {
                self.pose.visible = false;
                Ok(&self.pose)
            }
            _ => Err(ArError::StaleQueryResult {
                expected: self.query.session(),
                received: frame.session,
            }),
        }
    }

    /// Forget the pose once an object has been placed; the source stays alive
    pub fn clear_pose(&mut self) {
        self.pose = ReticlePose::default();
    }

    /// Drop the hit-test source and the pose
    pub fn end_session(&mut self) {
        if let Some(session) = self.query.session() {
            log::debug!("Hit-test source discarded for {}", session);
        }
        self.query = HitTestQueryState::Inactive;
        self.pose = ReticlePose::default();
    }

    /// Current pose
    pub fn pose(&self) -> &ReticlePose {
        &self.pose
    }

    /// Whether a surface is under the reticle
    pub fn is_visible(&self) -> bool {
        self.pose.visible
    }

    /// Source lifecycle
    pub fn query_state(&self) -> HitTestQueryState {
        self.query
    }

    /// Position to place at, only while the reticle is visible
    pub fn placement_position(&self) -> Option<Vec3> {
        self.pose.visible.then(|| self.pose.position())
    }
}
