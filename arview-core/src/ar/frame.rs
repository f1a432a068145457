//! Per-frame data delivered by the XR frame source

use crate::math::matrix_from_slice;
use glam::Mat4;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation number for one AR session.
///
/// Every asynchronous completion is tagged with the session it was issued
/// for, so results from a session that has already ended can be told apart
/// from results for the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Handle of a hit-test source created by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HitTestSourceId(pub u32);

/// Hit test result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitTestResult {
    /// Pose of the intersection in the session reference space
    pub pose: Mat4,
}

impl HitTestResult {
    /// Create a result from a pose matrix
    pub fn new(pose: Mat4) -> Self {
        Self { pose }
    }

    /// Decode a result from 16 column-major floats
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        matrix_from_slice(values).map(Self::new)
    }
}

/// Hit test results for one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameHitResults {
    /// Source the results were produced by
    pub source: HitTestSourceId,
    /// Intersections ordered nearest first
    pub hits: Vec<HitTestResult>,
}

/// AR frame data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArFrame {
    /// Session the frame belongs to
    pub session: SessionId,
    /// Hit test results, absent when no source has been queried this frame
    pub hit_results: Option<FrameHitResults>,
    /// Frame timestamp
    pub timestamp_ms: f64,
}

impl ArFrame {
    /// Frame with no hit-test data
    pub fn empty(session: SessionId, timestamp_ms: f64) -> Self {
        Self {
            session,
            hit_results: None,
            timestamp_ms,
        }
    }

    /// Frame carrying results for `source`
    pub fn with_hits(
        session: SessionId,
        source: HitTestSourceId,
        hits: Vec<HitTestResult>,
        timestamp_ms: f64,
    ) -> Self {
        Self {
            session,
            hit_results: Some(FrameHitResults { source, hits }),
            timestamp_ms,
        }
    }
}
