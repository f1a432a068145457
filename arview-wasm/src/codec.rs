//! Decoding of flat JS arguments into engine types

use arview_core::{Aabb, ArFrame, HitTestResult, HitTestSourceId, SessionId};
use arview_core::{TouchEvent, TouchPhase, TouchPoint};
use glam::Vec3;

/// Errors decoding arguments passed from JavaScript
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// Unknown touch event type
    #[error("Unknown touch phase: {0}")]
    UnknownPhase(String),

    /// Parallel arrays disagree in length
    #[error("Touch arrays differ in length: {ids} ids, {xs} xs, {ys} ys")]
    TouchLengthMismatch { ids: usize, xs: usize, ys: usize },

    /// Hit poses must be whole 4x4 matrices
    #[error("Hit pose buffer of {0} floats is not a multiple of 16")]
    BadPoseBuffer(usize),

    /// A pose contained NaN or infinity
    #[error("Hit pose {0} is not finite")]
    NonFinitePose(usize),

    /// Bounds need three components per corner
    #[error("Bounds corners need 3 components, got {min} and {max}")]
    BadBounds { min: usize, max: usize },
}

/// Map a DOM touch event type (or its short form) to a phase
pub fn parse_phase(phase: &str) -> Result<TouchPhase, CodecError> {
    match phase {
        "touchstart" | "start" => Ok(TouchPhase::Began),
        "touchmove" | "move" => Ok(TouchPhase::Moved),
        "touchend" | "end" => Ok(TouchPhase::Ended),
        "touchcancel" | "cancel" => Ok(TouchPhase::Cancelled),
        other => Err(CodecError::UnknownPhase(other.to_string())),
    }
}

/// Build a touch event from `event.touches` flattened into parallel arrays
pub fn decode_touch_event(
    phase: &str,
    ids: &[u32],
    xs: &[f32],
    ys: &[f32],
    timestamp_ms: f64,
) -> Result<TouchEvent, CodecError> {
    let phase = parse_phase(phase)?;
    if ids.len() != xs.len() || ids.len() != ys.len() {
        return Err(CodecError::TouchLengthMismatch {
            ids: ids.len(),
            xs: xs.len(),
            ys: ys.len(),
        });
    }
    let touches = ids
        .iter()
        .zip(xs.iter().zip(ys))
        .map(|(&id, (&x, &y))| TouchPoint::new(id, x, y))
        .collect();
    Ok(TouchEvent::new(phase, touches, timestamp_ms))
}

/// Build a frame from concatenated column-major hit poses.
///
/// Without a `source` the frame carries no hit-test results at all.
pub fn decode_frame(
    session: u32,
    source: Option<u32>,
    hits: &[f32],
    timestamp_ms: f64,
) -> Result<ArFrame, CodecError> {
    let session = SessionId(session);
    let Some(source) = source else {
        return Ok(ArFrame::empty(session, timestamp_ms));
    };
    if hits.len() % 16 != 0 {
        return Err(CodecError::BadPoseBuffer(hits.len()));
    }
    let hits = hits
        .chunks_exact(16)
        .enumerate()
        .map(|(i, chunk)| HitTestResult::from_slice(chunk).ok_or(CodecError::NonFinitePose(i)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ArFrame::with_hits(session, HitTestSourceId(source), hits, timestamp_ms))
}

/// Build bounds from `Box3.min` / `Box3.max` arrays
pub fn decode_bounds(min: &[f32], max: &[f32]) -> Result<Aabb, CodecError> {
    if min.len() != 3 || max.len() != 3 {
        return Err(CodecError::BadBounds {
            min: min.len(),
            max: max.len(),
        });
    }
    Ok(Aabb::new(Vec3::from_slice(min), Vec3::from_slice(max)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn test_parse_phase() {
        assert_eq!(parse_phase("touchstart"), Ok(TouchPhase::Began));
        assert_eq!(parse_phase("move"), Ok(TouchPhase::Moved));
        assert_eq!(parse_phase("touchcancel"), Ok(TouchPhase::Cancelled));
        assert!(matches!(parse_phase("click"), Err(CodecError::UnknownPhase(_))));
    }

    #[test]
    fn test_decode_touch_event() {
        let event = decode_touch_event("touchmove", &[4, 9], &[1.0, 2.0], &[3.0, 4.0], 12.5).unwrap();
        assert_eq!(event.phase, TouchPhase::Moved);
        assert_eq!(event.touches, vec![TouchPoint::new(4, 1.0, 3.0), TouchPoint::new(9, 2.0, 4.0)]);
        assert_eq!(event.timestamp_ms, 12.5);

        let err = decode_touch_event("touchend", &[1], &[], &[], 0.0).unwrap_err();
        assert_eq!(err, CodecError::TouchLengthMismatch { ids: 1, xs: 0, ys: 0 });
    }

    #[test]
    fn test_decode_frame() {
        let mut poses = Mat4::from_translation(Vec3::new(1.0, 0.0, -2.0)).to_cols_array().to_vec();
        poses.extend_from_slice(&Mat4::IDENTITY.to_cols_array());

        let frame = decode_frame(3, Some(8), &poses, 16.0).unwrap();
        let results = frame.hit_results.unwrap();
        assert_eq!(frame.session, SessionId(3));
        assert_eq!(results.source, HitTestSourceId(8));
        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.hits[0].pose.w_axis.truncate(), Vec3::new(1.0, 0.0, -2.0));

        assert_eq!(decode_frame(3, Some(8), &poses[..20], 16.0), Err(CodecError::BadPoseBuffer(20)));
        assert!(decode_frame(3, None, &[], 16.0).unwrap().hit_results.is_none());
    }

    #[test]
    fn test_decode_bounds() {
        let aabb = decode_bounds(&[1.0, 2.0, 3.0], &[-1.0, 0.0, 0.0]).unwrap();
        assert_eq!(aabb.min, Vec3::new(-1.0, 0.0, 0.0));
        assert!(decode_bounds(&[1.0], &[0.0, 0.0, 0.0]).is_err());
    }
}
