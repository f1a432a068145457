//! End-to-end tests for AR placement through the viewer

use arview_core::ar::EndReason;
use arview_core::{ArError, GestureKind, SessionEvent, SessionState, TouchPhase, ViewMode};
use glam::Vec3;
use test_helpers::*;

#[test]
fn test_place_drag_pinch_then_platform_end() {
    init_logging();
    let platform = FakePlatform::supporting();
    let (mut viewer, id) = active_viewer(&platform);
    assert_eq!(viewer.session_state(), SessionState::Active);
    assert!(!viewer.placement().placed());

    // Reticle finds a surface at P, tap places the model there.
    let p = Vec3::new(0.3, -1.2, -0.9);
    viewer.on_frame(&frame_hit(id, p, 16.0));
    tap(&mut viewer, 200.0, 400.0, 20.0);

    let placed = viewer.placement();
    assert!(placed.placed());
    assert_eq!(placed.position, Some(p));
    assert_eq!(placed.scale, 0.3);
    assert_eq!(placed.yaw_radians, 0.0);

    // One finger, +50px horizontally.
    viewer.on_touch(&touch(TouchPhase::Began, &[(1, 100.0, 300.0)], 200.0));
    assert_eq!(viewer.snapshot().gesture, GestureKind::Drag);
    viewer.on_touch(&touch(TouchPhase::Moved, &[(1, 120.0, 300.0)], 216.0));
    viewer.on_touch(&touch(TouchPhase::Moved, &[(1, 150.0, 300.0)], 232.0));
    viewer.on_touch(&touch(TouchPhase::Ended, &[], 248.0));

    let position = viewer.placement().position.unwrap();
    assert!(position.abs_diff_eq(p + Vec3::new(0.1, 0.0, 0.0), 1e-6));

    // Two fingers spreading from 100px to 150px.
    viewer.on_touch(&touch(TouchPhase::Began, &[(2, 100.0, 300.0)], 300.0));
    viewer.on_touch(&touch(TouchPhase::Began, &[(2, 100.0, 300.0), (3, 200.0, 300.0)], 305.0));
    assert_eq!(viewer.snapshot().gesture, GestureKind::PinchRotate);
    viewer.on_touch(&touch(TouchPhase::Moved, &[(2, 100.0, 300.0), (3, 250.0, 300.0)], 320.0));

    let transform = viewer.placement();
    assert!((transform.scale - 0.35).abs() < 1e-6);
    assert!(transform.yaw_radians.abs() < 1e-6);
    assert!(transform.position.unwrap().abs_diff_eq(position, 1e-6));

    // The platform ends the session.
    viewer.on_session_end(id);
    let transform = viewer.placement();
    assert_eq!(viewer.session_state(), SessionState::Idle);
    assert_eq!(transform.position, None);
    assert_eq!(transform.scale, 0.3);
    assert_eq!(transform.yaw_radians, 0.0);
    assert_eq!(viewer.mode(), ViewMode::Preview);
    assert_eq!(platform.ended.get(), 1);
    assert_eq!(
        viewer.drain_events(),
        vec![SessionEvent::Ended { session: id, reason: EndReason::PlatformEnded }]
    );
}

#[test]
fn test_unsupported_device_never_starts() {
    init_logging();
    let platform = FakePlatform::unsupported();
    let mut viewer = arview_core::ArViewer::default();

    assert!(!pollster::block_on(viewer.probe_support(&platform)));
    assert!(!viewer.controls().start_enabled);
    let err = pollster::block_on(viewer.start_ar(&platform)).unwrap_err();
    assert_eq!(err, ArError::CapabilityUnavailable);
    assert_eq!(viewer.session_state(), SessionState::Unsupported);
}

#[test]
fn test_rejected_start_is_retryable() {
    init_logging();
    let platform = FakePlatform::rejecting();
    let mut viewer = arview_core::ArViewer::default();
    pollster::block_on(viewer.probe_support(&platform));

    assert!(pollster::block_on(viewer.start_ar(&platform)).is_err());
    assert_eq!(viewer.session_state(), SessionState::Idle);
    assert!(viewer
        .drain_events()
        .iter()
        .any(|e| matches!(e, SessionEvent::StartFailed { .. })));

    let accepting = FakePlatform::supporting();
    assert!(pollster::block_on(viewer.start_ar(&accepting)).is_ok());
    assert_eq!(viewer.session_state(), SessionState::Active);
}

#[test]
fn test_stop_twice_and_late_platform_end() {
    init_logging();
    let platform = FakePlatform::supporting();
    let (mut viewer, id) = active_viewer(&platform);
    viewer.on_frame(&frame_hit(id, Vec3::ZERO, 16.0));
    tap(&mut viewer, 0.0, 0.0, 20.0);

    viewer.stop_ar();
    let after_first = (viewer.session_state(), viewer.placement());
    viewer.stop_ar();
    viewer.on_session_end(id);

    assert_eq!((viewer.session_state(), viewer.placement()), after_first);
    assert_eq!(platform.ended.get(), 1);
    assert_eq!(viewer.drain_events().len(), 1);
}

#[test]
fn test_frames_from_ended_session_are_ignored() {
    init_logging();
    let platform = FakePlatform::supporting();
    let (mut viewer, first) = active_viewer(&platform);
    viewer.stop_ar();

    let second = pollster::block_on(viewer.start_ar(&platform)).unwrap();
    assert_ne!(first, second);

    // A late source and frame from the first session must not reach the reticle.
    assert!(viewer.on_hit_test_source_ready(first, SOURCE).is_err());
    let snapshot = viewer.on_frame(&frame_hit(first, Vec3::ONE, 100.0));
    assert!(snapshot.reticle.is_none());

    // Before the second session's source resolves, frames report no surface.
    let snapshot = viewer.on_frame(&frame_hit(second, Vec3::ONE, 116.0));
    assert!(snapshot.reticle.is_none());

    viewer.on_hit_test_source_ready(second, SOURCE).unwrap();
    let snapshot = viewer.on_frame(&frame_hit(second, Vec3::ONE, 132.0));
    assert!(snapshot.reticle.is_some());
}

#[test]
fn test_surface_lost_before_tap_does_not_place() {
    init_logging();
    let platform = FakePlatform::supporting();
    let (mut viewer, id) = active_viewer(&platform);

    viewer.on_frame(&frame_hit(id, Vec3::ONE, 16.0));
    viewer.on_frame(&frame_miss(id, 32.0));
    tap(&mut viewer, 10.0, 10.0, 40.0);

    assert!(!viewer.placement().placed());
}

#[test]
fn test_restart_clears_previous_placement() {
    init_logging();
    let platform = FakePlatform::supporting();
    let (mut viewer, id) = active_viewer(&platform);
    viewer.on_frame(&frame_hit(id, Vec3::ONE, 16.0));
    tap(&mut viewer, 0.0, 0.0, 20.0);
    viewer.stop_ar();

    let next = pollster::block_on(viewer.start_ar(&platform)).unwrap();
    assert_eq!(viewer.mode(), ViewMode::ArSearching);
    assert!(!viewer.placement().placed());
    assert!(!viewer.reticle().visible);
    assert_eq!(viewer.current_session(), Some(next));
}
