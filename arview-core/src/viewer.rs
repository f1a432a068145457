//! The model viewer: preview mode plus AR placement
//!
//! `ArViewer` is the only type a host needs to drive. The host forwards XR
//! frames, touch events, platform callbacks and button presses, and reads
//! back one [`RenderSnapshot`] per frame.

use crate::ar::{
    ArFrame, GestureInterpreter, GestureKind, HitTestSourceId, PlacementController,
    PlacementTransform, ReticlePose, ReticleTracker, SessionEvent, SessionId, SessionLifecycle,
    SessionOptions, SessionState, TapClassifier, TouchEvent, XrPlatform, XrSession,
};
use crate::config::ViewerConfig;
use crate::error::ArError;
use crate::math::Aabb;
use crate::preview::PreviewFraming;
use glam::Mat4;
use serde::Serialize;

/// What the screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViewMode {
    /// Orbiting preview, no AR session
    Preview,
    /// AR session running, looking for a surface
    ArSearching,
    /// AR session running with the model placed
    ArPlaced,
}

/// Which controls the UI should offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlState {
    /// Start AR button shown
    pub start_visible: bool,
    /// Start AR button enabled
    pub start_enabled: bool,
    /// Stop AR button shown
    pub stop_visible: bool,
    /// Reset button shown
    pub reset_visible: bool,
}

/// Everything the renderer reads for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderSnapshot {
    /// Current mode
    pub mode: ViewMode,
    /// Reticle ring transform, when it should be drawn
    pub reticle: Option<Mat4>,
    /// Whether the model should be drawn
    pub model_visible: bool,
    /// Model transform
    pub model_matrix: Mat4,
    /// Placement state behind `model_matrix`
    pub placement: PlacementTransform,
    /// Controls to show
    pub controls: ControlState,
    /// Gesture in progress
    pub gesture: GestureKind,
}

/// Preview and AR placement state for one model
#[derive(Debug)]
pub struct ArViewer {
    config: ViewerConfig,
    session: SessionLifecycle,
    reticle: ReticleTracker,
    placement: PlacementController,
    gestures: GestureInterpreter,
    taps: TapClassifier,
    framing: Option<PreviewFraming>,
}

impl Default for ArViewer {
    fn default() -> Self {
        Self::with_valid_config(ViewerConfig::default())
    }
}

impl ArViewer {
    /// Create a viewer in preview mode; AR stays unavailable until probed.
    ///
    /// Fails with [`ArError::Config`] if the configuration is inconsistent.
    pub fn new(config: ViewerConfig) -> Result<Self, ArError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: ViewerConfig) -> Self {
        Self {
            session: SessionLifecycle::new(SessionOptions::default()),
            reticle: ReticleTracker::new(),
            placement: PlacementController::new(config.placement),
            gestures: GestureInterpreter::new(config.gestures, config.placement),
            taps: TapClassifier::new(&config.gestures),
            framing: None,
            config,
        }
    }

    /// Configuration in effect
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Frame the loaded model from its bounds
    pub fn set_model_bounds(&mut self, bounds: Aabb) {
        self.framing = Some(PreviewFraming::new(bounds, self.config.preview_target_size));
    }

    // ---- support probe ----

    /// Probe the platform for AR support
    pub async fn probe_support<P: XrPlatform + ?Sized>(&mut self, platform: &P) -> bool {
        self.session.probe_support(platform).await
    }

    /// Record a support probe answer from the host
    pub fn complete_probe(&mut self, result: Result<bool, ArError>) -> bool {
        self.session.complete_probe(result)
    }

    // ---- session commands ----

    /// Start AR and wait for the platform's answer
    pub async fn start_ar<P: XrPlatform + ?Sized>(&mut self, platform: &P) -> Result<SessionId, ArError> {
        let id = self.request_start()?;
        let result = platform.request_session(self.session.options()).await;
        self.complete_start(id, result)
    }

    /// Begin a start request; the host answers with [`ArViewer::complete_start`]
    pub fn request_start(&mut self) -> Result<SessionId, ArError> {
        self.session.request_start()
    }

    /// Deliver the platform's answer to a start request.
    ///
    /// On success the caller must create the hit-test source for the returned
    /// session and report it through [`ArViewer::on_hit_test_source_ready`].
    pub fn complete_start(
        &mut self,
        id: SessionId,
        result: Result<Box<dyn XrSession>, ArError>,
    ) -> Result<SessionId, ArError> {
        let id = self.session.complete_start(id, result)?;
        self.clear_placement_state();
        self.reticle.begin_session(id);
        Ok(id)
    }

    /// User pressed stop
    pub fn stop_ar(&mut self) {
        if self.session.request_stop().is_some() {
            self.teardown();
        }
    }

    /// The platform ended session `id`
    pub fn on_session_end(&mut self, id: SessionId) {
        if self.session.on_session_end(id).is_some() {
            self.teardown();
        }
    }

    /// Put the placed model back to unplaced; the reticle resumes tracking
    pub fn reset(&mut self) {
        self.clear_placement_state();
    }

    fn clear_placement_state(&mut self) {
        self.placement.reset();
        self.gestures.cancel();
        self.taps.reset();
    }

    fn teardown(&mut self) {
        self.clear_placement_state();
        self.reticle.end_session();
    }

    // ---- platform callbacks ----

    /// The hit-test source for `session` is ready
    pub fn on_hit_test_source_ready(
        &mut self,
        session: SessionId,
        source: HitTestSourceId,
    ) -> Result<(), ArError> {
        self.reticle.on_source_ready(session, source).map_err(|e| {
            log::debug!("{}", e);
            e
        })
    }

    /// Process one XR frame and produce the snapshot to render.
    ///
    /// The reticle is updated before the snapshot is taken.
    pub fn on_frame(&mut self, frame: &ArFrame) -> RenderSnapshot {
        if self.session.is_active() && !self.placement.is_placed() {
            if let Err(e) = self.reticle.update(frame) {
                log::debug!("Dropping frame: {}", e);
            }
        }
        self.snapshot()
    }

    /// Route a touch event.
    ///
    /// Before placement touches are only checked for a tap on the reticle;
    /// afterwards they drive the gestures. Outside AR, touches belong to the
    /// preview camera and are ignored here.
    pub fn on_touch(&mut self, event: &TouchEvent) {
        if !self.session.is_active() {
            return;
        }

        if !self.placement.is_placed() {
            if self.taps.handle(event).is_some() && self.placement.commit_placement(self.reticle.pose()) {
                self.reticle.clear_pose();
            }
            return;
        }

        let transform = self.placement.transform();
        if let Some(update) = self.gestures.handle(event, &transform) {
            self.placement.apply(update);
        }
    }

    // ---- reads ----

    /// Current mode
    pub fn mode(&self) -> ViewMode {
        match (self.session.state(), self.placement.is_placed()) {
            (SessionState::Active, true) => ViewMode::ArPlaced,
            (SessionState::Active, false) => ViewMode::ArSearching,
            _ => ViewMode::Preview,
        }
    }

    /// Controls to offer for the current state
    pub fn controls(&self) -> ControlState {
        let state = self.session.state();
        let in_session = matches!(state, SessionState::Requesting | SessionState::Active);
        ControlState {
            start_visible: !in_session,
            start_enabled: state == SessionState::Idle,
            stop_visible: in_session,
            reset_visible: state == SessionState::Active && self.placement.is_placed(),
        }
    }

    /// Immutable view of the current state for the renderer
    pub fn snapshot(&self) -> RenderSnapshot {
        let mode = self.mode();
        let placement = self.placement.transform();
        let centering = self
            .framing
            .map_or(Mat4::IDENTITY, |framing| framing.centering_matrix());

        let (model_visible, model_matrix) = match mode {
            ViewMode::Preview => (
                true,
                self.framing
                    .map_or(Mat4::IDENTITY, |framing| framing.preview_matrix()),
            ),
            ViewMode::ArSearching => (false, Mat4::IDENTITY),
            ViewMode::ArPlaced => (
                true,
                placement.matrix().unwrap_or(Mat4::IDENTITY) * centering,
            ),
        };

        let reticle = (mode == ViewMode::ArSearching && self.reticle.is_visible())
            .then(|| self.reticle.pose().reticle_matrix());

        RenderSnapshot {
            mode,
            reticle,
            model_visible,
            model_matrix,
            placement,
            controls: self.controls(),
            gesture: self.gestures.kind(),
        }
    }

    /// Session state
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Session currently requested or running
    pub fn current_session(&self) -> Option<SessionId> {
        self.session.current_session()
    }

    /// Placed object's transform
    pub fn placement(&self) -> PlacementTransform {
        self.placement.transform()
    }

    /// Reticle pose
    pub fn reticle(&self) -> &ReticlePose {
        self.reticle.pose()
    }

    /// Take queued session notifications
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.session.drain_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::{HitTestResult, TouchPhase, TouchPoint};
    use glam::Vec3;

    struct NullSession;

    impl XrSession for NullSession {
        fn end(&mut self) {}
    }

    const SOURCE: HitTestSourceId = HitTestSourceId(1);

    fn active_viewer() -> (ArViewer, SessionId) {
        let mut viewer = ArViewer::default();
        viewer.complete_probe(Ok(true));
        let id = viewer.request_start().unwrap();
        viewer.complete_start(id, Ok(Box::new(NullSession))).unwrap();
        viewer.on_hit_test_source_ready(id, SOURCE).unwrap();
        (viewer, id)
    }

    fn tap(viewer: &mut ArViewer, at: f64) {
        viewer.on_touch(&TouchEvent::new(TouchPhase::Began, vec![TouchPoint::new(0, 10.0, 10.0)], at));
        viewer.on_touch(&TouchEvent::new(TouchPhase::Ended, vec![], at + 50.0));
    }

    #[test]
    fn test_preview_mode_controls() {
        let mut viewer = ArViewer::default();
        let controls = viewer.controls();
        assert_eq!(viewer.mode(), ViewMode::Preview);
        assert!(controls.start_visible && !controls.start_enabled);

        viewer.complete_probe(Ok(true));
        assert!(viewer.controls().start_enabled);
    }

    #[test]
    fn test_tap_without_surface_does_not_place() {
        let (mut viewer, id) = active_viewer();
        viewer.on_frame(&ArFrame::with_hits(id, SOURCE, vec![], 16.0));
        tap(&mut viewer, 20.0);

        assert!(!viewer.placement().placed());
        assert_eq!(viewer.mode(), ViewMode::ArSearching);
    }

    #[test]
    fn test_tap_places_at_reticle() {
        let (mut viewer, id) = active_viewer();
        let hit = HitTestResult::new(Mat4::from_translation(Vec3::new(0.2, -1.0, -0.8)));
        let snapshot = viewer.on_frame(&ArFrame::with_hits(id, SOURCE, vec![hit], 16.0));
        assert!(snapshot.reticle.is_some());
        assert!(!snapshot.model_visible);

        tap(&mut viewer, 20.0);
        let snapshot = viewer.snapshot();
        assert_eq!(snapshot.mode, ViewMode::ArPlaced);
        assert_eq!(snapshot.placement.position, Some(Vec3::new(0.2, -1.0, -0.8)));
        assert!(snapshot.reticle.is_none());
        assert!(snapshot.controls.reset_visible);
    }

    #[test]
    fn test_reset_resumes_searching() {
        let (mut viewer, id) = active_viewer();
        let hit = HitTestResult::new(Mat4::IDENTITY);
        viewer.on_frame(&ArFrame::with_hits(id, SOURCE, vec![hit], 16.0));
        tap(&mut viewer, 20.0);

        viewer.reset();
        assert_eq!(viewer.mode(), ViewMode::ArSearching);
        assert!(!viewer.reticle().visible);

        let snapshot = viewer.on_frame(&ArFrame::with_hits(id, SOURCE, vec![hit], 100.0));
        assert!(snapshot.reticle.is_some());
    }

    #[test]
    fn test_touches_ignored_outside_ar() {
        let mut viewer = ArViewer::default();
        tap(&mut viewer, 0.0);
        assert!(!viewer.placement().placed());
    }

    #[test]
    fn test_placed_model_keeps_centering() {
        let (mut viewer, id) = active_viewer();
        viewer.set_model_bounds(Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0)));
        viewer.on_frame(&ArFrame::with_hits(id, SOURCE, vec![HitTestResult::new(Mat4::IDENTITY)], 16.0));
        tap(&mut viewer, 20.0);

        let snapshot = viewer.snapshot();
        let center = snapshot.model_matrix.transform_point3(Vec3::ONE);
        assert!(center.abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn test_new_rejects_inverted_scale_limits() {
        let mut config = ViewerConfig::default();
        config.placement.min_scale = 2.0;
        config.placement.max_scale = 0.1;
        assert!(matches!(ArViewer::new(config), Err(ArError::Config(_))));

        let viewer = ArViewer::new(ViewerConfig::default()).unwrap();
        assert_eq!(viewer.placement().scale, 0.3);
    }
}
