//! AR placement for the model viewer
//!
//! This module provides the WebXR session lifecycle, surface reticle
//! tracking, and the touch gestures that move, scale and rotate the
//! placed model.

pub mod frame;
pub mod gesture;
pub mod placement;
pub mod reticle;
pub mod session;

pub use frame::{ArFrame, FrameHitResults, HitTestResult, HitTestSourceId, SessionId};
pub use gesture::{
    GestureInterpreter, GestureKind, GestureSnapshot, TapClassifier, TouchEvent, TouchPhase,
    TouchPoint,
};
pub use placement::{PlacementController, PlacementTransform, PlacementUpdate};
pub use reticle::{HitTestQueryState, ReticlePose, ReticleTracker};
pub use session::{
    EndReason, SessionEvent, SessionLifecycle, SessionOptions, SessionState, XrPlatform, XrSession,
};
