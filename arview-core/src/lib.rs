//! ArView core - AR placement and manipulation for a 3D model viewer
//!
//! The viewer shows a model in an orbiting preview and, on devices with
//! WebXR immersive AR, lets the user place it on a real surface and move,
//! scale and rotate it with touch gestures. Everything here is host-agnostic:
//! the browser glue lives in `arview-wasm`.

#![warn(missing_docs)]

pub mod ar;
pub mod asset;
pub mod config;
pub mod error;
pub mod math;
pub mod preview;
pub mod viewer;

pub use ar::{
    ArFrame, GestureKind, HitTestResult, HitTestSourceId, PlacementTransform, ReticlePose,
    SessionEvent, SessionId, SessionState, TouchEvent, TouchPhase, TouchPoint, XrPlatform,
    XrSession,
};
pub use asset::{AssetProvider, GltfAssetProvider, LoadedAsset};
pub use config::ViewerConfig;
pub use error::{ArError, ArResult};
pub use math::Aabb;
pub use viewer::{ArViewer, ControlState, RenderSnapshot, ViewMode};
