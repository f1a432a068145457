//! Touch gesture interpretation for the placed object
//!
//! Every touch event carries the full set of fingers currently on the screen.
//! One finger drags the object across the ground plane, two fingers pinch to
//! scale and twist to rotate. Updates are always recomputed from the snapshot
//! taken when the gesture began, never accumulated from the previous event.

use crate::ar::placement::{PlacementTransform, PlacementUpdate};
use crate::config::{GestureConfig, PlacementLimits};
use crate::math::{angle, distance, ground_plane_offset};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Touch phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchPhase {
    /// A finger went down
    Began,
    /// One or more fingers moved
    Moved,
    /// A finger lifted
    Ended,
    /// The platform cancelled the touches
    Cancelled,
}

/// Touch point data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Platform identifier, stable for the lifetime of the touch
    pub id: u32,
    /// Screen position in pixels
    pub position: Vec2,
}

impl TouchPoint {
    /// Create a touch point
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self {
            id,
            position: Vec2::new(x, y),
        }
    }
}

/// A touch event with every finger still down after it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    /// What happened
    pub phase: TouchPhase,
    /// Active touches after the event
    pub touches: Vec<TouchPoint>,
    /// Event time
    pub timestamp_ms: f64,
}

impl TouchEvent {
    /// Create a touch event
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>, timestamp_ms: f64) -> Self {
        Self {
            phase,
            touches,
            timestamp_ms,
        }
    }

    fn find(&self, id: u32) -> Option<Vec2> {
        self.touches.iter().find(|t| t.id == id).map(|t| t.position)
    }
}

/// Classification of the gesture in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureKind {
    /// No gesture
    None,
    /// One-finger move
    Drag,
    /// Two-finger scale and rotate
    PinchRotate,
}

/// State captured when a gesture begins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GestureSnapshot {
    /// One finger down
    Drag {
        /// Finger being tracked
        touch_id: u32,
        /// Where the finger started
        start_touch: Vec2,
        /// Where the object was
        start_position: Vec3,
    },
    /// Two fingers down
    PinchRotate {
        /// Fingers being tracked, in event order
        touch_ids: [u32; 2],
        /// Finger spread at the start
        start_distance: f32,
        /// Angle of the line between the fingers at the start
        start_angle: f32,
        /// Object scale at the start
        start_scale: f32,
        /// Object yaw at the start
        start_yaw: f32,
    },
}

impl GestureSnapshot {
    /// Kind of gesture this snapshot belongs to
    pub fn kind(&self) -> GestureKind {
        match self {
            GestureSnapshot::Drag { .. } => GestureKind::Drag,
            GestureSnapshot::PinchRotate { .. } => GestureKind::PinchRotate,
        }
    }

    /// Take a snapshot from the current touches, if they form a gesture
    fn capture(touches: &[TouchPoint], transform: &PlacementTransform) -> Option<Self> {
        match touches {
            [touch] => Some(GestureSnapshot::Drag {
                touch_id: touch.id,
                start_touch: touch.position,
                start_position: transform.position?,
            }),
            [a, b] => Some(GestureSnapshot::PinchRotate {
                touch_ids: [a.id, b.id],
                start_distance: distance(a.position, b.position),
                start_angle: angle(a.position, b.position),
                start_scale: transform.scale,
                start_yaw: transform.yaw_radians,
            }),
            _ => None,
        }
    }

    /// True if the snapshot tracks exactly these fingers
    fn tracks(&self, touches: &[TouchPoint]) -> bool {
        match (self, touches) {
            (GestureSnapshot::Drag { touch_id, .. }, [t]) => t.id == *touch_id,
            (GestureSnapshot::PinchRotate { touch_ids, .. }, [a, b]) => {
                let mut ids = [a.id, b.id];
                let mut tracked = *touch_ids;
                ids.sort_unstable();
                tracked.sort_unstable();
                ids == tracked
            }
            _ => false,
        }
    }
}

/// Turns touch events into placement updates
#[derive(Debug, Clone)]
pub struct GestureInterpreter {
    snapshot: Option<GestureSnapshot>,
    config: GestureConfig,
    limits: PlacementLimits,
}

impl GestureInterpreter {
    /// Create an idle interpreter
    pub fn new(config: GestureConfig, limits: PlacementLimits) -> Self {
        Self {
            snapshot: None,
            config,
            limits,
        }
    }

    /// Process a touch event against the object's current transform.
    ///
    /// Returns an update only for moves of an established gesture. A change
    /// in which fingers are down throws the old snapshot away and starts over
    /// from the current touches.
    pub fn handle(
        &mut self,
        event: &TouchEvent,
        transform: &PlacementTransform,
    ) -> Option<PlacementUpdate> {
        if !transform.placed() || event.phase == TouchPhase::Cancelled {
            self.cancel();
            return None;
        }

        let still_tracking = self
            .snapshot
            .as_ref()
            .map_or(false, |snapshot| snapshot.tracks(&event.touches));

        if !still_tracking {
            let previous = self.kind();
            self.snapshot = GestureSnapshot::capture(&event.touches, transform);
            if self.kind() != previous {
                log::trace!("Gesture {:?} -> {:?}", previous, self.kind());
            }
            return None;
        }

        if event.phase != TouchPhase::Moved {
            return None;
        }

        self.snapshot.map(|snapshot| self.update_from(&snapshot, event))
    }

    fn update_from(&self, snapshot: &GestureSnapshot, event: &TouchEvent) -> PlacementUpdate {
        match *snapshot {
            GestureSnapshot::Drag {
                touch_id,
                start_touch,
                start_position,
            } => {
                let current = event.find(touch_id).unwrap_or(start_touch);
                let offset = ground_plane_offset(current - start_touch, self.config.drag_sensitivity);
                PlacementUpdate::Translate {
                    position: start_position + offset,
                }
            }
            GestureSnapshot::PinchRotate {
                touch_ids,
                start_distance,
                start_angle,
                start_scale,
                start_yaw,
            } => {
                let (a, b) = match (event.find(touch_ids[0]), event.find(touch_ids[1])) {
                    (Some(a), Some(b)) => (a, b),
                    _ => {
                        return PlacementUpdate::ScaleRotate {
                            scale: start_scale,
                            yaw_radians: start_yaw,
                        }
                    }
                };
                let spread = distance(a, b) - start_distance;
                let scale = self
                    .limits
                    .clamp_scale(start_scale + spread * self.config.scale_sensitivity);
                PlacementUpdate::ScaleRotate {
                    scale,
                    yaw_radians: start_yaw + (angle(a, b) - start_angle),
                }
            }
        }
    }

    /// Drop any gesture in progress
    pub fn cancel(&mut self) {
        self.snapshot = None;
    }

    /// Kind of gesture in progress
    pub fn kind(&self) -> GestureKind {
        self.snapshot
            .as_ref()
            .map_or(GestureKind::None, GestureSnapshot::kind)
    }

    /// Snapshot of the gesture in progress
    pub fn snapshot(&self) -> Option<&GestureSnapshot> {
        self.snapshot.as_ref()
    }
}

#[derive(Debug, Clone, Copy)]
struct TapCandidate {
    touch_id: u32,
    start: Vec2,
    last: Vec2,
    started_at_ms: f64,
}

/// Detects single-finger taps used for tap-to-place
#[derive(Debug, Clone)]
pub struct TapClassifier {
    candidate: Option<TapCandidate>,
    disqualified: bool,
    slop_px: f32,
    max_duration_ms: f64,
}

impl TapClassifier {
    /// Create a classifier with the configured thresholds
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            candidate: None,
            disqualified: false,
            slop_px: config.tap_slop_px,
            max_duration_ms: config.tap_max_duration_ms,
        }
    }

    /// Feed a touch event; returns the tap position when a tap completes
    pub fn handle(&mut self, event: &TouchEvent) -> Option<Vec2> {
        match event.phase {
            TouchPhase::Began => {
                match (event.touches.as_slice(), self.candidate, self.disqualified) {
                    ([touch], None, false) => {
                        self.candidate = Some(TapCandidate {
                            touch_id: touch.id,
                            start: touch.position,
                            last: touch.position,
                            started_at_ms: event.timestamp_ms,
                        });
                    }
                    _ => self.disqualify(),
                }
                None
            }
            TouchPhase::Moved => {
                let slop_px = self.slop_px;
                let exceeded = match self.candidate.as_mut() {
                    Some(candidate) => match event.find(candidate.touch_id) {
                        Some(position) => {
                            candidate.last = position;
                            position.distance(candidate.start) > slop_px
                        }
                        None => false,
                    },
                    None => false,
                };
                if exceeded {
                    self.disqualify();
                }
                None
            }
            TouchPhase::Ended => {
                if !event.touches.is_empty() {
                    self.disqualify();
                    return None;
                }
                let candidate = self.candidate.take();
                let disqualified = std::mem::replace(&mut self.disqualified, false);
                let candidate = candidate.filter(|_| !disqualified)?;

                let held = event.timestamp_ms - candidate.started_at_ms;
                let travelled = candidate.last.distance(candidate.start);
                (held <= self.max_duration_ms && travelled <= self.slop_px).then_some(candidate.last)
            }
            TouchPhase::Cancelled => {
                self.reset();
                None
            }
        }
    }

    /// Forget any touch in progress
    pub fn reset(&mut self) {
        self.candidate = None;
        self.disqualified = false;
    }

    fn disqualify(&mut self) {
        self.candidate = None;
        self.disqualified = true;
    }
}
