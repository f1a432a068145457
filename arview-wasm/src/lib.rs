//! WASM bindings for the ArView placement engine
//!
//! The page owns the WebXR session and the three.js renderer; it forwards
//! frames, touches and session callbacks here and renders the returned
//! snapshot. Arguments cross the boundary as flat arrays and strings.

pub mod codec;

#[cfg(target_arch = "wasm32")]
mod bindings;

#[cfg(target_arch = "wasm32")]
pub use bindings::{init, WebArViewer};

pub use codec::{decode_bounds, decode_frame, decode_touch_event, parse_phase, CodecError};
