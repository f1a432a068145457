//! `wasm-bindgen` surface for the browser host

use crate::codec::{decode_bounds, decode_frame, decode_touch_event};
use arview_core::{ArError, ArViewer, HitTestSourceId, SessionId, ViewerConfig, XrSession};
use std::fmt::Display;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// Initialize WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
}

fn to_js<E: Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// A WebXR `XRSession` held on behalf of the engine
struct JsXrSession {
    session: JsValue,
}

impl XrSession for JsXrSession {
    fn end(&mut self) {
        let end = js_sys::Reflect::get(&self.session, &JsValue::from_str("end"))
            .ok()
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok());
        let Some(end) = end else {
            log::warn!("XRSession has no end() method");
            return;
        };

        match end.call0(&self.session) {
            Ok(promise) => {
                if let Ok(promise) = promise.dyn_into::<js_sys::Promise>() {
                    // Ending an already-ended session rejects; that is expected.
                    wasm_bindgen_futures::spawn_local(async move {
                        if let Err(e) = JsFuture::from(promise).await {
                            log::debug!("XRSession.end() rejected: {:?}", e);
                        }
                    });
                }
            }
            Err(e) => log::warn!("XRSession.end() threw: {:?}", e),
        }
    }
}

/// Model viewer with AR placement, driven from JavaScript
#[wasm_bindgen]
pub struct WebArViewer {
    viewer: ArViewer,
}

#[wasm_bindgen]
impl WebArViewer {
    /// Create a viewer from optional JSON config and the page query string
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>, query: Option<String>) -> Result<WebArViewer, JsValue> {
        let config = match config_json {
            Some(json) => ViewerConfig::from_json(&json).map_err(to_js)?,
            None => ViewerConfig::default(),
        };
        let config = match query {
            Some(query) => config.with_query(&query),
            None => config,
        };
        log::info!("ArView viewer created for {}", config.model_url);
        Ok(WebArViewer {
            viewer: ArViewer::new(config).map_err(to_js)?,
        })
    }

    /// Model the page should load
    #[wasm_bindgen(js_name = modelUrl)]
    pub fn model_url(&self) -> String {
        self.viewer.config().model_url.clone()
    }

    /// Bounds of the loaded model, as `Box3.min` and `Box3.max`
    #[wasm_bindgen(js_name = setModelBounds)]
    pub fn set_model_bounds(&mut self, min: &[f32], max: &[f32]) -> Result<(), JsValue> {
        let bounds = decode_bounds(min, max).map_err(to_js)?;
        self.viewer.set_model_bounds(bounds);
        Ok(())
    }

    /// Result of `navigator.xr.isSessionSupported("immersive-ar")`
    #[wasm_bindgen(js_name = supportProbed)]
    pub fn support_probed(&mut self, supported: bool) -> bool {
        self.viewer.complete_probe(Ok(supported))
    }

    /// The support check threw, or `navigator.xr` is missing
    #[wasm_bindgen(js_name = supportProbeFailed)]
    pub fn support_probe_failed(&mut self, message: String) -> bool {
        self.viewer
            .complete_probe(Err(ArError::SupportCheckFailed(message)))
    }

    /// Start button pressed; returns the id to pass back with the session
    #[wasm_bindgen(js_name = requestStart)]
    pub fn request_start(&mut self) -> Result<u32, JsValue> {
        self.viewer.request_start().map(|id| id.0).map_err(to_js)
    }

    /// `navigator.xr.requestSession` resolved
    #[wasm_bindgen(js_name = sessionStarted)]
    pub fn session_started(&mut self, id: u32, session: JsValue) -> Result<(), JsValue> {
        self.viewer
            .complete_start(SessionId(id), Ok(Box::new(JsXrSession { session })))
            .map(|_| ())
            .map_err(to_js)
    }

    /// `navigator.xr.requestSession` rejected
    #[wasm_bindgen(js_name = sessionStartFailed)]
    pub fn session_start_failed(&mut self, id: u32, message: String) {
        if let Err(e) = self
            .viewer
            .complete_start(SessionId(id), Err(ArError::SessionStartFailed(message)))
        {
            log::debug!("{}", e);
        }
    }

    /// `session.requestHitTestSource` resolved
    #[wasm_bindgen(js_name = hitTestSourceReady)]
    pub fn hit_test_source_ready(&mut self, id: u32, source: u32) -> Result<(), JsValue> {
        self.viewer
            .on_hit_test_source_ready(SessionId(id), HitTestSourceId(source))
            .map_err(to_js)
    }

    /// Stop button pressed
    pub fn stop(&mut self) {
        self.viewer.stop_ar();
    }

    /// The session's `end` event fired
    #[wasm_bindgen(js_name = sessionEnded)]
    pub fn session_ended(&mut self, id: u32) {
        self.viewer.on_session_end(SessionId(id));
    }

    /// Reset button pressed
    pub fn reset(&mut self) {
        self.viewer.reset();
    }

    /// XR frame callback; returns the snapshot to render as JSON
    pub fn frame(
        &mut self,
        id: u32,
        source: Option<u32>,
        hits: &[f32],
        timestamp_ms: f64,
    ) -> Result<String, JsValue> {
        let frame = decode_frame(id, source, hits, timestamp_ms).map_err(to_js)?;
        let snapshot = self.viewer.on_frame(&frame);
        serde_json::to_string(&snapshot).map_err(to_js)
    }

    /// Touch event with `event.touches` flattened
    pub fn touch(
        &mut self,
        phase: &str,
        ids: &[u32],
        xs: &[f32],
        ys: &[f32],
        timestamp_ms: f64,
    ) -> Result<(), JsValue> {
        let event = decode_touch_event(phase, ids, xs, ys, timestamp_ms).map_err(to_js)?;
        self.viewer.on_touch(&event);
        Ok(())
    }

    /// Current snapshot as JSON, for preview frames outside a session
    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.viewer.snapshot()).map_err(to_js)
    }

    /// Queued session notifications as a JSON array
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.viewer.drain_events()).map_err(to_js)
    }
}
