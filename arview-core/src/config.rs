//! Viewer configuration
//!
//! Tuning constants for gestures and placement, plus the model location read
//! from the page query string (`?model=chair.glb`).

use crate::error::ArError;
use crate::math::clamp_finite;
use serde::{Deserialize, Serialize};

/// Model loaded when the page does not name one
pub const DEFAULT_MODEL_URL: &str = "/models/model.glb";

/// Prefix for relative model names
pub const MODEL_BASE_PATH: &str = "/models/";

/// Gesture tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Meters of ground-plane travel per pixel of single-finger drag
    pub drag_sensitivity: f32,
    /// Scale change per pixel of change in finger spread
    pub scale_sensitivity: f32,
    /// Maximum finger travel for a touch to still count as a tap
    pub tap_slop_px: f32,
    /// Maximum press duration for a tap
    pub tap_max_duration_ms: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_sensitivity: 0.002,
            scale_sensitivity: 0.001,
            tap_slop_px: 10.0,
            tap_max_duration_ms: 500.0,
        }
    }
}

/// Scale bounds for the placed object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementLimits {
    /// Scale applied when the object is first placed
    pub default_scale: f32,
    /// Smallest allowed scale
    pub min_scale: f32,
    /// Largest allowed scale
    pub max_scale: f32,
}

impl Default for PlacementLimits {
    fn default() -> Self {
        Self {
            default_scale: 0.3,
            min_scale: 0.1,
            max_scale: 2.0,
        }
    }
}

impl PlacementLimits {
    /// Clamp a scale value into the allowed range
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        clamp_finite(scale, self.min_scale, self.max_scale)
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// URL of the model to show
    pub model_url: String,
    /// Gesture tuning
    pub gestures: GestureConfig,
    /// Placement scale bounds
    pub placement: PlacementLimits,
    /// Largest dimension of the model in preview mode, in world units
    pub preview_target_size: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model_url: DEFAULT_MODEL_URL.to_string(),
            gestures: GestureConfig::default(),
            placement: PlacementLimits::default(),
            preview_target_size: 1.5,
        }
    }
}

impl ViewerConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ArError> {
        let config: ViewerConfig =
            serde_json::from_str(json).map_err(|e| ArError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply page query parameters (`model=...`)
    pub fn with_query(mut self, query: &str) -> Self {
        let query = query.trim_start_matches('?');
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key == "model" && !value.is_empty() {
                self.model_url = resolve_model_url(&value);
            }
        }
        self
    }

    /// Check that the numeric settings are usable
    pub fn validate(&self) -> Result<(), ArError> {
        let limits = &self.placement;
        if !(limits.min_scale > 0.0 && limits.min_scale <= limits.max_scale) {
            return Err(ArError::Config(format!(
                "scale bounds [{}, {}] are not a positive range",
                limits.min_scale, limits.max_scale
            )));
        }
        if !(limits.min_scale..=limits.max_scale).contains(&limits.default_scale) {
            return Err(ArError::Config(format!(
                "default scale {} outside [{}, {}]",
                limits.default_scale, limits.min_scale, limits.max_scale
            )));
        }
        let g = &self.gestures;
        if !(g.drag_sensitivity.is_finite() && g.scale_sensitivity.is_finite()) {
            return Err(ArError::Config("gesture sensitivities must be finite".to_string()));
        }
        if !(g.tap_slop_px >= 0.0 && g.tap_max_duration_ms >= 0.0) {
            return Err(ArError::Config("tap thresholds must be non-negative".to_string()));
        }
        if !(self.preview_target_size > 0.0) {
            return Err(ArError::Config("preview target size must be positive".to_string()));
        }
        Ok(())
    }
}

/// Absolute http(s) URLs are used as given; anything else is a file under `/models/`
pub fn resolve_model_url(param: &str) -> String {
    if param.starts_with("http://") || param.starts_with("https://") {
        param.to_string()
    } else {
        format!("{}{}", MODEL_BASE_PATH, param)
    }
}
