//! Error types for the AR engine

use crate::ar::frame::SessionId;
use serde::Serialize;

/// Errors surfaced by the AR session, reticle and asset layers.
///
/// None of these are fatal: every path that produces one leaves the engine
/// in a well-defined idle or active state.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
pub enum ArError {
    /// The device or browser cannot run an immersive AR session
    #[error("AR is not supported on this device")]
    CapabilityUnavailable,

    /// Asking the platform whether AR is available failed
    #[error("AR support check failed: {0}")]
    SupportCheckFailed(String),

    /// The platform rejected the session request
    #[error("Failed to start AR session: {0}")]
    SessionStartFailed(String),

    /// The platform ended the session on its own
    #[error("AR session was interrupted by the platform")]
    SessionInterrupted,

    /// A result arrived for a session that is no longer current
    #[error("Discarded result for {received}, current session is {}", display_session(.expected))]
    StaleQueryResult {
        /// Session the engine is currently tracking, if any
        expected: Option<SessionId>,
        /// Session the result was tagged with
        received: SessionId,
    },

    /// A session is already requested or running
    #[error("An AR session is already open")]
    SessionAlreadyOpen,

    /// Operation not valid for the current session state
    #[error("Cannot {operation} while session is {from}")]
    InvalidTransition {
        /// State name at the time of the call
        from: String,
        /// Operation that was attempted
        operation: String,
    },

    /// The asset could not be loaded or has no geometry
    #[error("Asset load error: {0}")]
    AssetLoad(String),

    /// Viewer configuration could not be parsed or is inconsistent
    #[error("Invalid viewer configuration: {0}")]
    Config(String),
}

fn display_session(session: &Option<SessionId>) -> String {
    match session {
        Some(id) => id.to_string(),
        None => "none".to_string(),
    }
}

impl From<anyhow::Error> for ArError {
    fn from(err: anyhow::Error) -> Self {
        ArError::AssetLoad(format!("{:#}", err))
    }
}

/// Result alias used across the crate
pub type ArResult<T> = Result<T, ArError>;
