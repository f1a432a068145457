//! AR session lifecycle
//!
//! The session can end from three places: the user pressing stop, the
//! platform ending it (tab hidden, device interruption), or the start request
//! failing. All of them run through [`SessionLifecycle::end_current`], and
//! ending a session that is already idle does nothing.

use crate::ar::frame::SessionId;
use crate::error::ArError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// WebXR session mode requested for placement
pub const AR_SESSION_MODE: &str = "immersive-ar";

/// Feature every placement session needs
pub const HIT_TEST_FEATURE: &str = "hit-test";

/// AR session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// AR is not available, or the probe has not answered yet
    Unsupported,
    /// AR is available and no session is open
    Idle,
    /// Requesting session
    Requesting,
    /// Session active
    Active,
    /// Tearing down
    Ending,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unsupported => "unsupported",
            SessionState::Idle => "idle",
            SessionState::Requesting => "requesting",
            SessionState::Active => "active",
            SessionState::Ending => "ending",
        };
        f.write_str(name)
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// The user pressed stop
    UserRequested,
    /// The platform ended the session
    PlatformEnded,
}

/// Notification for the host UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionEvent {
    /// The support probe produced a different answer
    SupportChanged {
        /// Whether AR can be started
        supported: bool,
    },
    /// A session became active
    Started {
        /// New session
        session: SessionId,
    },
    /// A start request failed; the user may try again
    StartFailed {
        /// Request that failed
        session: SessionId,
        /// Failure reported to the user
        error: ArError,
    },
    /// An active or requested session ended
    Ended {
        /// Session that ended
        session: SessionId,
        /// What ended it
        reason: EndReason,
    },
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Session mode
    pub mode: String,
    /// Features the session cannot run without
    pub required_features: Vec<String>,
    /// Features used when available
    pub optional_features: Vec<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mode: AR_SESSION_MODE.to_string(),
            required_features: vec![HIT_TEST_FEATURE.to_string()],
            optional_features: vec!["dom-overlay".to_string()],
        }
    }
}

/// An open platform session and the rendering resources tied to it
pub trait XrSession {
    /// End the platform session and release its resources
    fn end(&mut self);
}

/// The XR capability of the device
#[async_trait(?Send)]
pub trait XrPlatform {
    /// Whether sessions of `mode` can be created
    async fn is_session_supported(&self, mode: &str) -> Result<bool, ArError>;

    /// Create a session
    async fn request_session(&self, options: &SessionOptions) -> Result<Box<dyn XrSession>, ArError>;
}

/// Session state machine.
///
/// Owns the platform session handle: it exists exactly while the state is
/// `Active`, and is always ended before being dropped.
pub struct SessionLifecycle {
    state: SessionState,
    current: Option<SessionId>,
    handle: Option<Box<dyn XrSession>>,
    next_id: u32,
    options: SessionOptions,
    events: VecDeque<SessionEvent>,
}

impl fmt::Debug for SessionLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLifecycle")
            .field("state", &self.state)
            .field("current", &self.current)
            .field("has_handle", &self.handle.is_some())
            .field("pending_events", &self.events.len())
            .finish()
    }
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl SessionLifecycle {
    /// Create a lifecycle awaiting its support probe
    pub fn new(options: SessionOptions) -> Self {
        Self {
            state: SessionState::Unsupported,
            current: None,
            handle: None,
            next_id: 1,
            options,
            events: VecDeque::new(),
        }
    }

    /// Ask the platform whether AR is available
    pub async fn probe_support<P: XrPlatform + ?Sized>(&mut self, platform: &P) -> bool {
        let result = platform.is_session_supported(&self.options.mode).await;
        self.complete_probe(result)
    }

    /// Record the support probe answer.
    ///
    /// Errors count as unsupported. Answers arriving while a session is open
    /// are ignored. Returns whether AR is available afterwards.
    pub fn complete_probe(&mut self, result: Result<bool, ArError>) -> bool {
        let supported = match result {
            Ok(supported) => supported,
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        };

        match self.state {
            SessionState::Unsupported | SessionState::Idle => {
                let next = if supported {
                    SessionState::Idle
                } else {
                    SessionState::Unsupported
                };
                if next != self.state {
                    log::info!("AR support: {}", supported);
                    self.state = next;
                    self.events.push_back(SessionEvent::SupportChanged { supported });
                }
            }
            state => log::debug!("Ignoring support probe while {}", state),
        }
        self.is_supported()
    }

    /// Begin a start request; only valid from `Idle`
    pub fn request_start(&mut self) -> Result<SessionId, ArError> {
        match self.state {
            SessionState::Idle => {
                let id = SessionId(self.next_id);
                self.next_id = self.next_id.wrapping_add(1);
                self.current = Some(id);
                self.state = SessionState::Requesting;
                log::info!("Requesting AR {} with {:?}", id, self.options.required_features);
                Ok(id)
            }
            SessionState::Unsupported => Err(ArError::CapabilityUnavailable),
            SessionState::Requesting | SessionState::Active => Err(ArError::SessionAlreadyOpen),
            SessionState::Ending => Err(ArError::InvalidTransition {
                from: self.state.to_string(),
                operation: "start".to_string(),
            }),
        }
    }

    /// Deliver the platform's answer to a start request.
    ///
    /// A handle for a request that is no longer current is ended and dropped.
    pub fn complete_start(
        &mut self,
        id: SessionId,
        result: Result<Box<dyn XrSession>, ArError>,
    ) -> Result<SessionId, ArError> {
        if self.state != SessionState::Requesting || self.current != Some(id) {
            if let Ok(mut stale) = result {
                log::debug!("Ending session handle for cancelled {}", id);
                stale.end();
            }
            return Err(ArError::StaleQueryResult {
                expected: self.current,
                received: id,
            });
        }

        match result {
            Ok(handle) => {
                self.handle = Some(handle);
                self.state = SessionState::Active;
                self.events.push_back(SessionEvent::Started { session: id });
                log::info!("AR {} active", id);
                Ok(id)
            }
            Err(e) => {
                let error = if matches!(e, ArError::SessionStartFailed(_)) {
                    e
                } else {
                    ArError::SessionStartFailed(e.to_string())
                };
                log::error!("Failed to start AR session: {}", error);
                self.current = None;
                self.state = SessionState::Idle;
                self.events.push_back(SessionEvent::StartFailed {
                    session: id,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// Request and complete a session in one step
    pub async fn start<P: XrPlatform + ?Sized>(&mut self, platform: &P) -> Result<SessionId, ArError> {
        let id = self.request_start()?;
        let result = platform.request_session(&self.options).await;
        self.complete_start(id, result)
    }

    /// User stop; returns the session that ended, if any
    pub fn request_stop(&mut self) -> Option<SessionId> {
        self.end_current(EndReason::UserRequested)
    }

    /// The platform reports that `id` ended
    pub fn on_session_end(&mut self, id: SessionId) -> Option<SessionId> {
        if self.current != Some(id) {
            log::debug!("Ignoring end of {} (current: {:?})", id, self.current);
            return None;
        }
        self.end_current(EndReason::PlatformEnded)
    }

    fn end_current(&mut self, reason: EndReason) -> Option<SessionId> {
        match self.state {
            SessionState::Requesting | SessionState::Active => {
                self.state = SessionState::Ending;
                if let Some(mut handle) = self.handle.take() {
                    handle.end();
                }
                let ended = self.current.take();
                self.state = SessionState::Idle;
                if let Some(session) = ended {
                    log::info!("AR {} ended ({:?})", session, reason);
                    self.events.push_back(SessionEvent::Ended { session, reason });
                }
                ended
            }
            _ => None,
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Session currently requested or running
    pub fn current_session(&self) -> Option<SessionId> {
        self.current
    }

    /// Whether a session is running
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Whether AR can be offered at all
    pub fn is_supported(&self) -> bool {
        self.state != SessionState::Unsupported
    }

    /// Requested session configuration
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Take all queued notifications
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }
}

impl Drop for SessionLifecycle {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.end();
        }
    }
}
