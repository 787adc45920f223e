//! Viewer Session
//!
//! The viewer's identity is passed explicitly to every component that needs it
//! instead of living in a process-wide singleton. `AuthState` models the
//! load-on-start / login / logout lifecycle; the login forms themselves live in
//! the rendering layer.

use crate::shared::error::{DocsError, DocsResult};
use serde::{Deserialize, Serialize};

/// Identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerSession {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

impl ViewerSession {
    pub fn new(user_id: i64, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            email: email.into(),
        }
    }
}

/// Authentication state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    viewer: Option<ViewerSession>,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a previously saved session (JSON as written by [`AuthState::to_json`]).
    ///
    /// A missing or unreadable value yields a signed-out state.
    pub fn load(saved: Option<&str>) -> Self {
        let viewer = saved.and_then(|raw| match serde_json::from_str::<ViewerSession>(raw) {
            Ok(viewer) => Some(viewer),
            Err(e) => {
                tracing::warn!("Discarding unreadable saved session: {}", e);
                None
            }
        });
        Self { viewer }
    }

    pub fn to_json(&self) -> Option<String> {
        self.viewer
            .as_ref()
            .and_then(|viewer| serde_json::to_string(viewer).ok())
    }

    pub fn login(&mut self, viewer: ViewerSession) {
        tracing::info!("Signed in as {} ({})", viewer.username, viewer.user_id);
        self.viewer = Some(viewer);
    }

    pub fn logout(&mut self) {
        if let Some(viewer) = self.viewer.take() {
            tracing::info!("Signed out {}", viewer.username);
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.viewer.is_some()
    }

    pub fn current(&self) -> Option<&ViewerSession> {
        self.viewer.as_ref()
    }

    /// The viewer, or `Forbidden` when nobody is signed in
    pub fn require(&self) -> DocsResult<&ViewerSession> {
        self.viewer
            .as_ref()
            .ok_or_else(|| DocsError::forbidden("authentication required"))
    }
}
