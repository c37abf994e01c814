//! Authentication Module
//!
//! Holds the current login session and its client-side expiry.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Token lifetime mirrored from the backend. The login response carries no
/// expiry, but issued tokens stop validating after this long.
pub const TOKEN_LIFETIME_MINUTES: i64 = 60;

/// An authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl Session {
    /// Build a session from a freshly issued token, stamping the expiry
    /// from the current clock.
    pub fn from_token(access_token: String, token_type: String) -> Self {
        Self {
            access_token,
            token_type,
            expires_at: chrono::Utc::now() + chrono::Duration::minutes(TOKEN_LIFETIME_MINUTES),
        }
    }

    /// Check if the session is expired
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now() >= self.expires_at
    }
}

/// Manages authentication state
pub struct AuthManager {
    session: Option<Session>,
}

impl AuthManager {
    /// Create a new auth manager with no session
    pub fn new() -> Self {
        Self { session: None }
    }

    /// Set the current session, replacing any previous one
    pub fn set_session(&mut self, session: Session) {
        info!("Session set, expires at {}", session.expires_at);
        self.session = Some(session);
    }

    /// Get the current session if still valid
    pub fn get_session(&self) -> Option<&Session> {
        match &self.session {
            Some(session) if !session.is_expired() => Some(session),
            Some(_) => {
                warn!("Session is expired");
                None
            }
            None => None,
        }
    }

    /// Get the access token if authenticated
    pub fn get_access_token(&self) -> Option<&str> {
        self.get_session().map(|s| s.access_token.as_str())
    }

    /// Check if currently authenticated
    pub fn is_authenticated(&self) -> bool {
        self.get_session().is_some()
    }

    /// Clear the current session
    pub fn clear_session(&mut self) {
        info!("Session cleared");
        self.session = None;
    }
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}
