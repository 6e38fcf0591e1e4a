//! Identity provider contract and the Firebase email/password client.

mod firebase;
mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::util::unix_timestamp_now;

pub use firebase::{FirebaseAuthClient, DEFAULT_AUTH_URL, DEFAULT_TOKEN_URL};
pub use memory::MemorySessionStore;

const EXPIRY_SKEW_SECONDS: i64 = 60;

/// An authenticated user's stable reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub identity: Identity,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("identity", &self.identity)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Api(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Durable home for the signed-in session.
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Authenticates users and announces identity changes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Identity>;
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Identity>;
    async fn sign_out(&self) -> AuthResult<()>;
    /// Identity-change feed. The receiver starts at the current identity and
    /// is notified whenever it changes.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
    fn current(&self) -> Option<Identity>;
}

/// Bearer tokens for remote store requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// A currently valid token, or `None` when nobody is signed in.
    async fn bearer_token(&self) -> AuthResult<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: i64) -> AuthSession {
        AuthSession {
            id_token: "secret-id-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at,
            identity: Identity::new("user").with_email("user@example.com"),
        }
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let rendered = format!("{:?}", session(1_700_000_000));
        assert!(!rendered.contains("secret-id-token"));
        assert!(!rendered.contains("secret-refresh-token"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(rendered.contains("user@example.com"));
    }

    #[test]
    fn session_expiry_includes_skew() {
        let now = unix_timestamp_now();
        assert!(session(now + 30).is_expired());
        assert!(!session(now + 3600).is_expired());
    }
}
