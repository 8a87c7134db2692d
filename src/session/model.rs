//! Session data model.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SessionStatus;

/// Opaque access credential issued by the backend.
///
/// The inner string is never printed by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the token is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of the raw token, used when logging.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(<{} bytes>)", self.0.len())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted:{}>", self.0.len())
    }
}

/// Cached identity of the signed-in user.
///
/// Profile fields added later by the backend are kept in `extra` so an
/// older build round-trips them untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Account email.
    pub email: String,
    /// Additional profile fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Create a user with just an email.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            extra: Map::new(),
        }
    }

    /// Attach an additional profile field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// A complete authenticated session.
///
/// Token and user only ever exist together; a half session is
/// unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Access token.
    pub token: Token,
    /// Signed-in user.
    pub user: User,
}

impl Session {
    /// Create a new session.
    pub fn new(token: Token, user: User) -> Self {
        Self { token, user }
    }
}

/// Read-only view of the session published to observers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    /// Current phase.
    pub status: SessionStatus,
    /// Signed-in user, present only when authenticated.
    pub user: Option<User>,
    /// Access token, present only when authenticated.
    pub token: Option<Token>,
}

impl SessionSnapshot {
    /// Snapshot for a phase with no session attached.
    pub fn empty(status: SessionStatus) -> Self {
        Self {
            status,
            user: None,
            token: None,
        }
    }

    /// Snapshot of an authenticated session.
    pub fn authenticated(session: &Session) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            user: Some(session.user.clone()),
            token: Some(session.token.clone()),
        }
    }

    /// Whether a full session is held.
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated && self.user.is_some() && self.token.is_some()
    }

    /// Whether startup has not finished yet.
    pub fn is_loading(&self) -> bool {
        self.status.is_pending()
    }

    /// Startup has finished and no session is held.
    pub fn is_unauthenticated(&self) -> bool {
        !self.is_authenticated() && !self.is_loading()
    }
}
