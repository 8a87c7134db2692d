//! Error types for session-gate.

use thiserror::Error;

use crate::session::SessionStatus;
use crate::storage::StorageSlot;

/// Main error type for session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The backend did not recognise the email/password pair.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// A storage read or write failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A persisted record could not be decoded.
    #[error("corrupt persisted data in {slot}: {reason}")]
    CorruptPersistedData {
        slot: StorageSlot,
        reason: String,
    },

    /// Sign-in or registration was issued before startup finished.
    #[error("session manager is not initialized yet")]
    NotReady,

    /// Invalid state transition attempted.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    /// Whether the end user can fix this by changing their input.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, SessionError::InvalidCredentials)
    }

    /// Whether this error came from the persistence layer.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            SessionError::Storage(_)
                | SessionError::CorruptPersistedData { .. }
                | SessionError::Io(_)
                | SessionError::Json(_)
        )
    }
}

/// Convenience Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
