//! Session state machine.

use super::{Session, SessionSnapshot};

/// Phase of the authentication lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Nothing has been observed yet.
    #[default]
    Uninitialized,
    /// Persisted session is being read at startup.
    Loading,
    /// A full session is held.
    Authenticated,
    /// No session is held.
    Unauthenticated,
}

impl SessionStatus {
    /// Check if transition to target status is valid.
    ///
    /// Valid transitions:
    /// - Uninitialized -> Loading
    /// - Loading -> Authenticated | Unauthenticated
    /// - Authenticated -> Authenticated (new sign-in replaces the session)
    /// - Authenticated -> Unauthenticated
    /// - Unauthenticated -> Authenticated
    /// - Unauthenticated -> Unauthenticated (repeated sign-out)
    pub fn can_transition_to(&self, target: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (*self, target),
            (Uninitialized, Loading)
                | (Loading, Authenticated)
                | (Loading, Unauthenticated)
                | (Authenticated, Authenticated)
                | (Authenticated, Unauthenticated)
                | (Unauthenticated, Authenticated)
                | (Unauthenticated, Unauthenticated)
        )
    }

    /// Startup has not produced a decision yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, SessionStatus::Uninitialized | SessionStatus::Loading)
    }

    /// Check if this is one of the two settled statuses.
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Lowercase name used in logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Uninitialized => "uninitialized",
            SessionStatus::Loading => "loading",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Unauthenticated => "unauthenticated",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory state owned by the session manager.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Startup read in progress.
    #[default]
    Loading,
    /// Signed in.
    Authenticated(Session),
    /// Signed out.
    Unauthenticated,
}

impl SessionState {
    /// Status of this state.
    pub fn status(&self) -> SessionStatus {
        match self {
            SessionState::Loading => SessionStatus::Loading,
            SessionState::Authenticated(_) => SessionStatus::Authenticated,
            SessionState::Unauthenticated => SessionStatus::Unauthenticated,
        }
    }

    /// The held session, if any.
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// Attempt to move to a new state.
    ///
    /// Returns `Ok(())` if the transition is valid, or an error otherwise.
    /// The state is left unchanged on error.
    pub fn transition_to(&mut self, target: SessionState) -> crate::Result<()> {
        let from = self.status();
        let to = target.status();
        if from.can_transition_to(to) {
            *self = target;
            Ok(())
        } else {
            Err(crate::error::SessionError::InvalidStateTransition { from, to })
        }
    }

    /// Build the observer view of this state.
    pub fn snapshot(&self) -> SessionSnapshot {
        match self {
            SessionState::Authenticated(session) => SessionSnapshot::authenticated(session),
            other => SessionSnapshot::empty(other.status()),
        }
    }
}
