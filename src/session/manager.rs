//! The session state machine.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use super::{
    PresenceValidator, Session, SessionSnapshot, SessionState, SessionStatus, TokenValidator, User,
};
use crate::auth::{AuthBackend, AuthResponse};
use crate::error::SessionError;
use crate::storage::{SessionStore, StorageSlot};
use crate::Result;

#[derive(Debug, Clone, Copy)]
enum Exchange {
    SignIn,
    Register,
}

impl Exchange {
    fn as_str(self) -> &'static str {
        match self {
            Exchange::SignIn => "sign-in",
            Exchange::Register => "register",
        }
    }
}

/// Owner of the in-memory session and sole writer to the [`SessionStore`].
///
/// Mutating operations take an internal async lock for their whole
/// duration, so concurrent calls are queued in arrival order and never
/// interleave their storage writes. Observers read the latest
/// [`SessionSnapshot`] through [`subscribe`](Self::subscribe) without
/// contending for that lock.
pub struct SessionManager {
    store: SessionStore,
    backend: Arc<dyn AuthBackend>,
    validator: Arc<dyn TokenValidator>,
    state: Mutex<SessionState>,
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionManager {
    /// Create a manager in the `Loading` state.
    ///
    /// Call [`initialize`](Self::initialize) before anything else.
    pub fn new(store: SessionStore, backend: Arc<dyn AuthBackend>) -> Self {
        let state = SessionState::Loading;
        let (tx, _rx) = watch::channel(state.snapshot());
        Self {
            store,
            backend,
            validator: Arc::new(PresenceValidator),
            state: Mutex::new(state),
            tx,
        }
    }

    /// Replace the token validity check used when restoring a session.
    pub fn with_validator(mut self, validator: Arc<dyn TokenValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        self.tx.borrow().status
    }

    /// Whether a session is held.
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    /// Whether startup is still in progress.
    pub fn is_loading(&self) -> bool {
        self.tx.borrow().is_loading()
    }

    /// Signed-in user, if any.
    pub fn user(&self) -> Option<User> {
        self.tx.borrow().user.clone()
    }

    /// The persistence layer this manager writes to.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Restore the persisted session.
    ///
    /// Always settles on `Authenticated` or `Unauthenticated`; every
    /// failure is logged and treated as "no session". When no usable
    /// session is found both slots are cleared. Calling this again after
    /// it has settled does nothing.
    pub async fn initialize(&self) -> SessionStatus {
        let mut state = self.state.lock().await;
        if !matches!(*state, SessionState::Loading) {
            debug!(status = %state.status(), "initialize called again, ignoring");
            return state.status();
        }

        let next = match self.restore().await {
            Some(session) => {
                info!(email = %session.user.email, "restored stored session");
                SessionState::Authenticated(session)
            }
            None => {
                info!("no valid stored session");
                if let Err(e) = self.store.clear().await {
                    error!(error = %e, "failed to clear stale session data");
                }
                SessionState::Unauthenticated
            }
        };

        if let Err(e) = self.apply(&mut state, next) {
            error!(error = %e, "initialize could not settle state");
            *state = SessionState::Unauthenticated;
            self.publish(&state);
        }
        state.status()
    }

    async fn restore(&self) -> Option<Session> {
        let token = self.store.get_token().await;
        let user = match self.store.load_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "stored user is unreadable");
                None
            }
        };

        match (token, user) {
            (Some(token), Some(user)) if self.validator.is_valid(&token) => {
                Some(Session::new(token, user))
            }
            (Some(token), Some(_)) => {
                info!(token_len = token.len(), "stored token failed validity check");
                None
            }
            (token, user) => {
                if token.is_some() != user.is_some() {
                    warn!(
                        has_token = token.is_some(),
                        has_user = user.is_some(),
                        "found half a stored session"
                    );
                }
                None
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// On any error the in-memory state and both storage slots are left as
    /// they were before the call.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        self.exchange(Exchange::SignIn, email, password).await
    }

    /// Register a new account and sign it in.
    ///
    /// Same guarantees as [`sign_in`](Self::sign_in).
    pub async fn register(&self, email: &str, password: &str) -> Result<()> {
        self.exchange(Exchange::Register, email, password).await
    }

    async fn exchange(&self, kind: Exchange, email: &str, password: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.status().is_pending() {
            return Err(SessionError::NotReady);
        }

        let call = match kind {
            Exchange::SignIn => self.backend.authenticate(email, password).await,
            Exchange::Register => self.backend.register(email, password).await,
        };
        let resp = call.map_err(|e| {
            warn!(op = kind.as_str(), email, error = %e, "backend rejected request");
            e
        })?;

        if !self.validator.is_valid(&resp.token) {
            warn!(op = kind.as_str(), "backend returned an unusable token");
            return Err(SessionError::Network("backend returned an unusable token".into()));
        }

        self.persist(&state, &resp).await?;

        let AuthResponse { token, user } = resp;
        info!(op = kind.as_str(), email = %user.email, "session established");
        self.apply(&mut state, SessionState::Authenticated(Session::new(token, user)))
    }

    /// Write token then user. If the user write fails the token slot is put
    /// back the way it was, so storage never holds a token without its user.
    async fn persist(&self, state: &SessionState, resp: &AuthResponse) -> Result<()> {
        self.store.set_token(&resp.token).await.map_err(|e| {
            error!(error = %e, "failed to persist token");
            e
        })?;

        if let Err(e) = self.store.set_user(&resp.user).await {
            error!(error = %e, "failed to persist user, rolling back token");
            let rollback = match state.session() {
                Some(previous) => self.store.set_token(&previous.token).await,
                None => self.store.remove(StorageSlot::AccessToken).await,
            };
            if let Err(rollback_err) = rollback {
                error!(error = %rollback_err, "token rollback failed");
            }
            return Err(e);
        }

        Ok(())
    }

    /// Sign out.
    ///
    /// The in-memory session is always dropped and the status always ends
    /// `Unauthenticated`, even before [`initialize`](Self::initialize) has
    /// run. Storage is cleared even when already signed out; a failure to
    /// clear it is returned after the transition.
    pub async fn sign_out(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.end_session(&mut state, "sign-out").await
    }

    /// Drop the session because its token is no longer valid.
    ///
    /// Same cleanup as [`sign_out`](Self::sign_out).
    pub async fn token_expired(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.end_session(&mut state, "token expired").await
    }

    async fn end_session(&self, state: &mut SessionState, cause: &'static str) -> Result<()> {
        let cleared = self.store.clear().await;
        match state.session() {
            Some(session) => info!(cause, email = %session.user.email, "session ended"),
            None => debug!(cause, "no session held, storage cleared"),
        }
        self.apply(state, SessionState::Unauthenticated)?;
        cleared
    }

    /// Re-read the cached user from storage.
    ///
    /// Only acts while authenticated and never changes the token or the
    /// status. A missing or unreadable record keeps the current user.
    /// Returns the user held afterwards.
    pub async fn refresh_user(&self) -> Option<User> {
        let mut state = self.state.lock().await;
        let Some(current) = state.session().cloned() else {
            debug!(status = %state.status(), "not authenticated, nothing to refresh");
            return None;
        };

        match self.store.load_user().await {
            Ok(Some(user)) if user != current.user => {
                debug!(email = %user.email, "refreshed cached user");
                let next = SessionState::Authenticated(Session::new(current.token, user));
                if let Err(e) = self.apply(&mut state, next) {
                    error!(error = %e, "refresh could not update state");
                }
            }
            Ok(Some(_)) => debug!("cached user unchanged"),
            Ok(None) => warn!("stored user missing, keeping cached user"),
            Err(e) => warn!(error = %e, "stored user unreadable, keeping cached user"),
        }

        state.session().map(|session| session.user.clone())
    }

    fn apply(&self, state: &mut SessionState, next: SessionState) -> Result<()> {
        let from = state.status();
        state.transition_to(next)?;
        if from != state.status() {
            info!(from = %from, to = %state.status(), "session status changed");
        }
        self.publish(state);
        Ok(())
    }

    fn publish(&self, state: &SessionState) {
        let snapshot = state.snapshot();
        self.tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
