//! Session state and lifecycle.
//!
//! This module holds the session data model, the status state machine,
//! the pluggable token validity check, and the [`SessionManager`] that
//! drives them.

mod manager;
mod model;
mod state;
mod validity;

pub use manager::SessionManager;
pub use model::{Session, SessionSnapshot, Token, User};
pub use state::{SessionState, SessionStatus};
pub use validity::{PresenceValidator, TokenValidator};
