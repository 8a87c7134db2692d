//! # session-gate
//!
//! Client-side session management for apps that sign users in against a
//! remote service and must remember them across restarts.
//!
//! ## Features
//!
//! - **Session state machine**: `Loading`, `Authenticated`, `Unauthenticated`,
//!   with every transition published to observers
//! - **Durable storage**: token and user persisted together, self-healing
//!   on half-written or corrupt data
//! - **Serialized mutations**: concurrent sign-in/sign-out calls queue
//!   instead of interleaving their writes
//! - **Navigation guard**: signed-out users are redirected to the login
//!   route exactly once, and nothing is decided while loading
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use session_gate::{MockBackend, SessionManager, SessionStatus, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> session_gate::Result<()> {
//!     session_gate::logging::try_init().ok();
//!
//!     let store = SessionStore::file("session.json");
//!     let manager = SessionManager::new(store, Arc::new(MockBackend::default()));
//!
//!     if manager.initialize().await == SessionStatus::Unauthenticated {
//!         manager.sign_in("test@example.com", "Test1234!").await?;
//!     }
//!
//!     println!("signed in as {:?}", manager.user());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod guard;
pub mod logging;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use auth::{AuthBackend, AuthResponse, MockBackend, MockConfig};
pub use error::{Result, SessionError};
pub use guard::{GuardView, NavigationGuard, Navigator, Route, Router};
pub use session::{
    PresenceValidator, Session, SessionManager, SessionSnapshot, SessionState, SessionStatus,
    Token, TokenValidator, User,
};
pub use storage::{FileBackend, MemoryBackend, SessionStore, StorageBackend, StorageSlot};
