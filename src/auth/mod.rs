//! Authentication backend.
//!
//! The session manager talks to the remote service only through the
//! [`AuthBackend`] trait. [`MockBackend`] is the in-process implementation
//! used until a real service exists.

mod backend;
mod mock;

pub use backend::{AuthBackend, AuthResponse};
pub use mock::{MockBackend, MockConfig, MOCK_TOKEN, TEST_EMAIL, TEST_PASSWORD};
