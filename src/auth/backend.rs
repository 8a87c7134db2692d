//! Remote authentication contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::session::{Token, User};
use crate::Result;

/// Successful response of a sign-in or registration call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Issued access token.
    pub token: Token,
    /// Identity the token belongs to.
    pub user: User,
}

/// Remote service exchanging credentials for a session.
///
/// Failures are reported as `InvalidCredentials` when the pair is not
/// recognised and `Network` when the service could not be reached.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a token and user.
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthResponse>;

    /// Create an account and sign it in.
    async fn register(&self, email: &str, password: &str) -> Result<AuthResponse>;
}
