//! Token validity strategies.

use super::Token;

/// Decides whether a stored token may be used to restore a session.
///
/// Implementations that decode expiry claims plug in here.
pub trait TokenValidator: Send + Sync {
    /// Check whether the token is usable.
    fn is_valid(&self, token: &Token) -> bool;
}

/// Accepts any non-empty token.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresenceValidator;

impl TokenValidator for PresenceValidator {
    fn is_valid(&self, token: &Token) -> bool {
        !token.as_str().trim().is_empty()
    }
}

impl<F> TokenValidator for F
where
    F: Fn(&Token) -> bool + Send + Sync,
{
    fn is_valid(&self, token: &Token) -> bool {
        self(token)
    }
}
