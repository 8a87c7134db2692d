//! In-process stand-in for the authentication service.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{AuthBackend, AuthResponse};
use crate::error::SessionError;
use crate::session::{Token, User};
use crate::Result;

/// Email accepted by the default mock.
pub const TEST_EMAIL: &str = "test@example.com";

/// Password accepted by the default mock.
pub const TEST_PASSWORD: &str = "Test1234!";

/// Token issued by the default mock.
pub const MOCK_TOKEN: &str = "mock-token-123";

/// Mock backend configuration.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// The only email sign-in accepts.
    pub email: String,
    /// The only password sign-in accepts.
    pub password: String,
    /// Token handed out on success.
    pub token: String,
    /// Simulated sign-in round trip.
    pub login_latency: Duration,
    /// Simulated registration round trip.
    pub register_latency: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            email: TEST_EMAIL.to_string(),
            password: TEST_PASSWORD.to_string(),
            token: MOCK_TOKEN.to_string(),
            login_latency: Duration::from_millis(600),
            register_latency: Duration::from_millis(800),
        }
    }
}

impl MockConfig {
    /// Same credentials with no simulated delay.
    pub fn instant() -> Self {
        Self {
            login_latency: Duration::ZERO,
            register_latency: Duration::ZERO,
            ..Default::default()
        }
    }
}

/// Accepts exactly one credential pair; registration always succeeds.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    config: MockConfig,
}

impl MockBackend {
    /// Create a mock with the given configuration.
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Credentials a presentation layer can prefill for testing.
    pub fn test_credentials(&self) -> (&str, &str) {
        (&self.config.email, &self.config.password)
    }

    fn response(&self, email: &str) -> AuthResponse {
        AuthResponse {
            token: Token::new(self.config.token.clone()),
            user: User::new(email),
        }
    }
}

async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthResponse> {
        simulate_latency(self.config.login_latency).await;

        if email != self.config.email || password != self.config.password {
            debug!(email, "mock backend rejected credentials");
            return Err(SessionError::InvalidCredentials);
        }

        info!(email, "mock backend accepted credentials");
        Ok(self.response(email))
    }

    async fn register(&self, email: &str, _password: &str) -> Result<AuthResponse> {
        simulate_latency(self.config.register_latency).await;
        info!(email, "mock backend registered account");
        Ok(self.response(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accepts_test_credentials() {
        let backend = MockBackend::new(MockConfig::instant());
        let resp = backend.authenticate(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
        assert_eq!(resp.token.as_str(), MOCK_TOKEN);
        assert_eq!(resp.user.email, TEST_EMAIL);
    }

    #[tokio::test]
    async fn test_rejects_wrong_password() {
        let backend = MockBackend::new(MockConfig::instant());
        let err = backend.authenticate(TEST_EMAIL, "wrong").await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_rejects_other_email() {
        let backend = MockBackend::new(MockConfig::instant());
        assert!(backend.authenticate("x@example.com", TEST_PASSWORD).await.is_err());
    }

    #[tokio::test]
    async fn test_register_always_succeeds() {
        let backend = MockBackend::new(MockConfig::instant());
        let resp = backend.register("new@example.com", "whatever").await.unwrap();
        assert_eq!(resp.user.email, "new@example.com");
        assert_eq!(resp.token.as_str(), MOCK_TOKEN);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_latency() {
        let backend = MockBackend::default();
        let start = tokio::time::Instant::now();
        backend.authenticate(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(600));
    }

    #[test]
    fn test_credentials_exposed() {
        let backend = MockBackend::default();
        assert_eq!(backend.test_credentials(), (TEST_EMAIL, TEST_PASSWORD));
    }
}
