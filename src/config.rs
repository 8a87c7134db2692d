//! Configuration management for session-gate.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::{MockConfig, MOCK_TOKEN, TEST_EMAIL, TEST_PASSWORD};
use crate::cli::Args;
use crate::guard::Route;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Persistence settings.
    pub storage: StorageSection,
    /// Authentication backend settings.
    pub auth: AuthSection,
    /// Navigation routes.
    pub routes: RouteSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Storage configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// File holding the persisted session.
    pub path: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("session-gate.json"),
        }
    }
}

/// Mock authentication backend section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Email accepted by sign-in.
    pub test_email: String,
    /// Password accepted by sign-in.
    pub test_password: String,
    /// Token issued on success.
    pub mock_token: String,
    /// Simulated sign-in delay in milliseconds.
    pub login_latency_ms: u64,
    /// Simulated registration delay in milliseconds.
    pub register_latency_ms: u64,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            test_email: TEST_EMAIL.to_string(),
            test_password: TEST_PASSWORD.to_string(),
            mock_token: MOCK_TOKEN.to_string(),
            login_latency_ms: 600,
            register_latency_ms: 800,
        }
    }
}

/// Route configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteSection {
    /// Login entry point.
    pub login: String,
    /// Landing route after sign-in.
    pub home: String,
}

impl Default for RouteSection {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            home: "/(tabs)".to_string(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("SESSION_GATE_STORE") {
            if !path.is_empty() {
                self.storage.path = PathBuf::from(path);
            }
        }

        if let Ok(level) = std::env::var("SESSION_GATE_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref path) = args.store {
            self.storage.path = path.clone();
        }

        if args.no_latency {
            self.auth.login_latency_ms = 0;
            self.auth.register_latency_ms = 0;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        config.apply_env();
        config.apply_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Check that the routes are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let login = self.login_route();
        if login.root_segment().is_none() {
            return Err(ConfigError::InvalidRoute(self.routes.login.clone()));
        }
        if self.home_route().same_root(&login) {
            return Err(ConfigError::InvalidRoute(self.routes.home.clone()));
        }
        Ok(())
    }

    /// Mock backend settings.
    pub fn to_mock_config(&self) -> MockConfig {
        MockConfig {
            email: self.auth.test_email.clone(),
            password: self.auth.test_password.clone(),
            token: self.auth.mock_token.clone(),
            login_latency: Duration::from_millis(self.auth.login_latency_ms),
            register_latency: Duration::from_millis(self.auth.register_latency_ms),
        }
    }

    /// Login entry point.
    pub fn login_route(&self) -> Route {
        Route::new(&self.routes.login)
    }

    /// Landing route after sign-in.
    pub fn home_route(&self) -> Route {
        Route::new(&self.routes.home)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Route that cannot serve its purpose.
    InvalidRoute(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidRoute(route) => write!(f, "invalid route: '{}'", route),
        }
    }
}

impl std::error::Error for ConfigError {}
