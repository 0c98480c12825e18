//! Client configuration loaded from environment variables.
//!
//! # Environment variables
//!
//! - `CAPSTONE_API_URL`          = service base URL (mandatory)
//! - `CAPSTONE_API_TOKEN`        = opaque bearer credential (optional)
//! - `CAPSTONE_API_TIMEOUT_SECS` = HTTP client timeout (optional, default 60)

use crate::errors::{ApiResult, env_opt_u64, must_env, opt_env, validate_http_endpoint};

/// Default HTTP client timeout in seconds.
///
/// Direct summarization keeps one request open while the server runs the
/// LLM, so this is deliberately generous.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for [`crate::CapstoneClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL of the service, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Opaque credential sent as `Authorization: Bearer <token>`.
    pub token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Config for `base_url` with no credential and the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Loads the config strictly from environment.
    ///
    /// # Errors
    /// - [`crate::ConfigError::MissingVar`] if `CAPSTONE_API_URL` is unset
    /// - [`crate::ConfigError::InvalidFormat`] if it is not an http(s) URL
    /// - [`crate::ConfigError::InvalidNumber`] if the timeout is not a number
    pub fn from_env() -> ApiResult<Self> {
        let base_url = must_env("CAPSTONE_API_URL")?;
        validate_http_endpoint("CAPSTONE_API_URL", base_url.trim())?;
        let timeout_secs =
            env_opt_u64("CAPSTONE_API_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            base_url: base_url.trim().to_string(),
            token: opt_env("CAPSTONE_API_TOKEN"),
            timeout_secs,
        })
    }

    /// Replaces the credential.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}
