//! Unified error handling for `capstone-api`.
//!
//! A single top-level error type [`CapstoneApiError`] covers the whole
//! library. Configuration problems live in the nested [`ConfigError`] enum.
//! Small helpers for reading/validating environment variables return the
//! unified [`ApiResult<T>`] alias.
//!
//! All messages include the suffix `[Capstone API]` to simplify attribution in logs.

use reqwest::StatusCode;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type ApiResult<T> = std::result::Result<T, CapstoneApiError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `capstone-api` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CapstoneApiError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Request could not complete (DNS, connect, reset, body read).
    #[error("[Capstone API] network error: {0}")]
    Network(String),

    /// Request exceeded the client timeout.
    #[error("[Capstone API] request timed out")]
    Timeout,

    /// Credential missing or rejected (HTTP 401/403).
    #[error("[Capstone API] unauthorized: HTTP {status} from {url}")]
    Unauthorized {
        /// 401 or 403.
        status: StatusCode,
        /// Request URL.
        url: String,
    },

    /// Resource does not exist (HTTP 404).
    #[error("[Capstone API] not found: {url}")]
    NotFound {
        /// Request URL.
        url: String,
    },

    /// Upstream returned any other non-successful HTTP status.
    #[error("[Capstone API] HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Short snippet of the response body (trimmed).
        snippet: String,
    },

    /// Response payload could not be decoded as expected.
    #[error("[Capstone API] decode error: {0}")]
    Decode(String),
}

impl CapstoneApiError {
    /// Builds the error for a non-success status, picking the specific variant
    /// when one exists.
    pub(crate) fn from_status(status: StatusCode, url: String, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized { status, url },
            StatusCode::NOT_FOUND => Self::NotFound { url },
            _ => Self::HttpStatus {
                status,
                url,
                snippet: make_snippet(body),
            },
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { status, .. } | Self::HttpStatus { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CapstoneApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return CapstoneApiError::Timeout;
        }
        if e.is_decode() {
            return CapstoneApiError::Decode(e.to_string());
        }
        if let Some(status) = e.status() {
            let url = e.url().map(|u| u.to_string()).unwrap_or_default();
            return CapstoneApiError::from_status(status, url, "");
        }
        CapstoneApiError::Network(e.to_string())
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Errors that realistically happen at config load/validation time.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[Capstone API] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (timeouts, page sizes).
    #[error("[Capstone API] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `CAPSTONE_API_TIMEOUT_SECS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u64`).
        reason: &'static str,
    },

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[Capstone API] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `CAPSTONE_API_URL`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `ApiResult<T>`)                               */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`ConfigError::MissingVar`] if the variable is absent or empty.
pub fn must_env(name: &'static str) -> ApiResult<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Reads an optional, non-empty environment variable.
pub fn opt_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a
/// valid `u64`.
pub fn env_opt_u64(name: &'static str) -> ApiResult<Option<u64>> {
    match opt_env(name) {
        Some(v) => v.trim().parse::<u64>().map(Some).map_err(|_| {
            CapstoneApiError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        None => Ok(None),
    }
}

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the string does not start with
/// a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> ApiResult<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Trims a response body to a short single-line snippet for error messages.
pub fn make_snippet(body: &str) -> String {
    body.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(240)
        .collect()
}
