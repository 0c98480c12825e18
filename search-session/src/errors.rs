//! Error taxonomy for search and summary acquisition.

use std::time::Duration;

use capstone_api::CapstoneApiError;
use thiserror::Error;

/// Convenient alias for session results.
pub type SessionResult<T> = Result<T, SessionError>;

/// What can go wrong while fetching results or a summary.
///
/// `Cancelled` is normal operation (a newer search superseded the work) and
/// never reaches the view.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The request could not complete.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// Non-success status from the service.
    #[error("server error: HTTP {status}: {message}")]
    ServerError { status: u16, message: String },

    /// No resolution within the allotted window.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Superseded by a newer operation.
    #[error("cancelled")]
    Cancelled,
}

impl SessionError {
    /// Whether this error should be rendered as a failure affordance.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, SessionError::Cancelled)
    }
}

impl From<CapstoneApiError> for SessionError {
    fn from(e: CapstoneApiError) -> Self {
        match e {
            // The transport timeout is not the job timeout; report the kind only.
            CapstoneApiError::Timeout => SessionError::Timeout(Duration::ZERO),
            CapstoneApiError::Network(msg) => SessionError::NetworkFailure(msg),
            other => match other.status() {
                Some(status) => SessionError::ServerError {
                    status: status.as_u16(),
                    message: other.to_string(),
                },
                None => SessionError::NetworkFailure(other.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_into_taxonomy() {
        assert_eq!(
            SessionError::from(CapstoneApiError::Timeout),
            SessionError::Timeout(Duration::ZERO)
        );
        assert!(matches!(
            SessionError::from(CapstoneApiError::Network("reset".into())),
            SessionError::NetworkFailure(_)
        ));
        assert!(matches!(
            SessionError::from(CapstoneApiError::NotFound { url: "u".into() }),
            SessionError::ServerError { status: 404, .. }
        ));
        assert!(matches!(
            SessionError::from(CapstoneApiError::Decode("bad json".into())),
            SessionError::NetworkFailure(_)
        ));
    }

    #[test]
    fn cancelled_is_not_user_visible() {
        assert!(!SessionError::Cancelled.is_user_visible());
        assert!(SessionError::Timeout(Duration::from_secs(30)).is_user_visible());
    }
}
