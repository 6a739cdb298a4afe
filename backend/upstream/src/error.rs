use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Timeout,
    HttpStatus,
    Unknown,
}

/// Classified failure of a single upstream request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl FetchError {
    pub fn from_status(status: StatusCode) -> Self {
        Self::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Status { .. } => ErrorKind::HttpStatus,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return Self::from_status(status);
        }

        if error.is_decode() || error.is_builder() {
            return Self::Unknown(error.to_string());
        }

        Self::Network(error.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("Backoff factor must be finite and at least 1, got {0}")]
    BackoffFactor(f64),

    #[error("Base delay {base:?} exceeds max delay {max:?}")]
    DelayBounds { base: Duration, max: Duration },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_carry_code_and_reason() {
        let error = FetchError::from_status(StatusCode::SERVICE_UNAVAILABLE);

        assert_eq!(error.kind(), ErrorKind::HttpStatus);
        assert_eq!(error.status(), Some(503));
        assert_eq!(error.to_string(), "HTTP 503: Service Unavailable");
    }

    #[test]
    fn non_status_errors_have_no_code() {
        assert_eq!(FetchError::Timeout(10_000).status(), None);
        assert_eq!(FetchError::Timeout(10_000).kind(), ErrorKind::Timeout);
        assert_eq!(
            FetchError::Timeout(250).to_string(),
            "Request timeout after 250ms"
        );
        assert_eq!(FetchError::Network("reset".into()).kind(), ErrorKind::Network);
    }
}
