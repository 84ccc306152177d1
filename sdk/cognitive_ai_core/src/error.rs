use thiserror::Error;

/// Errors that can occur when talking to a cognitive service.
#[derive(Error, Debug)]
pub enum CognitiveError {
    /// The service returned a non-success status with an unstructured body.
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// The service returned a structured error response.
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The request payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP request failed at the transport level.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint URL is invalid.
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// A required configuration value is missing.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// A request builder was given invalid or incomplete input.
    #[error("Builder error: {0}")]
    Builder(String),
}

/// Result type alias for cognitive service operations.
pub type CognitiveResult<T> = std::result::Result<T, CognitiveError>;

/// Determines if an HTTP status code represents a retriable error.
///
/// Retriable errors are transient server-side issues that may succeed on retry:
/// - 429 Too Many Requests (rate limiting)
/// - 500 Internal Server Error
/// - 502 Bad Gateway
/// - 503 Service Unavailable
/// - 504 Gateway Timeout
#[inline]
pub fn is_retriable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

impl CognitiveError {
    pub(crate) fn invalid_endpoint_with_source(
        message: &str,
        source: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidEndpoint(format!("{message}: {source}"))
    }

    /// Whether this error is transient and worth retrying.
    ///
    /// Transient errors are retriable HTTP statuses (429 and 5xx gateway
    /// failures) and transport-level timeouts or connection failures.
    /// Everything else (4xx client errors, auth failures, serialization
    /// problems) is permanent and retrying will not help.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { status, .. } | Self::Api { status, .. } => is_retriable_status(*status),
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable_statuses() {
        assert!(is_retriable_status(429));
        assert!(is_retriable_status(500));
        assert!(is_retriable_status(502));
        assert!(is_retriable_status(503));
        assert!(is_retriable_status(504));

        assert!(!is_retriable_status(200));
        assert!(!is_retriable_status(400));
        assert!(!is_retriable_status(401));
        assert!(!is_retriable_status(404));
    }

    #[test]
    fn http_error_transience_follows_status() {
        let transient = CognitiveError::Http {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert!(transient.is_transient());

        let permanent = CognitiveError::Http {
            status: 404,
            message: "Not Found".into(),
        };
        assert!(!permanent.is_transient());
    }

    #[test]
    fn api_error_transience_follows_status() {
        let rate_limited = CognitiveError::Api {
            status: 429,
            code: "TooManyRequests".into(),
            message: "slow down".into(),
        };
        assert!(rate_limited.is_transient());

        let bad_request = CognitiveError::Api {
            status: 400,
            code: "InvalidZip".into(),
            message: "examples archive is corrupt".into(),
        };
        assert!(!bad_request.is_transient());
    }

    #[test]
    fn config_errors_are_permanent() {
        assert!(!CognitiveError::MissingConfig("endpoint".into()).is_transient());
        assert!(!CognitiveError::Auth("bad key".into()).is_transient());
        assert!(!CognitiveError::Builder("name is required".into()).is_transient());
    }
}
