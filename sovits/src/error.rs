//! Error types for the GPT-SoVITS client.

use thiserror::Error;

/// Result type alias for GPT-SoVITS operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for GPT-SoVITS API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error response returned by the server.
    #[error("sovits: {message} (http={http_status})")]
    Api {
        http_status: u16,
        message: String,
        /// Python exception text, when the server reports one.
        exception: Option<String>,
    },

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body is not a readable WAV file.
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a new API error.
    pub fn api(http_status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            http_status,
            message: message.into(),
            exception: None,
        }
    }

    /// Returns true if the server is overloaded or rate limiting.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::Api { http_status: 429, .. })
    }

    /// Returns true if this is a server-side error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { http_status, .. } if *http_status >= 500)
    }

    /// Returns true if the request was rejected as invalid.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Error::Api { http_status: 400, .. })
    }

    /// Returns true if the request can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout(),
            _ => self.is_rate_limit() || self.is_server_error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(Error::api(429, "busy").is_retryable());
        assert!(Error::api(503, "down").is_server_error());
        assert!(Error::api(500, "boom").is_retryable());

        let err = Error::api(400, "tts failed");
        assert!(err.is_invalid_request());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "sovits: tts failed (http=400)");

        assert!(!Error::Config("base_url".to_string()).is_retryable());
    }
}
