use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong while fetching the feed.
///
/// The distinction between variants only matters inside the feed client and
/// its logs.  Everything above it sees a [`FailureDetail`].
#[derive(Error, Debug)]
pub enum FetchError {
    /// No response headers (or body) within the configured bound.
    #[error("request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The service answered with a non-success status.
    #[error("service responded with HTTP {0}")]
    HttpStatus(StatusCode),

    /// The body was not a JSON array of feed items.
    #[error("malformed feed body: {0}")]
    Parse(#[from] serde_json::Error),

    /// Connection-level failure (DNS, refused, reset, TLS, ...).
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl FetchError {
    /// Classify a transport error, turning reqwest's own timeouts into
    /// [`FetchError::Timeout`].
    pub fn from_transport(err: reqwest::Error, bound: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(bound)
        } else {
            FetchError::Transport(err)
        }
    }

    /// Collapse into the uniform value handed to the rest of the program.
    pub fn failure_detail(&self) -> FailureDetail {
        match self {
            FetchError::Timeout(_) => FailureDetail::new(None, "Request timed out"),
            FetchError::HttpStatus(status) => FailureDetail::new(
                Some(status.as_u16()),
                format!(
                    "HTTP error: {}",
                    status.canonical_reason().unwrap_or("unexpected status")
                ),
            ),
            FetchError::Parse(err) => FailureDetail::new(None, format!("Malformed feed: {err}")),
            FetchError::Transport(err) => FailureDetail::new(None, err.to_string()),
        }
    }
}

/// The most recent poll failure, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDetail {
    /// HTTP status, when the service answered at all.
    pub status_code: Option<u16>,
    pub message: String,
}

impl FailureDetail {
    pub fn new(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{code}-{}", self.message),
            None => f.write_str(&self.message),
        }
    }
}
