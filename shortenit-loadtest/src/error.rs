//! Failure classification for samples.

/// Reasons a single sample is recorded as failed.
///
/// None of these are fatal to a run. Each one becomes a failed sample carrying the [`Display`]
/// text of the error as its diagnostic.
///
/// [`Display`]: std::fmt::Display
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The service answered with a status other than `200 OK`.
    #[error("unexpected status code: {status} - {body}")]
    UnexpectedStatus {
        /// The HTTP status code received.
        status: u16,
        /// The raw response body, for context.
        body: String,
    },
    /// The response body could not be decoded as JSON.
    #[error("failed to decode JSON: {0}")]
    MalformedBody(String),
    /// The response body decoded, but a required field or marker is absent.
    #[error("missing {field} in response: {body}")]
    MissingField {
        /// Name of the expected field or marker.
        field: &'static str,
        /// The raw response body, for context.
        body: String,
    },
    /// No response was received at all.
    #[error("request failed: {0}")]
    Transport(String),
}

/// Error raised by a [`ShortenerApi`](crate::ShortenerApi) when a request could not be completed.
#[derive(Debug, thiserror::Error)]
#[error("{endpoint}: {message}")]
pub struct TransportError {
    /// The endpoint that was called.
    pub endpoint: crate::Endpoint,
    /// Description of the underlying client error.
    pub message: String,
}

impl TransportError {
    /// Creates a new transport error for a call to `endpoint`.
    pub fn new(endpoint: crate::Endpoint, message: impl ToString) -> Self {
        Self {
            endpoint,
            message: message.to_string(),
        }
    }
}

impl From<TransportError> for ValidationError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error.to_string())
    }
}
