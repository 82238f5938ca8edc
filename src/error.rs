//! Error types for image acquisition.

use crate::config::ProviderKind;
use std::time::Duration;

/// Coarse classification of a failure, used for logging and fallback decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No credentials configured; routes straight to the fallback renderer.
    ConfigurationAbsent,
    /// Timeout or connection failure.
    NetworkFailure,
    /// Provider answered with a non-2xx status.
    ProviderRejected,
    /// Response bytes could not be interpreted as an image.
    DecodeFailure,
    /// Local failure unrelated to a provider (I/O, rendering setup).
    Internal,
}

/// Errors that can occur while acquiring a story image.
#[derive(Debug, thiserror::Error)]
pub enum StoryVizError {
    /// No provider credentials are configured.
    #[error("no image provider configured")]
    ConfigurationAbsent,

    /// Network or HTTP transport error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request exceeded the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Provider returned a non-success status.
    #[error("{provider} rejected request: {status} - {message}")]
    ProviderRejected {
        /// Provider that rejected the request.
        provider: ProviderKind,
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// JSON response parsed but carried no image payload.
    #[error("provider returned JSON with no image data: {0}")]
    NoImageData(String),

    /// Bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Local rendering resources are unusable.
    #[error("render setup failed: {0}")]
    Render(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoryVizError {
    /// Maps this error onto its [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigurationAbsent => ErrorKind::ConfigurationAbsent,
            Self::Network(_) | Self::Timeout(_) => ErrorKind::NetworkFailure,
            Self::ProviderRejected { .. } => ErrorKind::ProviderRejected,
            Self::NoImageData(_) | Self::Decode(_) => ErrorKind::DecodeFailure,
            Self::InvalidRequest(_) | Self::Render(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ProviderRejected { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if the orchestrator may move on to the next provider.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Internal)
    }

    /// Converts a transport error, folding reqwest timeouts into [`Self::Timeout`].
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Network(err)
        }
    }
}

/// Result type alias for image acquisition operations.
pub type Result<T> = std::result::Result<T, StoryVizError>;

const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// Collapses whitespace and truncates a provider error body for logging.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_ERROR_MESSAGE_CHARS {
        return collapsed;
    }
    let mut out: String = collapsed.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
    out.push('…');
    out
}
