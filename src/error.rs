use http::StatusCode;
use thiserror::Error;

use crate::youtube::UpstreamError;

/// Failures surfaced by the search, info and download operations.
///
/// The `Display` text is what clients see in the `error` field; the upstream
/// source is only attached as `details` outside production.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Request timed out - video may be unavailable")]
    Timeout(#[source] UpstreamError),

    #[error("Failed to search videos")]
    UpstreamFailure(#[source] UpstreamError),

    #[error("{message}")]
    ResolutionFailure {
        message: &'static str,
        #[source]
        source: UpstreamError,
    },

    #[error("Format not found")]
    FormatNotFound(String),

    #[error("Failed to download video")]
    Download(#[source] UpstreamError),
}

impl ServiceError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ServiceError::InvalidInput(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::InvalidInput(_) | ServiceError::FormatNotFound(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Timeout(_)
            | ServiceError::UpstreamFailure(_)
            | ServiceError::ResolutionFailure { .. }
            | ServiceError::Download(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Raw upstream text, if any.
    pub fn details(&self) -> Option<String> {
        match self {
            ServiceError::Timeout(source)
            | ServiceError::UpstreamFailure(source)
            | ServiceError::ResolutionFailure { source, .. }
            | ServiceError::Download(source) => Some(source.to_string()),
            ServiceError::InvalidInput(_) | ServiceError::FormatNotFound(_) => None,
        }
    }
}
