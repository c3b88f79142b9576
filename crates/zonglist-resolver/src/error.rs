//! Resolver errors.

use thiserror::Error;

/// Metadata resolver error.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[cfg(feature = "youtube")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Unexpected API response: {0}")]
    InvalidResponse(String),
    #[error("Invalid duration: {0:?}")]
    InvalidDuration(String),
    #[error("API key is not configured")]
    MissingApiKey,
}
