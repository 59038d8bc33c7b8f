//! Error types for provider routing.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or calling providers.
///
/// Construction-time variants (`Configuration`, `UnknownProviderType`,
/// `Config`) are returned to the caller. Call-time variants are what backends
/// raise from `query`/`chat`; the [`ProviderManager`](crate::ProviderManager)
/// absorbs them and moves on to the next candidate.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid provider configuration (e.g. empty name).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No factory registered under the requested type name.
    #[error("no registered factory for provider type: {0}")]
    UnknownProviderType(String),

    /// Unknown capability string.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    /// Provider API error.
    #[error("provider API error: {0}")]
    ProviderApi(String),

    /// Request failed.
    #[error("request failed: {0}")]
    Request(String),

    /// Backend-specific failure that fits no other variant.
    #[error("backend error: {0}")]
    Backend(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed configuration document.
    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}
