//! Crate-level error types.
//!
//! [`PulseError`] unifies every error source (configuration, data sources,
//! HTTP, JSON) behind a single enum so callers can match on the variant they
//! care about while still using the `?` operator for easy propagation.

use crate::sources::SourceError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PulseError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    /// Configuration could not be read from the environment or a file.
    #[error("configuration error: {0}")]
    Config(String),

    /// An external data source failed.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// An HTTP request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading a file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A handler was created outside of a tokio runtime.
    #[error("no tokio runtime is running on this thread")]
    NoRuntime,
}
