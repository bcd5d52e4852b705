//! Gallery error types.
//!
//! Every fallible operation (particle feed fetches, config and preference
//! files) returns a [`GalleryResult`].  None of these errors are fatal: callers
//! log them and degrade to a default or empty state.

use thiserror::Error;

/// Top-level error enum for the gallery.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP request to the remote particle feed failed outright.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote feed answered with a non-success status.
    #[error("remote feed returned status {status}")]
    HttpStatus {
        /// HTTP status code of the response.
        status: u16,
    },

    /// A particle feed body was not a valid record array.
    #[error("invalid particle JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A TOML file could not be parsed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A TOML document could not be serialized.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// A record carried a color string that is not a hex color.
    #[error("invalid color '{0}'")]
    InvalidColor(String),
}

/// Convenience alias: a `Result` using `GalleryError` as the error type.
pub type GalleryResult<T> = Result<T, GalleryError>;
