//! Centralized error types for notelens.

use std::time::Duration;

use thiserror::Error;

/// Main error type for notelens operations.
#[derive(Error, Debug)]
pub enum NotelensError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to re-encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image download failed with HTTP {status}")]
    FetchStatus { status: u16 },

    #[error("Gemini API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Prompt blocked by the model: {0}")]
    Blocked(String),

    #[error("Model returned no text (finish reason: {0})")]
    EmptyResponse(String),

    #[error("Model call timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("API key not configured; pass --api-key or set {env}", env = crate::config::API_KEY_ENV)]
    MissingCredential,
}

/// Result type for notelens operations.
pub type NotelensResult<T> = Result<T, NotelensError>;
