//! Error types shared across scrubkit crates.
//!
//! The variants follow the engine's failure classes: a `Loading` error is the
//! only one that escalates to the top-level UI. Asset and input errors are
//! handled where they occur and are carried here so boundaries can log them
//! uniformly.

use std::path::PathBuf;

/// Top-level error type for scrubkit operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrubError {
    /// Metadata, the first preview sheet, or the timeline sprite could not be
    /// loaded. Terminal for the session.
    #[error("Loading failed: {message}")]
    Loading { message: String },

    /// A single asset (sprite sheet, image) could not be fetched or decoded.
    #[error("Asset error at {location}: {message}")]
    Asset { location: String, message: String },

    #[error("Metadata error: {message}")]
    Metadata { message: String },

    #[error("Playback error: {message}")]
    Playback { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ScrubError.
pub type ScrubResult<T> = Result<T, ScrubError>;

impl ScrubError {
    pub fn loading(msg: impl Into<String>) -> Self {
        Self::Loading {
            message: msg.into(),
        }
    }

    pub fn asset(location: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Asset {
            location: location.into(),
            message: msg.into(),
        }
    }

    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata {
            message: msg.into(),
        }
    }

    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage {
            message: msg.into(),
        }
    }

    /// Whether this error ends the session (only loading failures do).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_loading_is_fatal() {
        assert!(ScrubError::loading("metadata unavailable").is_fatal());
        assert!(!ScrubError::asset("sheet-3.jpg", "404").is_fatal());
        assert!(!ScrubError::metadata("interval must be positive").is_fatal());
    }

    #[test]
    fn test_asset_error_display_names_location() {
        let err = ScrubError::asset("https://cdn/x-preview-2.jpg", "HTTP 404");
        assert_eq!(
            err.to_string(),
            "Asset error at https://cdn/x-preview-2.jpg: HTTP 404"
        );
    }
}
