//! Error types for harvest operations.
//!
//! This module defines the main error type [`HarvestError`] which represents
//! everything that can fail while fetching, converting and persisting an
//! article.
//!
//! # Example
//!
//! ```rust
//! use webharvest_core::{HarvestError, Result};
//!
//! fn require_url(url: &str) -> Result<&str> {
//!     if url.is_empty() {
//!         return Err(HarvestError::MissingUrl);
//!     }
//!     Ok(url)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for harvest operations.
///
/// Fetch failures are `HttpError`, `Timeout`, `HttpStatus` and `InvalidUrl`.
/// Persistence failures surface as `WriteError`. `ContentNotFound` is raised
/// when the configured content selector matches nothing on a page.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Non-success HTTP status (image downloads only).
    #[error("Request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Article entry without a URL.
    #[error("Article has no URL")]
    MissingUrl,

    /// HTML parsing errors, usually an invalid CSS selector.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// The main content selector matched nothing.
    #[error("Main content not found (selector: {selector})")]
    ContentNotFound { selector: String },

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File write errors.
    ///
    /// Wraps standard I/O errors for file operations.
    #[error("Failed to write to file: {0}")]
    WriteError(#[from] std::io::Error),

    /// JSON (de)serialization of configs, article lists and results.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid run configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl HarvestError {
    /// True for the errors that come from the transport layer.
    pub fn is_fetch_error(&self) -> bool {
        match self {
            #[cfg(feature = "fetch")]
            HarvestError::HttpError(_) => true,
            HarvestError::Timeout { .. } | HarvestError::HttpStatus { .. } | HarvestError::InvalidUrl(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for HarvestError.
pub type Result<T> = std::result::Result<T, HarvestError>;
