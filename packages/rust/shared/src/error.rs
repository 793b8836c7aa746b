//! Error types for manualsync.
//!
//! Library crates use [`ManualSyncError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Per-chapter problems are modelled separately as [`ChapterError`] so the
//! pipeline can record them without aborting sibling chapters.

use std::path::PathBuf;

/// Maximum number of body characters kept in a [`FetchError::Status`] excerpt.
pub const BODY_EXCERPT_CHARS: usize = 200;

/// Top-level error type for all manualsync operations.
#[derive(Debug, thiserror::Error)]
pub enum ManualSyncError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Root page unreachable or no chapter links found. Always fatal.
    #[error("discovery failed: {message}")]
    Discovery { message: String },

    /// HTTP fetch failure.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// No content container found in a chapter page.
    #[error("extraction failed: {message}")]
    Extraction { message: String },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Metadata ledger could not be parsed or serialized.
    #[error("metadata error: {message}")]
    Metadata { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad URL, bad option value, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Every discovered chapter failed; nothing was written.
    #[error("all {failed} chapters failed to process")]
    NoChaptersSucceeded { failed: usize },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ManualSyncError>;

impl ManualSyncError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a discovery error from any displayable message.
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery {
            message: msg.into(),
        }
    }

    /// Create an extraction error from any displayable message.
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
            message: msg.into(),
        }
    }

    /// Create a metadata error from any displayable message.
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure reported by a page fetcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The server answered with something other than `200 OK`.
    #[error("HTTP {status} for {url}. Response: {excerpt}")]
    Status {
        url: String,
        status: u16,
        excerpt: String,
    },

    /// DNS, connect, reset, timeout or body-read failure.
    #[error("failed to fetch {url}: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    /// Build a [`FetchError::Status`], truncating the body to an excerpt.
    pub fn status(url: impl Into<String>, status: u16, body: &str) -> Self {
        let mut excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
        if body.chars().count() > BODY_EXCERPT_CHARS {
            excerpt.push_str("...");
        }
        Self::Status {
            url: url.into(),
            status,
            excerpt,
        }
    }

    /// Build a [`FetchError::Transport`].
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Why a single chapter was skipped.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChapterError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The chapter task panicked, or was aborted before finishing.
    #[error("chapter task did not complete: {0}")]
    Task(String),
}
