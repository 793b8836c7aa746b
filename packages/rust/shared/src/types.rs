//! Core domain types shared by the discovery, pipeline and output stages.

use serde::{Deserialize, Serialize};

use crate::error::ChapterError;

// ---------------------------------------------------------------------------
// ChapterRef
// ---------------------------------------------------------------------------

/// One chapter link found in the manual's table of contents.
///
/// The URL is the identity key for change tracking; titles may change
/// between runs without losing a chapter's history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterRef {
    /// Normalized display title (decorative prefix removed).
    pub title: String,
    /// Absolute chapter URL.
    pub url: String,
}

impl ChapterRef {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChapterResult
// ---------------------------------------------------------------------------

/// A successfully processed chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterResult {
    /// The chapter this result belongs to.
    pub chapter: ChapterRef,
    /// Position of the chapter in discovery order.
    pub index: usize,
    /// Sanitized output filename, including the `.md` extension.
    pub filename: String,
    /// Normalized Markdown body.
    pub markdown: String,
    /// SHA-256 hex digest of `markdown`.
    pub content_hash: String,
    /// Whether the digest differs from the previous run's.
    pub changed: bool,
}

// ---------------------------------------------------------------------------
// ChapterFailure
// ---------------------------------------------------------------------------

/// A chapter that could not be processed, with the reason.
#[derive(Debug, Clone)]
pub struct ChapterFailure {
    pub chapter: ChapterRef,
    pub index: usize,
    pub error: ChapterError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_ref_serializes_as_plain_object() {
        let chapter = ChapterRef::new("Introduction", "https://example.org/manual/intro");
        let json = serde_json::to_string(&chapter).expect("serialize");
        assert_eq!(
            json,
            r#"{"title":"Introduction","url":"https://example.org/manual/intro"}"#
        );
    }
}
