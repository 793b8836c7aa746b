//! Chapter content extraction and HTML-to-Markdown conversion.
//!
//! Locates the primary content region of a chapter page, converts it to
//! Markdown using the `htmd` crate, then applies a normalization pass so that
//! whitespace-only churn never changes a chapter's content hash.

mod cleanup;

use std::sync::LazyLock;

use htmd::options::{HeadingStyle, Options};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

use manualsync_shared::{ManualSyncError, Result};

pub use cleanup::normalize_markdown;

/// Descendants dropped from the content region before conversion.
const SKIPPED_TAGS: [&str; 5] = ["script", "style", "nav", "header", "footer"];

/// Class or id pattern identifying content-like containers.
static CONTAINER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"main|content|article").expect("container regex"));

static MAIN_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("main").expect("main selector"));
static DIV_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("div selector"));
static ARTICLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article").expect("article selector"));
static BODY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("body selector"));

// ---------------------------------------------------------------------------
// Container location
// ---------------------------------------------------------------------------

/// Which structural signal located the content region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// A semantic `<main>` element.
    Main,
    /// A `<div>` whose class matches `main|content|article`.
    ClassContainer,
    /// An `<article>` element.
    Article,
    /// A `<div>` whose id matches `main|content|article`.
    IdContainer,
    /// The document body, as a last resort.
    Body,
}

/// Find the primary content container in priority order.
fn locate_content(doc: &Html) -> Option<(ContainerKind, ElementRef<'_>)> {
    if let Some(el) = doc.select(&MAIN_SEL).next() {
        return Some((ContainerKind::Main, el));
    }

    if let Some(el) = doc
        .select(&DIV_SEL)
        .find(|el| el.value().classes().any(|class| CONTAINER_RE.is_match(class)))
    {
        return Some((ContainerKind::ClassContainer, el));
    }

    if let Some(el) = doc.select(&ARTICLE_SEL).next() {
        return Some((ContainerKind::Article, el));
    }

    if let Some(el) = doc
        .select(&DIV_SEL)
        .find(|el| el.value().id().is_some_and(|id| CONTAINER_RE.is_match(id)))
    {
        return Some((ContainerKind::IdContainer, el));
    }

    doc.select(&BODY_SEL)
        .next()
        .map(|el| (ContainerKind::Body, el))
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract a chapter page's content as normalized Markdown.
///
/// Fails with an extraction error when the document has no usable container
/// (e.g. a frameset document without a body).
pub fn extract(page_html: &str) -> Result<String> {
    extract_with_kind(page_html).map(|(markdown, _)| markdown)
}

/// Like [`extract`], also reporting which container tier matched.
#[instrument(skip_all, fields(html_len = page_html.len()))]
pub fn extract_with_kind(page_html: &str) -> Result<(String, ContainerKind)> {
    let doc = Html::parse_document(page_html);

    let (kind, container) = locate_content(&doc)
        .ok_or_else(|| ManualSyncError::extraction("could not find main content element"))?;

    debug!(?kind, "content container located");

    let raw = html_to_markdown(&container.inner_html())?;
    let markdown = normalize_markdown(&raw);

    debug!(raw_len = raw.len(), final_len = markdown.len(), "extraction complete");

    Ok((markdown, kind))
}

/// Convert an HTML fragment to Markdown with ATX headings, skipping chrome tags.
pub fn html_to_markdown(fragment: &str) -> Result<String> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .options(Options {
            heading_style: HeadingStyle::Atx,
            ..Default::default()
        })
        .build();

    converter
        .convert(fragment)
        .map_err(|e| ManualSyncError::Conversion(format!("htmd conversion failed: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
