//! Anchor-to-chapter normalization.
//!
//! Turns raw `<a>` elements into [`ChapterRef`]s: collapses whitespace in
//! the anchor text, strips the decorative prefix, resolves the href against
//! the root page URL and drops the fragment.

use std::collections::HashSet;

use scraper::ElementRef;
use url::Url;

use manualsync_shared::ChapterRef;

use crate::scope::Namespace;

/// Filters applied while normalizing one tier of anchors.
pub(crate) struct AnchorRules<'a> {
    pub root_url: &'a Url,
    pub title_prefix: &'a str,
    /// Only URLs inside this namespace are kept, if set.
    pub namespace: Option<&'a Namespace>,
    /// Titles must be strictly longer than this many characters.
    pub min_title_chars: usize,
}

/// Collects unique chapters in document order.
#[derive(Debug, Default)]
pub(crate) struct ChapterSet {
    seen: HashSet<String>,
    chapters: Vec<ChapterRef>,
}

impl ChapterSet {
    /// Insert a chapter unless its URL was already seen.
    pub(crate) fn insert(&mut self, chapter: ChapterRef) -> bool {
        if !self.seen.insert(chapter.url.clone()) {
            return false;
        }
        self.chapters.push(chapter);
        true
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub(crate) fn into_vec(self) -> Vec<ChapterRef> {
        self.chapters
    }
}

/// Normalize one anchor. Returns `None` if it does not describe a chapter.
pub(crate) fn to_chapter(anchor: ElementRef<'_>, rules: &AnchorRules<'_>) -> Option<ChapterRef> {
    let href = anchor.value().attr("href")?.trim();
    if href.is_empty() || href.starts_with('#') || has_script_scheme(href) {
        return None;
    }

    let title = normalize_title(&anchor_text(anchor), rules.title_prefix);
    if is_placeholder(&title, rules.title_prefix)
        || title.chars().count() <= rules.min_title_chars
    {
        return None;
    }

    let mut url = rules.root_url.join(href).ok()?;
    url.set_fragment(None);
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    if rules.namespace.is_some_and(|ns| !ns.contains(&url)) {
        return None;
    }

    Some(ChapterRef::new(title, url.to_string()))
}

/// All descendant text of the anchor with whitespace runs collapsed.
fn anchor_text(anchor: ElementRef<'_>) -> String {
    let raw: String = anchor.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip the decorative prefix once, then trim.
pub(crate) fn normalize_title(text: &str, prefix: &str) -> String {
    let text = text.trim();
    let stripped = if prefix.is_empty() {
        text
    } else {
        text.strip_prefix(prefix).unwrap_or(text)
    };
    stripped.trim().to_string()
}

/// Empty titles and the bare prefix word (e.g. "Open") are not chapters.
fn is_placeholder(title: &str, prefix: &str) -> bool {
    title.is_empty() || (!prefix.trim().is_empty() && title == prefix.trim())
}

fn has_script_scheme(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    lower.starts_with("javascript:") || lower.starts_with("mailto:") || lower.starts_with("tel:")
}
