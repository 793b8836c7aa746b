//! Chapter link discovery from the manual's root page.
//!
//! The root page carries a table of contents whose anchors use a distinctive
//! class (`a.toc__link` by default). Those anchors are the primary source of
//! chapters. When the table of contents cannot be found, a list of generic
//! selectors is tried in order, and finally any reasonably titled link in the
//! page's main region.

mod anchors;
mod scope;

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use manualsync_shared::{ChapterRef, ManualSyncError, PageFetcher, Result, RunConfig};

use anchors::{AnchorRules, ChapterSet};
use scope::Namespace;

/// Generic selectors tried, in order, when the primary selector yields nothing.
const FALLBACK_SELECTORS: [&str; 6] = [
    r#"a[href*="chapter"]"#,
    r#"a[href*="section"]"#,
    ".chapter-link a",
    ".toc a",
    "nav a",
    r#"main a[href^="/manual/"]"#,
];

/// Anchor titles in the last-resort tier must be longer than this.
const LAST_RESORT_MIN_TITLE_CHARS: usize = 5;

static MAIN_LINKS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("main a[href]").expect("main links selector"));
static BODY_LINKS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body a[href]").expect("body links selector"));

// ---------------------------------------------------------------------------
// Discovery options
// ---------------------------------------------------------------------------

/// Configuration for chapter discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// CSS selector matching genuine table-of-contents anchors.
    pub toc_selector: String,
    /// Decorative prefix removed from anchor text.
    pub title_prefix: String,
    /// Path prefix chapter URLs must start with. Defaults to the root URL's path.
    pub namespace: Option<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            toc_selector: "a.toc__link".into(),
            title_prefix: "Open ".into(),
            namespace: None,
        }
    }
}

impl From<&RunConfig> for DiscoveryOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            toc_selector: config.toc_selector.clone(),
            title_prefix: config.title_prefix.clone(),
            namespace: config.namespace.clone(),
        }
    }
}

/// Which tier produced the chapter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryTier {
    /// The table-of-contents selector.
    Primary,
    /// One of the generic fallback selectors.
    Fallback,
    /// Any titled link in `<main>` or `<body>`.
    LastResort,
}

// ---------------------------------------------------------------------------
// Main entry points
// ---------------------------------------------------------------------------

/// Fetch the root page. Any failure is fatal to the run.
#[instrument(skip_all, fields(url = %root_url))]
pub async fn fetch_root<F: PageFetcher>(fetcher: &F, root_url: &Url) -> Result<String> {
    info!("fetching manual root page");

    let html = fetcher.fetch(root_url.as_str()).await.map_err(|e| {
        ManualSyncError::discovery(format!("could not fetch root page: {e}"))
    })?;

    debug!(bytes = html.len(), "root page fetched");
    Ok(html)
}

/// Extract chapter links from the root page HTML.
///
/// `root_url` is the URL the page was fetched from; relative hrefs resolve
/// against it and its path defines the default namespace. The result keeps
/// document order and contains each URL once.
#[instrument(skip_all, fields(root = %root_url))]
pub fn discover(
    root_html: &str,
    root_url: &Url,
    opts: &DiscoveryOptions,
) -> Result<Vec<ChapterRef>> {
    discover_with_tier(root_html, root_url, opts).map(|(chapters, _)| chapters)
}

/// Like [`discover`], also reporting which tier matched.
pub fn discover_with_tier(
    root_html: &str,
    root_url: &Url,
    opts: &DiscoveryOptions,
) -> Result<(Vec<ChapterRef>, DiscoveryTier)> {
    let doc = Html::parse_document(root_html);
    let namespace = Namespace::new(root_url, opts.namespace.as_deref());

    let toc_selector = Selector::parse(&opts.toc_selector).map_err(|e| {
        ManualSyncError::config(format!("invalid TOC selector '{}': {e}", opts.toc_selector))
    })?;

    let primary_rules = AnchorRules {
        root_url,
        title_prefix: &opts.title_prefix,
        namespace: Some(&namespace),
        min_title_chars: 0,
    };

    let mut primary = ChapterSet::default();
    for anchor in doc.select(&toc_selector) {
        if let Some(chapter) = anchors::to_chapter(anchor, &primary_rules) {
            primary.insert(chapter);
        }
    }

    if !primary.is_empty() {
        let chapters = primary.into_vec();
        info!(
            count = chapters.len(),
            namespace = namespace.prefix(),
            "chapters discovered from table of contents"
        );
        return Ok((chapters, DiscoveryTier::Primary));
    }

    warn!(
        selector = %opts.toc_selector,
        "no table-of-contents links found, trying fallback selectors"
    );

    let fallback_rules = AnchorRules {
        namespace: None,
        ..primary_rules
    };

    for raw in FALLBACK_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };

        let mut set = ChapterSet::default();
        for anchor in doc.select(&selector) {
            if let Some(chapter) = anchors::to_chapter(anchor, &fallback_rules) {
                set.insert(chapter);
            }
        }

        if !set.is_empty() {
            let chapters = set.into_vec();
            info!(selector = raw, count = chapters.len(), "chapters discovered via fallback");
            return Ok((chapters, DiscoveryTier::Fallback));
        }
        debug!(selector = raw, "fallback selector matched nothing");
    }

    let last_resort_rules = AnchorRules {
        min_title_chars: LAST_RESORT_MIN_TITLE_CHARS,
        ..fallback_rules
    };

    let region = if doc.select(&MAIN_LINKS_SEL).next().is_some() {
        &*MAIN_LINKS_SEL
    } else {
        &*BODY_LINKS_SEL
    };

    let mut set = ChapterSet::default();
    for anchor in doc.select(region) {
        if let Some(chapter) = anchors::to_chapter(anchor, &last_resort_rules) {
            set.insert(chapter);
        }
    }

    if set.is_empty() {
        return Err(ManualSyncError::discovery(
            "no chapter links found, the website structure may have changed",
        ));
    }

    let chapters = set.into_vec();
    warn!(count = chapters.len(), "chapters discovered from generic page links");
    Ok((chapters, DiscoveryTier::LastResort))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
