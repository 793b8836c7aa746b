//! Chapter title → output filename.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use manualsync_shared::ChapterRef;

/// Maximum length of a filename stem, in characters.
const MAX_STEM_CHARS: usize = 100;

/// Stem used when a title sanitizes to nothing.
const EMPTY_STEM: &str = "chapter";

static UNSAFE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*&]"#).expect("unsafe chars regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Sanitize a title into a filename stem (no extension).
fn sanitize_stem(title: &str) -> String {
    let replaced = UNSAFE_CHARS_RE.replace_all(title, "_");
    let collapsed = WHITESPACE_RE.replace_all(&replaced, "_");
    let trimmed = collapsed.trim_matches(|c| c == '.' || c == '_');
    let stem: String = trimmed.chars().take(MAX_STEM_CHARS).collect();

    if stem.is_empty() {
        EMPTY_STEM.to_string()
    } else {
        stem
    }
}

/// Sanitize a title into a `.md` filename.
///
/// `Advanced: I/O & Networking` → `Advanced__I_O___Networking.md`
pub fn sanitize_filename(title: &str) -> String {
    format!("{}.md", sanitize_stem(title))
}

/// Assign a unique filename to every chapter, in order.
///
/// Later chapters whose names collide (case-insensitively) with an earlier
/// one get `_2`, `_3`, … appended to the stem.
pub fn assign_filenames(chapters: &[ChapterRef]) -> Vec<String> {
    let mut taken = HashSet::with_capacity(chapters.len());

    chapters
        .iter()
        .map(|chapter| {
            let stem = sanitize_stem(&chapter.title);
            let mut candidate = format!("{stem}.md");
            let mut suffix = 2;
            while !taken.insert(candidate.to_lowercase()) {
                candidate = format!("{stem}_{suffix}.md");
                suffix += 1;
            }
            candidate
        })
        .collect()
}
