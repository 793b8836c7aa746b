//! Post-conversion normalization for chapter Markdown.
//!
//! Each pass is a function `&str -> String` applied in sequence. The output
//! is what gets hashed, so passes must be deterministic and idempotent.

use std::sync::LazyLock;

use regex::Regex;

/// Normalize converted Markdown: collapse blank-line runs, then trim.
pub fn normalize_markdown(md: &str) -> String {
    let mut result = md.to_string();

    result = collapse_blank_lines(&result);
    result = result.trim().to_string();

    result
}

/// Collapse two or more consecutive blank (or whitespace-only) lines into one.
fn collapse_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n").into_owned()
}
