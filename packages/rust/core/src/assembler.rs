//! Output assembly: per-chapter files plus one combined document.
//!
//! Layout under the output directory:
//! ```text
//! <output>/
//! ├── chapters/<filename>.md
//! ├── <combined_file>
//! └── chapter_metadata.json   (written by the ledger)
//! ```

use std::path::PathBuf;

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument};

use manualsync_shared::{ChapterResult, ManualSyncError, Result, RunConfig};
use manualsync_storage::write_atomic;

/// Timestamp format of the combined document's "Generated on" line.
const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where outputs went (or would have gone, in dry-run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSummary {
    /// One path per successful chapter, in discovery order.
    pub chapter_files: Vec<PathBuf>,
    pub combined_path: PathBuf,
    /// Length of the combined document in characters, separators included.
    pub combined_chars: usize,
    /// False in dry-run.
    pub written: bool,
}

/// Heading used for a chapter in the combined document: the filename stem
/// with underscores shown as spaces.
pub fn chapter_heading(filename: &str) -> String {
    filename
        .strip_suffix(".md")
        .unwrap_or(filename)
        .replace('_', " ")
}

/// Build the combined Markdown document from results in discovery order.
pub fn combine(
    results: &[ChapterResult],
    manual_title: &str,
    generated_at: NaiveDateTime,
) -> String {
    let mut parts = Vec::with_capacity(3 + results.len() * 3);
    parts.push(format!("# {manual_title} - Complete\n"));
    parts.push(format!(
        "*Generated on {}*\n",
        generated_at.format(GENERATED_AT_FORMAT)
    ));
    parts.push("---\n".to_string());

    for result in results {
        parts.push(format!("\n# {}\n", chapter_heading(&result.filename)));
        parts.push(result.markdown.clone());
        parts.push("\n---\n".to_string());
    }

    parts.join("\n")
}

/// Write every chapter file and the combined document.
///
/// Under dry-run nothing touches the disk; the summary still lists the
/// would-be paths.
#[instrument(skip_all, fields(chapters = results.len(), dry_run = config.dry_run))]
pub fn write_outputs(
    results: &[ChapterResult],
    combined: &str,
    config: &RunConfig,
) -> Result<OutputSummary> {
    let chapter_files: Vec<PathBuf> = results
        .iter()
        .map(|r| config.chapters_dir.join(&r.filename))
        .collect();

    let summary = OutputSummary {
        chapter_files,
        combined_path: config.combined_path.clone(),
        combined_chars: combined.chars().count(),
        written: !config.dry_run,
    };

    if config.dry_run {
        for path in &summary.chapter_files {
            info!(path = %path.display(), "dry run, would write chapter");
        }
        info!(
            path = %summary.combined_path.display(),
            chars = summary.combined_chars,
            "dry run, would write combined document"
        );
        return Ok(summary);
    }

    std::fs::create_dir_all(&config.chapters_dir)
        .map_err(|e| ManualSyncError::io(&config.chapters_dir, e))?;

    for (result, path) in results.iter().zip(&summary.chapter_files) {
        write_atomic(path, &result.markdown)?;
        debug!(path = %path.display(), changed = result.changed, "wrote chapter");
    }

    if let Some(parent) = summary.combined_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| ManualSyncError::io(parent, e))?;
        }
    }
    write_atomic(&summary.combined_path, combined)?;

    info!(
        chapters = summary.chapter_files.len(),
        combined = %summary.combined_path.display(),
        chars = summary.combined_chars,
        "outputs written"
    );

    Ok(summary)
}
