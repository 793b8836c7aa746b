//! Change tracking and persistence for manualsync.
//!
//! - [`content_hash`] fingerprints normalized chapter Markdown.
//! - [`Ledger`] remembers each chapter's last digest between runs.
//! - [`write_atomic`] is how every output file reaches disk.

mod ledger;

use std::io::Write;
use std::path::Path;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use manualsync_shared::{ManualSyncError, Result};

pub use ledger::{Ledger, LedgerEntry};

/// SHA-256 of the UTF-8 bytes of `content`, as lowercase hex.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Write `contents` to `path` via a temp file in the same directory.
///
/// Readers see either the previous file or the complete new one.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ManualSyncError::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|()| tmp.flush())
        .map_err(|e| ManualSyncError::io(dir, e))?;

    tmp.persist(path)
        .map_err(|e| ManualSyncError::io(path, e.error))?;

    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_lowercase_sha256_hex() {
        assert_eq!(
            content_hash("hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(content_hash("hello world"), content_hash("hello world"));
        assert_ne!(content_hash("hello world"), content_hash("hello world!"));
    }

    #[test]
    fn write_atomic_creates_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.md");

        write_atomic(&path, "first").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");

        write_atomic(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "out.md")
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn write_atomic_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.md");
        let err = write_atomic(&path, "x").unwrap_err();
        assert!(matches!(err, ManualSyncError::Io { .. }));
    }
}
