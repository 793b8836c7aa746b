//! The chapter metadata ledger (`chapter_metadata.json`).

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use manualsync_shared::{ManualSyncError, Result};

use crate::write_atomic;

/// Last-seen state of one chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub title: String,
    pub filename: String,
    /// Content digest from the last run that saw this chapter.
    pub hash: String,
    /// RFC 3339 timestamp of the last time this entry was written.
    pub last_updated: String,
    pub url: String,
}

/// Chapter URL → last-seen state. Serialized as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    /// Load the ledger at `path`, starting empty if it is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(ledger)) => {
                info!(path = %path.display(), entries = ledger.len(), "loaded chapter metadata");
                ledger
            }
            Ok(None) => {
                debug!(path = %path.display(), "no chapter metadata yet, starting fresh");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable chapter metadata");
                Self::default()
            }
        }
    }

    /// Load the ledger, reporting problems. `Ok(None)` means the file does not exist.
    pub fn try_load(path: &Path) -> Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ManualSyncError::io(path, e)),
        };

        let ledger = serde_json::from_str(&content).map_err(|e| {
            ManualSyncError::metadata(format!("failed to parse {}: {e}", path.display()))
        })?;

        Ok(Some(ledger))
    }

    /// Persist the ledger as pretty-printed JSON, atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ManualSyncError::metadata(format!("failed to serialize ledger: {e}")))?;

        write_atomic(path, &json)?;
        info!(path = %path.display(), entries = self.len(), "saved chapter metadata");
        Ok(())
    }

    /// Digest recorded for `url` by a previous run.
    pub fn lookup(&self, url: &str) -> Option<&str> {
        self.entries.get(url).map(|entry| entry.hash.as_str())
    }

    pub fn get(&self, url: &str) -> Option<&LedgerEntry> {
        self.entries.get(url)
    }

    /// Overwrite the entry for `url` and report whether its digest changed.
    ///
    /// A URL with no previous entry counts as changed.
    pub fn record_and_compare(
        &mut self,
        url: &str,
        title: &str,
        filename: &str,
        digest: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let changed = self.lookup(url) != Some(digest);

        self.entries.insert(
            url.to_string(),
            LedgerEntry {
                title: title.to_string(),
                filename: filename.to_string(),
                hash: digest.to_string(),
                last_updated: now.to_rfc3339(),
                url: url.to_string(),
            },
        );

        changed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
