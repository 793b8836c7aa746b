//! Application configuration for manualsync.
//!
//! User config lives at `~/.manualsync/manualsync.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ManualSyncError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "manualsync.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".manualsync";

// ---------------------------------------------------------------------------
// Config structs (matching manualsync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the manual lives.
    #[serde(default)]
    pub source: SourceConfig,

    /// Where results are written.
    #[serde(default)]
    pub output: OutputConfig,

    /// HTTP fetch behaviour.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Table-of-contents detection.
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Root URL of the manual; its table of contents lists every chapter.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Appended verbatim to `base_url` when fetching the root page.
    #[serde(default)]
    pub query_param: String,

    /// Title used in the combined document heading.
    #[serde(default = "default_manual_title")]
    pub manual_title: String,

    /// Path prefix chapter URLs must live under. Derived from `base_url` if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            query_param: String::new(),
            manual_title: default_manual_title(),
            namespace: None,
        }
    }
}

fn default_base_url() -> String {
    "https://learn.omacom.io/2/the-omarchy-manual".into()
}
fn default_manual_title() -> String {
    "The Omarchy Manual".into()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output root directory.
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Subdirectory (under `dir`) for per-chapter files.
    #[serde(default = "default_chapters_dir")]
    pub chapters_dir: String,

    /// Combined Markdown file name (under `dir`).
    #[serde(default = "default_combined_file")]
    pub combined_file: String,

    /// Metadata ledger file name (under `dir`).
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            chapters_dir: default_chapters_dir(),
            combined_file: default_combined_file(),
            metadata_file: default_metadata_file(),
        }
    }
}

fn default_output_dir() -> String {
    "omarchy_manual".into()
}
fn default_chapters_dir() -> String {
    "chapters".into()
}
fn default_combined_file() -> String {
    "omarchy_manual_complete.md".into()
}
fn default_metadata_file() -> String {
    "chapter_metadata.json".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum number of chapters fetched at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[discovery]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// CSS selector matching genuine chapter anchors.
    #[serde(default = "default_toc_selector")]
    pub toc_selector: String,

    /// Decorative prefix stripped from anchor text.
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            toc_selector: default_toc_selector(),
            title_prefix: default_title_prefix(),
        }
    }
}

fn default_toc_selector() -> String {
    "a.toc__link".into()
}
fn default_title_prefix() -> String {
    "Open ".into()
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// CLI-level overrides applied on top of [`AppConfig`].
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub base_url: Option<String>,
    pub query_param: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub combined_file: Option<String>,
    pub concurrency: Option<usize>,
    pub dry_run: bool,
}

/// Immutable settings for one run, built once and passed down by reference.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Manual root URL (without the query parameter).
    pub base_url: Url,
    /// Appended verbatim to `base_url` for the root page request.
    pub query_param: String,
    /// Combined document title.
    pub manual_title: String,
    /// Explicit namespace prefix, if configured.
    pub namespace: Option<String>,
    /// Output root directory.
    pub output_dir: PathBuf,
    /// Per-chapter output directory.
    pub chapters_dir: PathBuf,
    /// Combined Markdown file path.
    pub combined_path: PathBuf,
    /// Metadata ledger path.
    pub metadata_path: PathBuf,
    /// Chapter fetch concurrency ceiling (always >= 1).
    pub concurrency: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// TOC anchor selector.
    pub toc_selector: String,
    /// Decorative title prefix.
    pub title_prefix: String,
    /// Compute everything, write nothing.
    pub dry_run: bool,
}

impl RunConfig {
    /// Merge the config file with CLI overrides and validate the result.
    pub fn resolve(config: &AppConfig, overrides: &RunOverrides) -> Result<Self> {
        let base_str = overrides
            .base_url
            .as_deref()
            .unwrap_or(&config.source.base_url);
        let base_url = Url::parse(base_str).map_err(|e| {
            ManualSyncError::validation(format!("invalid base URL '{base_str}': {e}"))
        })?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(ManualSyncError::validation(format!(
                "base URL must be http or https, got '{}'",
                base_url.scheme()
            )));
        }

        let concurrency = overrides.concurrency.unwrap_or(config.fetch.concurrency);
        if concurrency == 0 {
            return Err(ManualSyncError::validation("concurrency must be at least 1"));
        }

        let output_dir = overrides
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.output.dir));
        let combined_file = overrides
            .combined_file
            .as_deref()
            .unwrap_or(&config.output.combined_file);

        Ok(Self {
            base_url,
            query_param: overrides
                .query_param
                .clone()
                .unwrap_or_else(|| config.source.query_param.clone()),
            manual_title: config.source.manual_title.clone(),
            namespace: config.source.namespace.clone(),
            chapters_dir: output_dir.join(&config.output.chapters_dir),
            combined_path: output_dir.join(combined_file),
            metadata_path: output_dir.join(&config.output.metadata_file),
            output_dir,
            concurrency,
            timeout_secs: config.fetch.timeout_secs,
            toc_selector: config.discovery.toc_selector.clone(),
            title_prefix: config.discovery.title_prefix.clone(),
            dry_run: overrides.dry_run,
        })
    }

    /// URL of the root page: `base_url` followed by the query parameter.
    pub fn root_url(&self) -> Result<Url> {
        if self.query_param.is_empty() {
            return Ok(self.base_url.clone());
        }
        let joined = format!("{}{}", self.base_url, self.query_param);
        Url::parse(&joined)
            .map_err(|e| ManualSyncError::config(format!("invalid root URL '{joined}': {e}")))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.manualsync/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ManualSyncError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.manualsync/manualsync.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ManualSyncError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ManualSyncError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ManualSyncError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ManualSyncError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ManualSyncError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
