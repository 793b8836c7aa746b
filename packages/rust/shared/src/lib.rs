//! Shared types, error model, and configuration for manualsync.
//!
//! This crate is the foundation depended on by all other manualsync crates.
//! It provides:
//! - [`ManualSyncError`], the unified error type, plus [`FetchError`] / [`ChapterError`]
//! - Domain types ([`ChapterRef`], [`ChapterResult`], [`ChapterFailure`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)
//! - The [`PageFetcher`] capability

pub mod config;
pub mod error;
pub mod fetch;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DiscoveryConfig, FetchConfig, OutputConfig, RunConfig, RunOverrides, SourceConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{BODY_EXCERPT_CHARS, ChapterError, FetchError, ManualSyncError, Result};
pub use fetch::PageFetcher;
pub use types::{ChapterFailure, ChapterRef, ChapterResult};
