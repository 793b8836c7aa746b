//! Chapter fetching and processing.
//!
//! This crate provides:
//! - [`HttpFetcher`]: the reqwest-backed [`PageFetcher`](manualsync_shared::PageFetcher)
//! - [`ChapterPipeline`]: concurrent fetch → extract → fingerprint over a chapter list
//! - [`sanitize_filename`] / [`assign_filenames`]: stable output names for chapters

pub mod engine;
pub mod fetch;
pub mod filename;

pub use engine::{ChapterPipeline, ChapterProgress, NoProgress, PipelineOptions, PipelineOutput};
pub use fetch::HttpFetcher;
pub use filename::{assign_filenames, sanitize_filename};
