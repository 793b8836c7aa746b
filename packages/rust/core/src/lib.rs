//! Core orchestration for manualsync.
//!
//! Ties together discovery, the chapter pipeline, output assembly and the
//! ledger into one end-to-end [`sync`](pipeline::sync) run.

pub mod assembler;
pub mod pipeline;

pub use assembler::{OutputSummary, chapter_heading, combine, write_outputs};
pub use pipeline::{ProgressReporter, RunReport, SilentProgress, list_chapters, sync};
