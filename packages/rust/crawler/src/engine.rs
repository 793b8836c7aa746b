//! Bounded-concurrency chapter pipeline.
//!
//! Every chapter runs as its own task in a [`JoinSet`]; a shared semaphore
//! caps how many fetches are in flight. Each task carries its discovery index
//! so results can be put back in order however they complete.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use manualsync_shared::{
    ChapterError, ChapterFailure, ChapterRef, ChapterResult, ManualSyncError, PageFetcher,
    RunConfig,
};
use manualsync_storage::{Ledger, content_hash};

use crate::filename::assign_filenames;

// ---------------------------------------------------------------------------
// Options and output
// ---------------------------------------------------------------------------

/// Pipeline tuning.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Maximum simultaneous chapter fetches.
    pub concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { concurrency: 5 }
    }
}

impl From<&RunConfig> for PipelineOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            concurrency: config.concurrency,
        }
    }
}

/// Everything the pipeline produced, both lists in discovery order.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub results: Vec<ChapterResult>,
    pub failures: Vec<ChapterFailure>,
}

/// Per-chapter completion hook.
pub trait ChapterProgress: Send + Sync {
    /// Called once per chapter as it finishes, in completion order.
    fn chapter_done(&self, chapter: &ChapterRef, succeeded: bool, completed: usize, total: usize);
}

/// Ignores progress.
pub struct NoProgress;

impl ChapterProgress for NoProgress {
    fn chapter_done(&self, _: &ChapterRef, _: bool, _: usize, _: usize) {}
}

// ---------------------------------------------------------------------------
// ChapterPipeline
// ---------------------------------------------------------------------------

/// Fetches, extracts and fingerprints chapters against a shared ledger.
pub struct ChapterPipeline<F> {
    fetcher: Arc<F>,
    ledger: Arc<Mutex<Ledger>>,
    options: PipelineOptions,
}

impl<F: PageFetcher> ChapterPipeline<F> {
    pub fn new(fetcher: Arc<F>, ledger: Ledger, options: PipelineOptions) -> Self {
        Self {
            fetcher,
            ledger: Arc::new(Mutex::new(ledger)),
            options,
        }
    }

    /// Process every chapter. Individual failures never stop the others.
    #[instrument(
        skip_all,
        fields(chapters = chapters.len(), concurrency = self.options.concurrency)
    )]
    pub async fn process(
        &self,
        chapters: &[ChapterRef],
        progress: &dyn ChapterProgress,
    ) -> PipelineOutput {
        let total = chapters.len();
        let filenames = assign_filenames(chapters);
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));

        info!("processing chapters");

        let mut tasks = JoinSet::new();
        for (index, (chapter, filename)) in chapters.iter().cloned().zip(filenames).enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let semaphore = Arc::clone(&semaphore);
            let ledger = Arc::clone(&self.ledger);
            let span = info_span!("chapter", index, url = %chapter.url);

            tasks.spawn(
                async move {
                    let outcome =
                        process_chapter(&*fetcher, &semaphore, &ledger, &chapter, index, filename)
                            .await;
                    (index, outcome)
                }
                .instrument(span),
            );
        }

        let mut slots: Vec<Option<Result<ChapterResult, ChapterError>>> =
            (0..total).map(|_| None).collect();
        let mut completed = 0;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    completed += 1;
                    progress.chapter_done(&chapters[index], outcome.is_ok(), completed, total);
                    slots[index] = Some(outcome);
                }
                Err(e) => {
                    // The slot stays empty and is reported below.
                    warn!(error = %e, "chapter task did not complete");
                }
            }
        }

        let mut output = PipelineOutput::default();
        for (index, (slot, chapter)) in slots.into_iter().zip(chapters).enumerate() {
            match slot {
                Some(Ok(result)) => output.results.push(result),
                Some(Err(error)) => {
                    warn!(url = %chapter.url, title = %chapter.title, %error, "chapter failed");
                    output.failures.push(ChapterFailure {
                        chapter: chapter.clone(),
                        index,
                        error,
                    });
                }
                None => {
                    completed += 1;
                    progress.chapter_done(chapter, false, completed, total);
                    output.failures.push(ChapterFailure {
                        chapter: chapter.clone(),
                        index,
                        error: ChapterError::Task("task panicked or was aborted".into()),
                    });
                }
            }
        }

        info!(
            succeeded = output.results.len(),
            failed = output.failures.len(),
            changed = output.results.iter().filter(|r| r.changed).count(),
            "chapter processing complete"
        );

        output
    }

    /// A copy of the ledger as it stands now.
    pub async fn ledger(&self) -> Ledger {
        self.ledger.lock().await.clone()
    }
}

/// Fetch → extract → hash → record, holding a permit throughout.
async fn process_chapter<F: PageFetcher>(
    fetcher: &F,
    semaphore: &Semaphore,
    ledger: &Mutex<Ledger>,
    chapter: &ChapterRef,
    index: usize,
    filename: String,
) -> Result<ChapterResult, ChapterError> {
    let Ok(_permit) = semaphore.acquire().await else {
        return Err(ChapterError::Task("concurrency limiter closed".into()));
    };

    debug!("fetching chapter");
    let html = fetcher.fetch(&chapter.url).await?;

    let markdown = manualsync_markdown::extract(&html).map_err(|e| match e {
        ManualSyncError::Extraction { message } => ChapterError::Extraction(message),
        other => ChapterError::Extraction(other.to_string()),
    })?;

    let digest = content_hash(&markdown);
    let changed = ledger.lock().await.record_and_compare(
        &chapter.url,
        &chapter.title,
        &filename,
        &digest,
        Utc::now(),
    );

    debug!(%filename, changed, bytes = markdown.len(), "chapter processed");

    Ok(ChapterResult {
        chapter: chapter.clone(),
        index,
        filename,
        markdown,
        content_hash: digest,
        changed,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
