//! End-to-end sync: root page → chapters → Markdown → files + ledger.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{info, instrument, warn};

use manualsync_crawler::{ChapterPipeline, ChapterProgress, PipelineOptions};
use manualsync_discovery::{DiscoveryOptions, discover, fetch_root};
use manualsync_shared::{
    ChapterFailure, ChapterRef, ChapterResult, ManualSyncError, PageFetcher, Result, RunConfig,
};
use manualsync_storage::Ledger;

use crate::assembler::{OutputSummary, combine, write_outputs};

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Successful chapters, in discovery order.
    pub results: Vec<ChapterResult>,
    /// Failed chapters, in discovery order.
    pub failures: Vec<ChapterFailure>,
    pub outputs: OutputSummary,
    /// False in dry-run or when saving failed.
    pub ledger_saved: bool,
    pub dry_run: bool,
    pub elapsed: Duration,
}

impl RunReport {
    /// Chapters whose content differs from the previous run.
    pub fn changed(&self) -> impl Iterator<Item = &ChapterResult> {
        self.results.iter().filter(|r| r.changed)
    }
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the chapter list is known.
    fn chapters_discovered(&self, total: usize);
    /// Called as each chapter finishes.
    fn chapter_done(&self, chapter: &ChapterRef, succeeded: bool, completed: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn chapters_discovered(&self, _total: usize) {}
    fn chapter_done(&self, _: &ChapterRef, _: bool, _: usize, _: usize) {}
    fn done(&self, _report: &RunReport) {}
}

/// Adapts a `ProgressReporter` to the pipeline's `ChapterProgress` hook.
struct PipelineProgress<'a> {
    inner: &'a dyn ProgressReporter,
}

impl ChapterProgress for PipelineProgress<'_> {
    fn chapter_done(&self, chapter: &ChapterRef, succeeded: bool, completed: usize, total: usize) {
        self.inner.chapter_done(chapter, succeeded, completed, total);
    }
}

/// Fetch the root page and return its chapters in discovery order.
#[instrument(skip_all, fields(base_url = %config.base_url))]
pub async fn list_chapters<F: PageFetcher>(
    config: &RunConfig,
    fetcher: &F,
) -> Result<Vec<ChapterRef>> {
    let root_url = config.root_url()?;
    let html = fetch_root(fetcher, &root_url).await?;
    discover(&html, &root_url, &DiscoveryOptions::from(config))
}

/// Run the full sync.
///
/// 1. Discover chapters from the root page
/// 2. Load the ledger
/// 3. Fetch and convert every chapter concurrently
/// 4. Write chapter files and the combined document
/// 5. Save the ledger
///
/// Fails when discovery fails or when no chapter succeeds; in the latter
/// case nothing is written.
#[instrument(skip_all, fields(base_url = %config.base_url, dry_run = config.dry_run))]
pub async fn sync<F: PageFetcher>(
    config: &RunConfig,
    fetcher: Arc<F>,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();

    info!(
        output = %config.output_dir.display(),
        concurrency = config.concurrency,
        "starting sync"
    );

    // --- Phase 1: Discovery ---
    progress.phase("Discovering chapters");
    let chapters = list_chapters(config, &*fetcher).await?;
    progress.chapters_discovered(chapters.len());
    info!(count = chapters.len(), "found chapters");

    // --- Phase 2: Chapters ---
    let ledger = Ledger::load(&config.metadata_path);
    let pipeline = ChapterPipeline::new(fetcher, ledger, PipelineOptions::from(config));

    progress.phase("Processing chapters");
    let output = pipeline
        .process(&chapters, &PipelineProgress { inner: progress })
        .await;

    if output.results.is_empty() {
        return Err(ManualSyncError::NoChaptersSucceeded {
            failed: output.failures.len(),
        });
    }

    // --- Phase 3: Output ---
    progress.phase("Writing output");
    let combined = combine(
        &output.results,
        &config.manual_title,
        Local::now().naive_local(),
    );
    let outputs = write_outputs(&output.results, &combined, config)?;

    // --- Phase 4: Ledger ---
    let ledger_saved = if config.dry_run {
        false
    } else {
        match pipeline.ledger().await.save(&config.metadata_path) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to save chapter metadata");
                false
            }
        }
    };

    let report = RunReport {
        results: output.results,
        failures: output.failures,
        outputs,
        ledger_saved,
        dry_run: config.dry_run,
        elapsed: start.elapsed(),
    };

    info!(
        succeeded = report.results.len(),
        failed = report.failures.len(),
        changed = report.changed().count(),
        elapsed_ms = report.elapsed.as_millis(),
        "sync complete"
    );

    progress.done(&report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use manualsync_crawler::HttpFetcher;
    use manualsync_shared::{AppConfig, ChapterError, FetchError, RunOverrides};
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ROOT: &str = r#"<html><body><main><ol>
        <li><a class="toc__link" href="/manual/welcome">Open Welcome</a></li>
        <li><a class="toc__link" href="/manual/hotkeys">Open Hotkeys</a></li>
        <li><a class="toc__link" href="/manual/extras">Open Extras</a></li>
    </ol></main></body></html>"#;

    fn chapter_page(body: &str) -> String {
        format!("<html><body><header>Site</header><main>{body}</main></body></html>")
    }

    async fn mount(server: &MockServer, route: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn manual_server() -> MockServer {
        let server = MockServer::start().await;
        mount(&server, "/manual", 200, ROOT).await;
        mount(
            &server,
            "/manual/welcome",
            200,
            &chapter_page("<h1>Welcome</h1><p>Hello there.</p>"),
        )
        .await;
        mount(
            &server,
            "/manual/hotkeys",
            200,
            &chapter_page("<h1>Hotkeys</h1><p>Super + Space.</p>"),
        )
        .await;
        mount(
            &server,
            "/manual/extras",
            200,
            &chapter_page("<p>Extras.</p>"),
        )
        .await;
        server
    }

    fn config(server: &MockServer, out: &Path, dry_run: bool) -> RunConfig {
        RunConfig::resolve(
            &AppConfig::default(),
            &RunOverrides {
                base_url: Some(format!("{}/manual", server.uri())),
                output_dir: Some(out.to_path_buf()),
                concurrency: Some(2),
                dry_run,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn fetcher() -> Arc<HttpFetcher> {
        Arc::new(HttpFetcher::new(5).unwrap())
    }

    #[tokio::test]
    async fn sync_writes_chapters_combined_file_and_ledger() {
        let server = manual_server().await;
        let dir = tempfile::tempdir().unwrap();
        let config = config(&server, dir.path(), false);

        let report = sync(&config, fetcher(), &SilentProgress).await.unwrap();

        assert!(report.failures.is_empty());
        assert!(report.ledger_saved);
        assert_eq!(report.changed().count(), 3);
        let names: Vec<_> = report.results.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, ["Welcome.md", "Hotkeys.md", "Extras.md"]);

        let welcome = std::fs::read_to_string(dir.path().join("chapters/Welcome.md")).unwrap();
        assert_eq!(welcome, "# Welcome\n\nHello there.");

        let combined = std::fs::read_to_string(&config.combined_path).unwrap();
        assert!(combined.starts_with("# The Omarchy Manual - Complete\n"));
        let welcome_at = combined.find("# Welcome\n").unwrap();
        let hotkeys_at = combined.find("# Hotkeys\n").unwrap();
        let extras_at = combined.find("# Extras\n").unwrap();
        assert!(welcome_at < hotkeys_at && hotkeys_at < extras_at);
        assert!(!combined.contains("Site"));

        let ledger = Ledger::load(&config.metadata_path);
        assert_eq!(ledger.len(), 3);
    }

    #[tokio::test]
    async fn second_run_reports_no_changes() {
        let server = manual_server().await;
        let dir = tempfile::tempdir().unwrap();
        let config = config(&server, dir.path(), false);

        sync(&config, fetcher(), &SilentProgress).await.unwrap();
        let report = sync(&config, fetcher(), &SilentProgress).await.unwrap();

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.changed().count(), 0);
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let server = manual_server().await;
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let config = config(&server, &out, true);

        let report = sync(&config, fetcher(), &SilentProgress).await.unwrap();

        assert!(report.dry_run);
        assert!(!report.ledger_saved);
        assert!(!report.outputs.written);
        assert_eq!(report.outputs.chapter_files.len(), 3);
        assert!(report.outputs.combined_chars > 0);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn interrupted_sync_leaves_no_files() {
        let server = MockServer::start().await;
        mount(&server, "/manual", 200, ROOT).await;
        Mock::given(method("GET"))
            .and(path_regex("^/manual/.+"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(chapter_page("<p>Slow.</p>"))
                    .set_delay(std::time::Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let config = config(&server, &out, false);

        let run = sync(&config, fetcher(), &SilentProgress);
        assert!(
            tokio::time::timeout(std::time::Duration::from_millis(500), run)
                .await
                .is_err()
        );

        assert!(!out.exists());
        assert!(!config.metadata_path.exists());
        assert!(!config.combined_path.exists());
    }

    #[tokio::test]
    async fn chapter_failures_do_not_fail_the_run() {
        let server = MockServer::start().await;
        mount(&server, "/manual", 200, ROOT).await;
        mount(&server, "/manual/welcome", 200, &chapter_page("<p>Hi.</p>")).await;
        mount(&server, "/manual/hotkeys", 404, "gone").await;
        mount(&server, "/manual/extras", 200, &chapter_page("<p>More.</p>")).await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(&server, dir.path(), false);
        let report = sync(&config, fetcher(), &SilentProgress).await.unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].chapter.title, "Hotkeys");
        assert!(matches!(
            report.failures[0].error,
            ChapterError::Fetch(FetchError::Status { status: 404, .. })
        ));
        assert!(!dir.path().join("chapters/Hotkeys.md").exists());

        let combined = std::fs::read_to_string(&config.combined_path).unwrap();
        assert!(!combined.contains("# Hotkeys"));
    }

    #[tokio::test]
    async fn all_chapters_failing_is_fatal_and_writes_nothing() {
        let server = MockServer::start().await;
        mount(&server, "/manual", 200, ROOT).await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let config = config(&server, &out, false);

        let err = sync(&config, fetcher(), &SilentProgress).await.unwrap_err();

        assert!(matches!(err, ManualSyncError::NoChaptersSucceeded { failed: 3 }));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn unreachable_root_is_a_discovery_error() {
        let server = MockServer::start().await;
        mount(&server, "/manual", 500, "boom").await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(&server, dir.path(), false);
        let err = sync(&config, fetcher(), &SilentProgress).await.unwrap_err();

        assert!(matches!(err, ManualSyncError::Discovery { .. }));
    }

    #[tokio::test]
    async fn root_without_chapters_is_a_discovery_error() {
        let server = MockServer::start().await;
        mount(&server, "/manual", 200, "<html><body><p>Maintenance</p></body></html>").await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(&server, dir.path(), false);
        let err = list_chapters(&config, &*fetcher()).await.unwrap_err();

        assert!(matches!(err, ManualSyncError::Discovery { .. }));
    }

    #[tokio::test]
    async fn list_chapters_returns_discovery_order() {
        let server = manual_server().await;
        let dir = tempfile::tempdir().unwrap();
        let config = config(&server, dir.path(), false);

        let chapters = list_chapters(&config, &*fetcher()).await.unwrap();
        let titles: Vec<_> = chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Welcome", "Hotkeys", "Extras"]);
        assert_eq!(chapters[0].url, format!("{}/manual/welcome", server.uri()));
    }

    #[tokio::test]
    async fn corrupt_ledger_is_replaced() {
        let server = manual_server().await;
        let dir = tempfile::tempdir().unwrap();
        let config = config(&server, dir.path(), false);
        std::fs::write(&config.metadata_path, "{ truncated").unwrap();

        let report = sync(&config, fetcher(), &SilentProgress).await.unwrap();

        assert_eq!(report.changed().count(), 3);
        assert!(report.ledger_saved);
        assert_eq!(Ledger::load(&config.metadata_path).len(), 3);
    }

    #[tokio::test]
    async fn ledger_save_failure_is_a_warning() {
        let server = manual_server().await;
        let dir = tempfile::tempdir().unwrap();
        let config = config(&server, dir.path(), false);
        // A directory where the ledger file should be.
        std::fs::create_dir_all(config.metadata_path.join("blocked")).unwrap();

        let report = sync(&config, fetcher(), &SilentProgress).await.unwrap();

        assert!(!report.ledger_saved);
        assert_eq!(report.results.len(), 3);
        assert!(config.combined_path.exists());
    }

    #[test]
    fn blank_line_runs_do_not_change_the_digest() {
        let spaced = manualsync_markdown::extract(
            "<html><body><main><p>a</p>\n\n\n\n<p>b</p></main></body></html>",
        )
        .unwrap();
        let tight =
            manualsync_markdown::extract("<html><body><main><p>a</p><p>b</p></main></body></html>")
                .unwrap();

        assert_eq!(
            manualsync_storage::content_hash(&spaced),
            manualsync_storage::content_hash(&tight)
        );
        assert_eq!(
            manualsync_storage::content_hash(&manualsync_markdown::normalize_markdown(
                "a\n\n\n\nb"
            )),
            manualsync_storage::content_hash("a\n\nb")
        );
    }
}
