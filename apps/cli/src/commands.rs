//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use manualsync_core::{ProgressReporter, RunReport, list_chapters, sync};
use manualsync_crawler::HttpFetcher;
use manualsync_shared::{
    AppConfig, ChapterRef, RunConfig, RunOverrides, init_config, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// manualsync: keep a local Markdown copy of an online manual.
#[derive(Parser)]
#[command(
    name = "manualsync",
    version,
    about = "Scrape a multi-page online manual into per-chapter Markdown plus one combined document.",
    long_about = None,
    args_conflicts_with_subcommands = true,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.manualsync/manualsync.toml.
    #[arg(long, global = true, env = "MANUALSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub sync: SyncArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Flags for the default scrape run.
#[derive(Args, Debug, Default)]
pub(crate) struct SyncArgs {
    /// Manual root URL.
    #[arg(long)]
    pub url: Option<String>,

    /// Query string appended to the root URL, e.g. `?lang=en`.
    #[arg(long)]
    pub query_param: Option<String>,

    /// Output directory.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Combined Markdown file name.
    #[arg(long)]
    pub combined_output: Option<String>,

    /// Maximum simultaneous chapter downloads.
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Fetch and convert everything, write nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Only list the discovered chapter links.
    #[arg(long, alias = "list-links-only")]
    pub list_links: bool,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Subcommands. Without one, the manual is scraped.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "manualsync=info",
        1 => "manualsync=debug",
        _ => "manualsync=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()),
        },
        None => {
            let app_config = read_config(cli.config.as_deref())?;
            cmd_sync(&cli.sync, &app_config).await
        }
    }
}

fn read_config(path: Option<&std::path::Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

impl SyncArgs {
    fn overrides(&self) -> RunOverrides {
        RunOverrides {
            base_url: self.url.clone(),
            query_param: self.query_param.clone(),
            output_dir: self.output_dir.clone(),
            combined_file: self.combined_output.clone(),
            concurrency: self.max_concurrent,
            dry_run: self.dry_run,
        }
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_sync(args: &SyncArgs, app_config: &AppConfig) -> Result<()> {
    let config = RunConfig::resolve(app_config, &args.overrides())?;
    let fetcher = Arc::new(HttpFetcher::from_config(&config)?);

    if args.list_links {
        let chapters = tokio::select! {
            result = list_chapters(&config, &*fetcher) => result?,
            _ = tokio::signal::ctrl_c() => return Err(interrupted()),
        };
        print_chapter_list(&chapters);
        return Ok(());
    }

    info!(
        url = %config.base_url,
        output = %config.output_dir.display(),
        dry_run = config.dry_run,
        "scraping manual"
    );

    println!("Output directory: {}", config.output_dir.display());
    if config.dry_run {
        println!("Dry run: no files will be written");
    }

    let reporter = CliProgress::new();

    // Dropping the sync future aborts every in-flight chapter task.
    let report = tokio::select! {
        result = sync(&config, fetcher, &reporter) => {
            match result {
                Ok(report) => report,
                Err(e) => {
                    reporter.clear();
                    return Err(e.into());
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            reporter.clear();
            return Err(interrupted());
        }
    };

    print_report(&report);
    Ok(())
}

fn interrupted() -> color_eyre::Report {
    eprintln!();
    eprintln!("Interrupted. Files from earlier runs were left untouched.");
    eyre!("interrupted by user")
}

fn print_chapter_list(chapters: &[ChapterRef]) {
    println!();
    println!("  Found {} chapters:", chapters.len());
    for (i, chapter) in chapters.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, chapter.title);
        println!("       {}", chapter.url);
    }
    println!();
}

fn print_report(report: &RunReport) {
    println!();
    println!(
        "  Processed {} chapters ({} failed) in {:.1}s",
        report.results.len(),
        report.failures.len(),
        report.elapsed.as_secs_f64()
    );

    if !report.failures.is_empty() {
        println!();
        println!("  Failed chapters:");
        for failure in &report.failures {
            println!("    - {}: {}", failure.chapter.title, failure.error);
        }
    }

    println!();
    let changed: Vec<_> = report.changed().collect();
    if changed.is_empty() {
        println!("  No changes detected since last run");
    } else {
        println!("  Changed chapters ({}):", changed.len());
        for result in changed {
            println!("    - {}", result.filename);
        }
    }

    println!();
    let outputs = &report.outputs;
    if outputs.written {
        println!("  Chapters: {} files", outputs.chapter_files.len());
        println!("  Combined: {}", outputs.combined_path.display());
    } else {
        println!(
            "  Would write {} chapter files and {} ({} characters)",
            outputs.chapter_files.len(),
            outputs.combined_path.display(),
            outputs.combined_chars
        );
    }

    if !report.dry_run && !report.ledger_saved {
        println!("  Warning: chapter metadata could not be saved");
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter: a spinner during discovery, a bar over chapters.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }

    fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn chapters_discovered(&self, total: usize) {
        self.bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn chapter_done(&self, chapter: &ChapterRef, succeeded: bool, completed: usize, _total: usize) {
        self.bar.set_position(completed as u64);
        let mark = if succeeded { "done" } else { "failed" };
        self.bar.set_message(format!("{} ({mark})", chapter.title));
    }

    fn done(&self, _report: &RunReport) {
        self.bar.finish_and_clear();
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&std::path::Path>) -> Result<()> {
    let config = read_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_sync_with_defaults() {
        let cli = Cli::try_parse_from(["manualsync"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.sync.dry_run);
        assert!(cli.sync.overrides().base_url.is_none());
    }

    #[test]
    fn sync_flags_map_to_overrides() {
        let cli = Cli::try_parse_from([
            "manualsync",
            "--url",
            "https://example.org/manual",
            "--query-param",
            "?lang=en",
            "--output-dir",
            "out",
            "--combined-output",
            "all.md",
            "--max-concurrent",
            "2",
            "--dry-run",
            "-vv",
        ])
        .unwrap();

        let overrides = cli.sync.overrides();
        assert_eq!(overrides.base_url.as_deref(), Some("https://example.org/manual"));
        assert_eq!(overrides.query_param.as_deref(), Some("?lang=en"));
        assert_eq!(overrides.output_dir, Some(PathBuf::from("out")));
        assert_eq!(overrides.combined_file.as_deref(), Some("all.md"));
        assert_eq!(overrides.concurrency, Some(2));
        assert!(overrides.dry_run);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn list_links_only_alias() {
        let cli = Cli::try_parse_from(["manualsync", "--list-links-only"]).unwrap();
        assert!(cli.sync.list_links);
    }

    #[test]
    fn config_subcommand_parses() {
        let cli = Cli::try_parse_from(["manualsync", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Show
            })
        ));
    }

    #[test]
    fn sync_flags_conflict_with_subcommands() {
        assert!(Cli::try_parse_from(["manualsync", "--dry-run", "config", "init"]).is_err());
    }
}
