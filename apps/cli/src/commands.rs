//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use docsplit_artifacts::FsArtifactStore;
use docsplit_core::{Pipeline, ProgressReporter, RunConfig, RunReport, discover, partition};
use docsplit_crawler::{BrowserGate, FetchStep, HttpBrowser};
use docsplit_render::{MarkdownMerger, MarkdownRenderer};
use docsplit_shared::{
    AppConfig, CanonicalUrl, CrawlConfig, init_config, load_config, load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docsplit: one document per documentation section.
#[derive(Parser)]
#[command(
    name = "docsplit",
    version,
    about = "Crawl a documentation site and write one merged document per section.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.docsplit/docsplit.toml.
    #[arg(long, global = true, env = "DOCSPLIT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Arguments shared by every command that crawls.
#[derive(Args, Debug)]
pub(crate) struct CrawlArgs {
    /// Page the crawl starts from; always the first section.
    pub main_url: String,

    /// Regex a link must match to be followed (default: pages below MAIN_URL).
    pub url_pattern: Option<String>,

    /// Match URL_PATTERN as plain text rather than a regex.
    #[arg(long)]
    pub literal: bool,

    /// Selector of the region links are read from first.
    #[arg(long)]
    pub content_selector: Option<String>,

    /// Selector tried when the content region is missing.
    #[arg(long)]
    pub nav_selector: Option<String>,

    /// Emit one artifact per section instead of one for the whole site.
    #[arg(long)]
    pub split_sections: bool,

    /// Wait after scrolling each page, in milliseconds.
    #[arg(long)]
    pub settle_delay_ms: Option<u64>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Crawl, split and write artifacts.
    Run {
        #[command(flatten)]
        crawl: CrawlArgs,

        /// Output directory (defaults to `defaults.output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Crawl and print the discovered tree as JSON without rendering.
    Tree {
        #[command(flatten)]
        crawl: CrawlArgs,
    },

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

const LOG_TARGETS: &[&str] = &[
    "docsplit_cli",
    "docsplit_core",
    "docsplit_crawler",
    "docsplit_render",
    "docsplit_artifacts",
    "docsplit_shared",
];

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

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
    let config_path = cli.config;

    match cli.command {
        Command::Run { crawl, out } => {
            cmd_run(&resolve_config(config_path.as_deref())?, &crawl, out).await
        }
        Command::Tree { crawl } => cmd_tree(&resolve_config(config_path.as_deref())?, &crawl).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&resolve_config(config_path.as_deref())?).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Crawl settings: CLI flags over config file over defaults.
fn crawl_config(config: &AppConfig, args: &CrawlArgs) -> CrawlConfig {
    let mut crawl = CrawlConfig::from(config);
    if let Some(selector) = &args.content_selector {
        crawl.content_selector = selector.clone();
    }
    if let Some(selector) = &args.nav_selector {
        crawl.nav_selector = selector.clone();
    }
    if let Some(ms) = args.settle_delay_ms {
        crawl.settle_delay = Duration::from_millis(ms);
    }
    crawl
}

fn run_config(config: &AppConfig, args: &CrawlArgs) -> RunConfig {
    RunConfig {
        main_url: args.main_url.clone(),
        url_pattern: args.url_pattern.clone(),
        literal_pattern: args.literal,
        split_sections: args.split_sections || config.defaults.split_sections,
    }
}

fn fetch_step(crawl: &CrawlConfig, gate: BrowserGate) -> Result<FetchStep> {
    let browser = Arc::new(HttpBrowser::new()?);
    Ok(FetchStep::new(browser, gate, crawl))
}

async fn cmd_run(config: &AppConfig, args: &CrawlArgs, out: Option<PathBuf>) -> Result<()> {
    let crawl = crawl_config(config, args);
    let run = run_config(config, args);
    let out_dir = out.unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));

    let gate = BrowserGate::new();
    let fetch = fetch_step(&crawl, gate.clone())?;
    let render_selector = config
        .render
        .content_selector
        .clone()
        .unwrap_or_else(|| crawl.content_selector.clone());
    let renderer =
        MarkdownRenderer::new(gate, &config.render)?.with_content_selector(render_selector);
    let mut store = FsArtifactStore::new(&out_dir)?;

    info!(
        url = %run.main_url,
        split = run.split_sections,
        out = %out_dir.display(),
        "starting docsplit run"
    );

    let reporter = CliProgress::new();
    let outcome = Pipeline::new(&fetch, &renderer, &MarkdownMerger)
        .with_progress(&reporter)
        .run(&run, &mut store)
        .await;
    let report = reporter.clear_on_error(outcome)?;

    // Print summary
    println!();
    println!("  Run complete.");
    println!("  Run ID:    {}", report.run_id);
    println!("  Artifacts: {}", report.artifacts.len());
    for artifact in &report.artifacts {
        println!(
            "    {} ({} pages, {} bytes)",
            artifact.filename,
            artifact.pages.len(),
            artifact.size_bytes
        );
    }
    println!("  Pages:     {} rendered, {} failed", report.rendered_pages, report.failed_pages.len());
    if !report.skipped.is_empty() {
        println!("  Skipped:   {}", report.skipped.len());
        for section in &report.skipped {
            println!("    {} ({})", section.url, section.reason);
        }
    }
    println!("  Output:    {}", store.out_dir().display());
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_tree(config: &AppConfig, args: &CrawlArgs) -> Result<()> {
    let crawl = crawl_config(config, args);
    let run = run_config(config, args);
    let fetch = fetch_step(&crawl, BrowserGate::new())?;

    let reporter = CliProgress::new();
    let tree = discover(&fetch, &run, &reporter).await;
    reporter.spinner.finish_and_clear();
    let tree = tree?;

    let mut dump = serde_json::json!({ "tree": tree });
    if run.split_sections {
        dump["sections"] = serde_json::to_value(partition(&tree, true))?;
    }
    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    /// Stop the spinner before a failed run's error report is printed.
    fn clear_on_error<T>(&self, outcome: docsplit_shared::Result<T>) -> docsplit_shared::Result<T> {
        if outcome.is_err() {
            self.spinner.finish_and_clear();
        }
        outcome
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_discovered(&self, url: &CanonicalUrl, visited: usize) {
        self.spinner
            .set_message(format!("Discovering [{visited} pages] {url}"));
    }

    fn page_rendered(&self, url: &CanonicalUrl, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Rendering [{current}/{total}] {url}"));
    }

    fn artifact_written(&self, filename: &str) {
        self.spinner.println(format!("  wrote {filename}"));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}
