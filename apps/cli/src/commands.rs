//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use labbook_core::assembler::AssembleResult;
use labbook_core::pipeline::{self, ProgressReporter};
use labbook_shared::{
    AppConfig, ArchivedPage, RunConfig, init_config, load_config, load_config_from,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// labbook — every Web Security Academy lab in one HTML page.
#[derive(Parser)]
#[command(
    name = "labbook",
    version,
    about = "Download the Web Security Academy labs and combine them into one HTML document.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.labbook/labbook.toml.
    #[arg(long, env = "LABBOOK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory that download dir, template and output are relative to.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Discover, download and assemble every lab.
    Run,

    /// Rebuild the combined document from the already downloaded labs.
    Assemble,

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
        0 => "labbook=info",
        1 => "labbook=debug",
        _ => "labbook=trace",
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
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => cmd_run(&config, cli.root).await,
        Command::Assemble => cmd_assemble(&config, cli.root),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config, cli.root),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config: &AppConfig, root: Option<PathBuf>) -> Result<()> {
    let run_config = RunConfig::resolve(config, root.as_deref())?;

    info!(
        index = %run_config.index_url,
        download_dir = %run_config.download_dir.display(),
        "starting run"
    );

    let reporter = CliProgress::new();
    let summary = pipeline::run(&run_config, &reporter).await?;

    println!();
    println!("  Labs found:    {}", summary.links_found);
    println!("  Downloaded:    {}", summary.archived.len());
    println!("  Failed:        {}", summary.failed.len());
    println!("  Sections:      {}", summary.assembled.fragment_count);
    println!("  Expert skipped: {}", summary.assembled.expert_skipped);
    println!("  Time:          {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_assemble(config: &AppConfig, root: Option<PathBuf>) -> Result<()> {
    let run_config = RunConfig::resolve(config, root.as_deref())?;

    let reporter = CliProgress::new();
    let result = pipeline::reassemble(&run_config, &reporter)?;

    println!("  Pages read: {}", result.page_count);
    println!("  Sections:   {}", result.fragment_count);

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig, root: Option<PathBuf>) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");

    let run_config = RunConfig::resolve(config, root.as_deref())?;
    println!("# resolved");
    println!("# index    = {}", run_config.index_url);
    println!("# labs     = {}", run_config.download_dir.display());
    println!("# template = {}", run_config.template_path.display());
    println!("# output   = {}", run_config.output_path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter: a spinner until the lab count is known, then a bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid spinner template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn links_found(&self, count: usize) {
        self.bar.println(format!("Found {count} labs"));
        self.bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                .expect("valid bar template")
                .progress_chars("=> "),
        );
        self.bar.set_length(count as u64);
        self.bar.set_position(0);
    }

    fn page_archived(&self, page: &ArchivedPage, current: usize, _total: usize) {
        self.bar.println(format!("  → {}", page.file_name()));
        self.bar.set_position(current as u64);
    }

    fn page_failed(&self, url: &str, reason: &str, current: usize, _total: usize) {
        self.bar.println(format!("Failed: {url} ({reason})"));
        self.bar.set_position(current as u64);
    }

    fn assembled(&self, result: &AssembleResult) {
        self.bar.finish_and_clear();
        println!("\nAll done. Open:\n{}", result.output_path.display());
    }
}
