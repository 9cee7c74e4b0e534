//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use ementario_core::pipeline::{ProgressReporter, RunOptions, SearchTarget};
use ementario_harvest::{CancellationToken, HtmlRecordSource};
use ementario_shared::{
    AppConfig, HarvestConfig, HarvestSummary, TargetStats, expand_tilde, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Ementário — harvest jurisprudence summaries into a sectioned document.
#[derive(Parser)]
#[command(
    name = "ementario",
    version,
    about = "Harvest labor-court jurisprudence summaries into a single sectioned document.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
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
    /// Harvest search targets into the output document.
    Harvest {
        /// Targets to traverse: trt3, trt3/1, csjt, pleno, especial.
        /// Defaults to all regional forums.
        #[arg(short, long)]
        target: Vec<String>,

        /// Output document path (defaults to the configured path).
        #[arg(short, long)]
        out: Option<String>,

        /// Document title heading.
        #[arg(long, default_value = "Ementário de Jurisprudência")]
        title: String,

        /// Override the configured page limit per target.
        #[arg(long)]
        max_pages: Option<u32>,

        /// Override the configured consecutive-failure limit.
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Override the configured search base URL.
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Classify an organizational label (debugging aid).
    Classify {
        /// Free-text "Órgão Judicante" label.
        text: String,
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

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "ementario=info",
        1 => "ementario=debug",
        _ => "ementario=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Harvest {
            target,
            out,
            title,
            max_pages,
            max_attempts,
            base_url,
        } => {
            cmd_harvest(
                &target,
                out.as_deref(),
                &title,
                max_pages,
                max_attempts,
                base_url.as_deref(),
            )
            .await
        }
        Command::Classify { text } => cmd_classify(&text),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

async fn cmd_harvest(
    targets: &[String],
    out: Option<&str>,
    title: &str,
    max_pages: Option<u32>,
    max_attempts: Option<u32>,
    base_url: Option<&str>,
) -> Result<()> {
    let config = load_config()?;

    let plan: Vec<SearchTarget> = if targets.is_empty() {
        ementario_core::default_plan()
    } else {
        ementario_core::targets_from_specs(targets)?
    };

    let mut harvest = HarvestConfig::from(&config);
    if let Some(pages) = max_pages {
        harvest.max_pages = pages;
    }
    if let Some(attempts) = max_attempts {
        harvest.max_attempts = attempts;
    }

    let output_path = match out {
        Some(p) => expand_tilde(p),
        None => expand_tilde(&config.defaults.output_path),
    };

    let search_url = base_url.unwrap_or(&config.search.base_url).to_string();

    let options = RunOptions {
        title: title.to_string(),
        output_path,
        harvest,
    };

    info!(
        targets = plan.len(),
        output = %options.output_path.display(),
        base_url = %search_url,
        "starting harvest"
    );

    let cancel = CancellationToken::new();
    install_ctrlc_handler(cancel.clone());

    let reporter = CliProgress::new();
    let harvest_config = options.harvest.clone();

    let summary = ementario_core::run_harvest(
        &options,
        &plan,
        |target| HtmlRecordSource::new(&search_url, &target.query, &harvest_config),
        cancel,
        &reporter,
    )
    .await?;

    print_summary(&summary, &options);
    Ok(())
}

/// First Ctrl-C requests a graceful stop; a second one aborts.
fn install_ctrlc_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nStopping after the current card... (Ctrl-C again to abort)");
            cancel.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });
}

fn print_summary(summary: &HarvestSummary, options: &RunOptions) {
    println!();
    println!("  Harvest complete!");
    println!("  Run:        {}", summary.run_id);
    println!("  Sections:   {}", summary.sections);
    println!("  Entries:    {}", summary.entries);
    println!("  Duplicates: {}", summary.duplicates_skipped);
    println!("  Failures:   {}", summary.failed_attempts);
    if summary.advance_failures > 0 {
        println!("  Targets cut short: {}", summary.advance_failures);
    }
    println!("  Document:   {}", options.output_path.display());
    println!(
        "  Summary:    {}",
        ementario_core::summary_path(&options.output_path).display()
    );
    println!("  Time:       {:.1}s", summary.elapsed_ms as f64 / 1000.0);
    println!();
}

fn cmd_classify(text: &str) -> Result<()> {
    let identifier = ementario_classify::classify(text);
    let label = ementario_classify::label_for(&identifier);
    println!("token: {identifier}");
    println!("label: {label}");
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config).map_err(|e| eyre!("config render: {e}"))?;
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
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn target_started(&self, label: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Harvesting [{current}/{total}] {label}"));
    }

    fn target_finished(&self, stats: &TargetStats) {
        self.spinner.set_message(format!(
            "{}: {} entries, {} pages",
            stats.target, stats.entries, stats.pages_visited
        ));
    }

    fn done(&self, _summary: &HarvestSummary) {
        self.spinner.finish_and_clear();
    }
}
