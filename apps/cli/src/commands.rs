//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use ratedeck_core::{GenerateOutcome, ProgressReporter, generate};
use ratedeck_session::{ChromiumSession, RenderSession};
use ratedeck_shared::{EntrySnapshot, GenerationRequest, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ratedeck — turn agency rosters into print-ready rate cards.
#[derive(Parser)]
#[command(
    name = "ratedeck",
    version,
    about = "Generate print-ready PDF rate cards with live profile snapshots.",
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
    /// Generate a rate-card PDF from a roster file.
    Generate {
        /// Roster JSON file: an array of entries (id, display_name,
        /// profile_urls, rate, rate_details, tags).
        roster: PathBuf,

        /// Client/company label shown in the document header.
        #[arg(short, long)]
        client: String,

        /// Output PDF path.
        #[arg(short, long, default_value = "ratecard.pdf")]
        out: PathBuf,

        /// External Handlebars template (overrides the configured path).
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Settle delay in ms after navigation (overrides config).
        #[arg(long)]
        settle_ms: Option<u64>,
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
        0 => "ratedeck=info",
        1 => "ratedeck=debug",
        _ => "ratedeck=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
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
        Command::Generate {
            roster,
            client,
            out,
            template,
            settle_ms,
        } => cmd_generate(roster, client, out, template, settle_ms).await,
        Command::Config { action } => match action {
            ConfigAction::Init => {
                let path = init_config()?;
                println!("Wrote default config to {}", path.display());
                Ok(())
            }
            ConfigAction::Show => {
                let config = load_config()?;
                println!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
        },
    }
}

async fn cmd_generate(
    roster: PathBuf,
    client: String,
    out: PathBuf,
    template: Option<PathBuf>,
    settle_ms: Option<u64>,
) -> Result<()> {
    let mut config = load_config()?;
    if let Some(path) = template {
        config.template.path = path.to_string_lossy().into_owned();
    }
    if let Some(ms) = settle_ms {
        config.capture.settle_delay_ms = ms;
    }

    let entries = load_roster(&roster)?;
    info!(entries = entries.len(), client = %client, "roster loaded");

    let request = GenerationRequest {
        client_label: client,
        entries,
    };

    let progress = BarProgress::new(request.entries.len());
    let session = ChromiumSession::new();

    // Stop the engine before surfacing any pipeline error.
    let result = generate(&session, &config, &request, &progress).await;
    session.stop().await.ok();
    let outcome = result?;

    std::fs::write(&out, &outcome.document.bytes)?;

    println!(
        "Wrote {} ({} KiB) — {} snapshots, {} placeholders, {:.1}s",
        out.display(),
        outcome.document.bytes.len() / 1024,
        outcome.capture.captured,
        outcome.capture.skipped + outcome.capture.failed,
        outcome.elapsed.as_secs_f64(),
    );

    Ok(())
}

/// Load and validate the roster JSON file.
fn load_roster(path: &PathBuf) -> Result<Vec<EntrySnapshot>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| eyre!("failed to read roster {}: {e}", path.display()))?;
    let entries: Vec<EntrySnapshot> = serde_json::from_str(&content)
        .map_err(|e| eyre!("invalid roster {}: {e}", path.display()))?;
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Progress bar
// ---------------------------------------------------------------------------

/// Indicatif-backed progress reporting for interactive runs.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {pos}/{len}")
                .expect("valid progress template")
                .progress_chars("=> "),
        );
        Self { bar }
    }
}

impl ProgressReporter for BarProgress {
    fn phase(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn entry_captured(&self, current: usize, _total: usize, display_name: &str) {
        self.bar.set_position(current as u64);
        self.bar.set_message(display_name.to_string());
    }

    fn done(&self, _outcome: &GenerateOutcome) {
        self.bar.finish_and_clear();
    }
}
