use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use safeguard::config::{Config, ProviderBackend};
use safeguard::db::IncidentStore;
use safeguard::language::LanguageIdentifier;
use safeguard::moderation::{decide, ChatMessage};
use safeguard::output::terminal;
use safeguard::pipeline::{batch, Moderator};
use safeguard::scoring::{Analyzer, Severity};
use safeguard::signals::huggingface::HuggingFaceScorer;
use safeguard::signals::{Lexicon, NeuralSignalAdapter, ScoreProvider};

/// Safeguard: multilingual toxicity and threat moderation.
///
/// Scores chat messages in English, Kannada, Hindi and code-mixed text,
/// and decides whether to record, delete, warn or alert.
#[derive(Parser)]
#[command(name = "safeguard", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the incident database
    Init,

    /// Analyze a single text and show the moderation decision
    Analyze {
        /// The text to analyze
        text: String,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,

        /// Platform hint recorded with the analysis
        #[arg(long, default_value = "cli")]
        platform: String,
    },

    /// Moderate a file of messages (one per line), recording incidents
    Batch {
        /// Path to the input file
        file: String,

        /// Number of messages to analyze in parallel (default: 8)
        #[arg(long, default_value = "8")]
        concurrency: u32,

        /// Platform name recorded with each incident
        #[arg(long, default_value = "cli")]
        platform: String,
    },

    /// List recorded incidents
    Incidents {
        /// Maximum number of incidents to show
        #[arg(long, default_value = "20")]
        limit: u32,

        /// Only show incidents at or above this severity
        #[arg(long)]
        min_severity: Option<Severity>,
    },

    /// Show system status (DB stats, incidents by severity, bot status)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("safeguard=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Safeguard database...");
            let config = Config::load()?;
            let store = init_database(&config)?;
            let table_count = store.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nSafeguard is ready. Try: cargo run -- analyze \"some text\"");
        }

        Commands::Analyze {
            text,
            json,
            platform,
        } => {
            let config = Config::load()?;
            let analyzer = build_analyzer(&config)?;
            let analysis = analyzer.analyze(&text, &platform).await?;
            let decision = decide(analysis.severity, analysis.is_threat, &config.thresholds);

            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                terminal::display_analysis(&text, &analysis, &decision);
            }
        }

        Commands::Batch {
            file,
            concurrency,
            platform,
        } => {
            let config = Config::load()?;
            let analyzer = Arc::new(build_analyzer(&config)?);
            let store = init_database(&config)?;

            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read input file {file}"))?;
            let messages: Vec<ChatMessage> = contents
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(i, line)| {
                    ChatMessage::new(
                        platform.as_str(),
                        format!("line-{}", i + 1),
                        "batch",
                        file.as_str(),
                        line,
                    )
                })
                .collect();

            println!(
                "Moderating {} messages ({} concurrent)...",
                messages.len(),
                concurrency
            );

            let moderator = Moderator::new(analyzer, config.thresholds)
                .with_store(Arc::clone(&store))
                .with_warning_ttl(config.warning_ttl);
            let outcomes =
                batch::moderate_batch(&moderator, &messages, concurrency as usize, true).await;

            terminal::display_batch_summary(&outcomes, &moderator.metrics().snapshot());
            moderator.report_status(&platform, "offline").await?;
        }

        Commands::Incidents {
            limit,
            min_severity,
        } => {
            let config = Config::load()?;
            let store = open_database(&config)?;
            let incidents = store.get_recent_incidents(limit, min_severity).await?;
            terminal::display_incidents(&incidents);
        }

        Commands::Status => {
            let config = Config::load()?;
            if !std::path::Path::new(&config.db_path).exists() {
                println!("Database: not initialized");
                println!("\nRun `safeguard init` to set up the database.");
                return Ok(());
            }
            let store = open_database(&config)?;
            safeguard::status::show(&store, &config.db_path).await?;
        }
    }

    Ok(())
}

/// Build the analyzer: lexicon (plus optional extension file) and the configured provider.
fn build_analyzer(config: &Config) -> Result<Analyzer> {
    let lexicon = match &config.lexicon_path {
        Some(path) => Lexicon::builtin_with_file(path)?,
        None => Lexicon::builtin(),
    };
    let provider = create_provider(config)?;
    let neural = NeuralSignalAdapter::new(provider, config.provider_timeout);
    Ok(Analyzer::new(LanguageIdentifier::default(), lexicon, neural))
}

/// Create the neural score provider based on the configured backend.
fn create_provider(config: &Config) -> Result<ScoreProvider> {
    config.require_provider()?;
    match config.provider_backend {
        ProviderBackend::HuggingFace => {
            info!(
                toxicity_model = %config.toxicity_model,
                sentiment_model = %config.sentiment_model,
                "Using Hugging Face inference provider"
            );
            let scorer = HuggingFaceScorer::new(config.huggingface_settings())?;
            Ok(ScoreProvider::Neural(Arc::new(scorer)))
        }
        ProviderBackend::None => {
            info!("No neural provider configured, using keyword signals only");
            Ok(ScoreProvider::Null)
        }
    }
}

#[cfg(feature = "sqlite")]
fn open_database(config: &Config) -> Result<Arc<dyn IncidentStore>> {
    safeguard::db::open_sqlite(&config.db_path)
}

#[cfg(feature = "sqlite")]
fn init_database(config: &Config) -> Result<Arc<dyn IncidentStore>> {
    safeguard::db::initialize_sqlite(&config.db_path)
}

#[cfg(not(feature = "sqlite"))]
fn open_database(_config: &Config) -> Result<Arc<dyn IncidentStore>> {
    anyhow::bail!(
        "No incident store compiled in.\n\
         Rebuild with: cargo build --features sqlite"
    )
}

#[cfg(not(feature = "sqlite"))]
fn init_database(config: &Config) -> Result<Arc<dyn IncidentStore>> {
    open_database(config)
}
