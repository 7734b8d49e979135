use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scholar_digest::aggregator::PaperAggregator;
use scholar_digest::config::{get_config, load_config, Config};
use scholar_digest::enrich::{Enricher, SemanticScholarClient};
use scholar_digest::parser::parse_alert;
use scholar_digest::store::{append_archive, load_store, save_store};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scholar Digest - Deduplicate scholarly alert emails and enrich the records with TLDR summaries
#[derive(Parser, Debug)]
#[command(name = "scholar-digest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deduplicate scholarly alert emails into a tabular store", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline: parse alerts, merge, enrich, persist
    #[command(alias = "r")]
    Run {
        /// Directory of saved alert email bodies (*.html, subject taken
        /// from the file stem)
        alerts_dir: PathBuf,

        /// Persisted store path (overrides configuration)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Archive log path (overrides configuration)
        #[arg(long)]
        archive: Option<PathBuf>,

        /// Skip the TLDR enrichment pass
        #[arg(long)]
        no_enrich: bool,
    },

    /// Parse a single alert email and print the records as JSON
    #[command(alias = "p")]
    Parse {
        /// Alert email body (HTML file)
        file: PathBuf,

        /// Alert subject (default: the file stem)
        #[arg(long)]
        email_title: Option<String>,
    },

    /// Run only the TLDR enrichment pass over the persisted store
    #[command(alias = "e")]
    Enrich {
        /// Persisted store path (overrides configuration)
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("scholar_digest={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => get_config(),
    };

    match cli.command {
        Some(Commands::Run {
            alerts_dir,
            store,
            archive,
            no_enrich,
        }) => {
            let store_path = store.unwrap_or_else(|| config.paths.store.clone());
            let archive_path = archive.unwrap_or_else(|| config.paths.archive.clone());
            run_pipeline(&config, &alerts_dir, &store_path, &archive_path, !no_enrich).await?;
        }

        Some(Commands::Parse { file, email_title }) => {
            let subject = email_title.unwrap_or_else(|| file_subject(&file));
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let papers = parse_alert(&subject, &html)?;
            println!("{}", serde_json::to_string_pretty(&papers)?);
        }

        Some(Commands::Enrich { store }) => {
            let store_path = store.unwrap_or_else(|| config.paths.store.clone());
            let mut aggregator = load_store(&store_path)?;
            enrich_records(&config, &mut aggregator).await?;
            save_store(&store_path, &aggregator)?;
        }

        None => {
            println!("No command provided. Use --help for usage information.");
            println!("Common commands:");
            println!("  run <alerts-dir>  - Parse alerts, merge, enrich, persist");
            println!("  parse <file>      - Parse one alert email to JSON");
            println!("  enrich            - Enrich the persisted store only");
        }
    }

    Ok(())
}

/// Parse every alert in `alerts_dir`, merge into the persisted store,
/// optionally enrich, and write the store and archive log back out.
async fn run_pipeline(
    config: &Config,
    alerts_dir: &Path,
    store_path: &Path,
    archive_path: &Path,
    enrich: bool,
) -> Result<()> {
    let mut aggregator = load_store(store_path)?;
    let persisted = aggregator.len();

    for path in alert_files(alerts_dir)? {
        let subject = file_subject(&path);
        let html = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let papers = parse_alert(&subject, &html)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let mut parsed = PaperAggregator::new();
        for paper in papers {
            parsed.add(paper);
        }
        // Persisted records were added first, so duplicates from the
        // alerts keep the stored review and enrichment state.
        aggregator.merge(parsed);
    }

    let dropped = aggregator.clean_missing_authors();
    tracing::info!(
        total = aggregator.len(),
        new = aggregator.len().saturating_sub(persisted),
        dropped,
        "merged alerts into store"
    );

    if enrich {
        enrich_records(config, &mut aggregator).await?;
    }

    save_store(store_path, &aggregator)?;
    append_archive(archive_path, aggregator.papers())?;
    Ok(())
}

/// One TLDR enrichment pass over the aggregator's records.
async fn enrich_records(config: &Config, aggregator: &mut PaperAggregator) -> Result<()> {
    let client = SemanticScholarClient::new(config.api_keys.semantic_scholar.clone())?;
    let enricher = Enricher::new(client, config.enrichment.clone());
    let summary = enricher.enrich(aggregator.papers_mut()).await;
    tracing::info!(
        selected = summary.selected,
        filled = summary.filled,
        "TLDR enrichment finished"
    );
    Ok(())
}

/// The `.html` files in a directory, in sorted order for deterministic
/// first-seen-wins merging.
fn alert_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read alerts directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("html"))
        .collect();
    files.sort();
    Ok(files)
}

/// The alert subject stands in for the email header when alerts are read
/// from saved files: it is the file name without the extension.
fn file_subject(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
