//! Archive Crawler CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use archive_crawler::{
    config::load_config,
    error::Result,
    models::{ContentType, QueryCategory},
    pipeline,
    storage::{LocalStore, QualityFilter, VideoFilter, VideoStore},
    utils::{format_date, format_duration},
};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

/// Archive Crawler - full-length concert and interview finder
#[derive(Parser, Debug)]
#[command(
    name = "archive-crawler",
    version,
    about = "Collects full concerts and interviews from YouTube"
)]
struct Cli {
    /// Path to storage directory containing config.toml and the archive
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the query plan and store the results
    Run {
        /// Only run queries of this kind
        #[arg(long, value_enum)]
        category: Option<Kind>,
    },

    /// Validate configuration file
    Validate,

    /// Show stored video counts and the last sync
    Info {
        /// Only count videos from this event year
        #[arg(long)]
        year: Option<i32>,

        /// Only count videos from this tour
        #[arg(long)]
        tour: Option<String>,

        /// Only count videos with this quality tag, or "official" / "complete"
        #[arg(long)]
        quality: Option<QualityFilter>,

        /// Also print the first N matching videos
        #[arg(long, default_value_t = 0)]
        list: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Kind {
    Concert,
    Interview,
}

impl From<Kind> for QueryCategory {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Concert => QueryCategory::Concert,
            Kind::Interview => QueryCategory::Interview,
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Cancel the token on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, stopping after the current step...");
            trigger.cancel();
        }
    });
    token
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = load_config(&config_path)?;
    log::info!("Loaded configuration from {}", config_path.display());

    let store = LocalStore::new(config.storage.resolve(&cli.storage_dir));

    match cli.command {
        Command::Run { category } => {
            config.validate()?;
            let cancel = cancel_on_ctrl_c();
            let report =
                pipeline::run_ingestion(&config, &store, category.map(Into::into), &cancel)
                    .await?;

            for q in &report.queries {
                match &q.error {
                    Some(err) => log::warn!("  {} [{}]: failed ({})", q.query, q.category, err),
                    None => log::info!(
                        "  {} [{}]: {} found, {} filtered, {} incomplete, {} kept",
                        q.query,
                        q.category,
                        q.candidates,
                        q.filtered_out,
                        q.incomplete,
                        q.kept
                    ),
                }
            }
            log::info!(
                "Added {} new videos ({} kept, {} refreshed)",
                report.added,
                report.kept,
                report.refreshed
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} queries, {} tour rules, credential {})",
                config.queries.len(),
                config.tours.len(),
                if config.youtube.has_credential() {
                    "set"
                } else {
                    "missing"
                }
            );
        }

        Command::Info {
            year,
            tour,
            quality,
            list,
        } => {
            log::info!("Storage directory: {}", store.root().display());

            let base = VideoFilter {
                year,
                tour_name: tour,
                quality,
                ..VideoFilter::default()
            };
            for content_type in [ContentType::Concert, ContentType::Interview] {
                let filter = VideoFilter {
                    content_type: Some(content_type),
                    ..base.clone()
                };
                log::info!("{}: {}", content_type, store.count(&filter).await?);
            }

            for row in store.list(&base, 0, list).await? {
                let video = &row.video;
                log::info!(
                    "  {} | {} | {} | {}",
                    format_date(video.date_event),
                    format_duration(video.duration_seconds),
                    video.title,
                    video.url
                );
            }

            let tours = store.tour_names().await?;
            if !tours.is_empty() {
                log::info!("Tours: {}", tours.join(", "));
            }

            match store.last_sync().await? {
                Some(sync) => log::info!(
                    "Last sync: {} ({} {:?}, {} added){}",
                    sync.finished_at,
                    sync.sync_type,
                    sync.status,
                    sync.videos_added,
                    sync.error_message
                        .map(|e| format!(" - {e}"))
                        .unwrap_or_default()
                ),
                None => log::info!("No sync recorded yet."),
            }
        }
    }

    Ok(())
}
