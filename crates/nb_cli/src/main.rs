use clap::Parser;
use nb_core::Result;
use nb_scrapers::extractor::DEFAULT_MAX_CANDIDATES;
use nb_scrapers::fetcher::{HttpFetcher, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use nb_scrapers::logging::init_logging;
use nb_scrapers::{handle_command, ManagerOptions, Registry, ScraperArgs, ScraperManager};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Collects Bolivian construction news into a database",
    long_about = None
)]
pub struct Cli {
    /// postgres://..., sqlite:<file> or memory
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:noticias.db", hide_env_values = true)]
    database_url: String,
    /// Log filter, overridden by RUST_LOG
    #[arg(long, env = "NB_LOG_LEVEL", default_value = "info")]
    log_level: String,
    /// JSON file with sources and relevance policy, replacing the built-in Bolivian registry
    #[arg(long, env = "NB_REGISTRY")]
    registry: Option<PathBuf>,
    /// Seconds to wait for a listing page
    #[arg(
        long,
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..=120)
    )]
    timeout: u64,
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
    /// Headline candidates kept per source and run
    #[arg(long, default_value_t = DEFAULT_MAX_CANDIDATES)]
    max_candidates: usize,
    /// Sources fetched at the same time
    #[arg(long, default_value_t = 4)]
    concurrency: usize,
    #[command(flatten)]
    scraper: ScraperArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the variables may come from the environment
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let registry = match &cli.registry {
        Some(path) => Registry::from_json_file(path)?,
        None => Registry::bolivia()?,
    };
    let names: Vec<&str> = registry.sources.iter().map(|s| s.name.as_str()).collect();
    info!("🦗 Sources loaded: {}", names.join(", "));

    let storage = nb_storage::create_storage(&cli.database_url).await?;
    let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(cli.timeout), &cli.user_agent)?);
    let manager = ScraperManager::new(storage, fetcher, registry).with_options(ManagerOptions {
        max_candidates: cli.max_candidates,
        concurrency: cli.concurrency,
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Shutdown requested, letting the current run finish");
            let _ = shutdown_tx.send(true);
        }
    });

    handle_command(cli.scraper, &manager, shutdown_rx).await
}
