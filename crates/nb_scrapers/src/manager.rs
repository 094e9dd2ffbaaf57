use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use nb_core::{Article, ArticleStorage, Result, SourceDescriptor};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::extractor::{Extractor, DEFAULT_MAX_CANDIDATES};
use crate::fetcher::PageFetcher;
use crate::logging::Logger;
use crate::registry::Registry;

#[derive(Debug, Clone, Copy)]
pub struct ManagerOptions {
    /// Headline candidates kept per source and run
    pub max_candidates: usize,
    /// Sources fetched and parsed at the same time
    pub concurrency: usize,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            max_candidates: DEFAULT_MAX_CANDIDATES,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Extracted { candidates: usize, accepted: usize },
    Failed(String),
    /// Not started because shutdown was requested
    Skipped,
}

#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: String,
    pub outcome: SourceOutcome,
}

impl SourceReport {
    pub fn accepted(&self) -> usize {
        match self.outcome {
            SourceOutcome::Extracted { accepted, .. } => accepted,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub sources: Vec<SourceReport>,
    /// Accepted articles handed to storage
    pub attempted: usize,
    /// Rows actually inserted; links already stored are not counted
    pub stored: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn per_source_counts(&self) -> Vec<(&str, usize)> {
        self.sources.iter().map(|r| (r.source.as_str(), r.accepted())).collect()
    }

    pub fn failed_sources(&self) -> usize {
        self.sources
            .iter()
            .filter(|r| matches!(r.outcome, SourceOutcome::Failed(_)))
            .count()
    }
}

/// Articles from one source that passed the relevance policy.
#[derive(Debug)]
pub struct Harvest {
    pub candidates: usize,
    pub articles: Vec<Article>,
}

pub struct ScraperManager {
    storage: Arc<dyn ArticleStorage>,
    fetcher: Arc<dyn PageFetcher>,
    registry: Arc<Registry>,
    options: ManagerOptions,
}

impl ScraperManager {
    pub fn new(
        storage: Arc<dyn ArticleStorage>,
        fetcher: Arc<dyn PageFetcher>,
        registry: Registry,
    ) -> Self {
        Self {
            storage,
            fetcher,
            registry: Arc::new(registry),
            options: ManagerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ManagerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn storage(&self) -> &Arc<dyn ArticleStorage> {
        &self.storage
    }

    /// Fetch, extract and filter one source. Nothing is stored.
    pub async fn scrape_source(&self, source: &SourceDescriptor) -> Result<Harvest> {
        let markup = self.fetcher.fetch(&source.url).await?;
        let extractor = Extractor::new(source, self.options.max_candidates)?;
        let extraction = extractor.extract(&markup)?;

        let logger = Logger::new().with_prefix(format!("[{}]", source.name));
        for gap in &extraction.gaps {
            logger.debug(&format!("🕳️ Dropped candidate: {:?}", gap));
        }

        let policy = &self.registry.relevance;
        let (articles, rejected): (Vec<_>, Vec<_>) =
            extraction.articles.into_iter().partition(|a| policy.accepts(a));
        for article in &rejected {
            logger.debug(&format!("🚫 Not relevant: {}", article.headline));
        }

        Ok(Harvest {
            candidates: extraction.candidates,
            articles,
        })
    }

    async fn harvest(
        &self,
        source: &SourceDescriptor,
        shutdown: watch::Receiver<bool>,
    ) -> (SourceReport, Vec<Article>) {
        let logger = Logger::new().with_prefix(format!("[{}]", source.name));
        let report = |outcome| SourceReport {
            source: source.name.clone(),
            outcome,
        };
        let stopping = *shutdown.borrow();
        if stopping {
            logger.info("⏹️ Skipped, shutdown requested");
            return (report(SourceOutcome::Skipped), Vec::new());
        }

        match self.scrape_source(source).await {
            Ok(harvest) => {
                logger.info(&format!(
                    "📰 Extracted {} relevant articles from {} candidates",
                    harvest.articles.len(),
                    harvest.candidates
                ));
                let outcome = SourceOutcome::Extracted {
                    candidates: harvest.candidates,
                    accepted: harvest.articles.len(),
                };
                (report(outcome), harvest.articles)
            }
            Err(e) => {
                if e.is_source_level() {
                    logger.warn(&format!("⚠️ Source skipped for this run: {}", e));
                } else {
                    logger.error(&format!("❌ Source failed unexpectedly: {}", e));
                }
                (report(SourceOutcome::Failed(e.to_string())), Vec::new())
            }
        }
    }

    /// Visit every source once and persist the accepted articles in one batch.
    ///
    /// Source failures only zero that source's contribution. Storage failures
    /// are returned. Sources not started when `shutdown` flips are skipped;
    /// articles already gathered are still persisted.
    pub async fn run_once(&self, shutdown: &watch::Receiver<bool>) -> Result<RunSummary> {
        let started_at = Utc::now();
        info!(
            "🦗 Scraping {} sources (relevance policy v{})",
            self.registry.sources.len(),
            self.registry.relevance.version
        );

        self.storage.ensure_schema().await?;

        let results: Vec<(SourceReport, Vec<Article>)> = stream::iter(self.registry.sources.iter())
            .map(|source| self.harvest(source, shutdown.clone()))
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await;

        let mut sources = Vec::with_capacity(results.len());
        let mut batch = Vec::new();
        for (report, mut articles) in results {
            sources.push(report);
            batch.append(&mut articles);
        }

        let attempted = batch.len();
        let stored = if batch.is_empty() {
            0
        } else {
            self.storage.store_articles(&batch).await?
        };
        info!("💾 Stored {} new articles ({} already known)", stored, attempted - stored);

        Ok(RunSummary {
            sources,
            attempted,
            stored,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
