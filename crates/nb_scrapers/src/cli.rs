use clap::{Args, Subcommand};
use nb_core::{Error, Result};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::watch;

use crate::manager::{ScraperManager, SourceOutcome};
use crate::scheduler::{Scheduler, TriggerClock, DEFAULT_TRIGGER, MAX_POLL};

/// A duration written as `1h15m30s`, `30m`, `90s` or bare seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;
        let overflow = || format!("Duration too long: {}", s);

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if !current_number.is_empty() {
                let num = current_number.parse::<u64>().map_err(|_| overflow())?;
                let unit = match c {
                    's' => 1,
                    'm' => 60,
                    'h' => 3600,
                    'd' => 86400,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_seconds = num
                    .checked_mul(unit)
                    .and_then(|secs| total_seconds.checked_add(secs))
                    .ok_or_else(overflow)?;
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A trailing number without unit counts as seconds
        if !current_number.is_empty() {
            let num = current_number.parse::<u64>().map_err(|_| overflow())?;
            total_seconds = total_seconds.checked_add(num).ok_or_else(overflow)?;
            has_unit = true;
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }
        if total_seconds == 0 {
            return Err("Duration must be positive".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScraperArgs {
    #[command(subcommand)]
    pub command: ScraperCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ScraperCommands {
    /// Run every day at a fixed time until interrupted
    Run {
        /// Local wall-clock time of the daily run (HH:MM)
        #[arg(long, default_value = DEFAULT_TRIGGER)]
        at: String,
        /// How often the clock is checked (e.g. 60s, 1m)
        #[arg(long, default_value = "60s")]
        poll: HumanDuration,
        /// Wait for the first trigger instead of running right away
        #[arg(long)]
        skip_initial_run: bool,
    },
    /// Scrape every source once and exit
    Once,
    /// List registered sources
    List,
    /// Show stored articles of a source
    Show {
        /// Source name as listed by `list`
        source: String,
    },
}

pub async fn handle_command(
    args: ScraperArgs,
    manager: &ScraperManager,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    match args.command {
        ScraperCommands::Run { at, poll, skip_initial_run } => {
            let clock = TriggerClock::parse(&at)?;
            if poll.0 > MAX_POLL {
                return Err(Error::Config(format!(
                    "poll interval of {}s is longer than a day",
                    poll.0.as_secs()
                )));
            }
            Scheduler::new(clock, poll.0)
                .run_on_start(!skip_initial_run)
                .run(manager, shutdown)
                .await;
        }
        ScraperCommands::Once => {
            let summary = manager.run_once(&shutdown).await?;
            for report in &summary.sources {
                match &report.outcome {
                    SourceOutcome::Extracted { candidates, accepted } => {
                        println!(
                            "📰 {}: {} relevant of {} candidates",
                            report.source, accepted, candidates
                        )
                    }
                    SourceOutcome::Failed(reason) => {
                        println!("⚠️ {}: {}", report.source, reason)
                    }
                    SourceOutcome::Skipped => println!("⏹️ {}: skipped", report.source),
                }
            }
            println!(
                "💾 {} new articles stored ({} relevant)",
                summary.stored, summary.attempted
            );
        }
        ScraperCommands::List => {
            let registry = manager.registry();
            println!("Sources (relevance policy v{}):", registry.relevance.version);
            for source in &registry.sources {
                println!("  - {} ({})", source.name, source.url);
            }
        }
        ScraperCommands::Show { source } => {
            let descriptor = manager
                .registry()
                .find(&source)
                .ok_or_else(|| Error::Config(format!("Unknown source: {}", source)))?;
            let articles = manager.storage().get_by_source(&descriptor.name).await?;
            println!("{} stored articles from {}", articles.len(), descriptor.name);
            for article in articles {
                let captured = article.captured_at.format("%Y-%m-%d %H:%M");
                println!("  [{}] {} - {}", captured, article.headline, article.link);
            }
        }
    }
    Ok(())
}
