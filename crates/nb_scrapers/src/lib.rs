pub mod cli;
pub mod extractor;
pub mod fetcher;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod scheduler;

pub use cli::{handle_command, HumanDuration, ScraperArgs, ScraperCommands};
pub use extractor::{Extraction, Extractor, Gap};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use manager::{ManagerOptions, RunSummary, ScraperManager, SourceOutcome, SourceReport};
pub use registry::Registry;
pub use scheduler::{Scheduler, TriggerClock};
