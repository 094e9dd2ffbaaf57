//! Daily trigger loop around [`ScraperManager::run_once`].
//!
//! The loop wakes up every `poll` interval and asks [`TriggerClock`] whether
//! the trigger time was reached since the previous check. Runs are awaited
//! inline, so a trigger that comes due while a run is in progress fires at the
//! first check after it, and the per-day guard keeps it from firing twice.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use nb_core::{Error, Result};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::manager::ScraperManager;

pub const DEFAULT_TRIGGER: &str = "08:00";
/// Longest accepted poll interval. A longer one could step over a whole day.
pub const MAX_POLL: Duration = Duration::from_secs(24 * 3600);

/// Fires once per day when the wall clock passes a fixed minute.
///
/// Each check covers the span since the previous one, so polls longer than a
/// minute still see the trigger. The very first check only fires inside the
/// trigger minute itself.
#[derive(Debug, Clone)]
pub struct TriggerClock {
    trigger: NaiveTime,
    last_checked: Option<NaiveDateTime>,
    last_fired: Option<NaiveDate>,
}

impl TriggerClock {
    pub fn new(trigger: NaiveTime) -> Self {
        Self {
            trigger: trigger.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(trigger),
            last_checked: None,
            last_fired: None,
        }
    }

    /// Parses `HH:MM`.
    pub fn parse(trigger: &str) -> Result<Self> {
        NaiveTime::parse_from_str(trigger.trim(), "%H:%M")
            .map(Self::new)
            .map_err(|e| Error::Config(format!("invalid trigger time '{}': {}", trigger, e)))
    }

    pub fn trigger(&self) -> String {
        self.trigger.format("%H:%M").to_string()
    }

    /// Records a check without firing, e.g. right before a run at startup.
    pub fn observe(&mut self, now: NaiveDateTime) {
        self.last_checked = Some(now);
    }

    /// True the first time a check reaches the trigger time of a day.
    pub fn should_fire(&mut self, now: NaiveDateTime) -> bool {
        let due = now.date().and_time(self.trigger);
        let reached = match self.last_checked.replace(now) {
            Some(previous) => previous < due && due <= now,
            None => now.hour() == self.trigger.hour() && now.minute() == self.trigger.minute(),
        };
        if !reached || self.last_fired == Some(now.date()) {
            return false;
        }
        self.last_fired = Some(now.date());
        true
    }
}

pub struct Scheduler {
    clock: TriggerClock,
    poll: Duration,
    run_on_start: bool,
    now: fn() -> NaiveDateTime,
}

impl Scheduler {
    pub fn new(clock: TriggerClock, poll: Duration) -> Self {
        Self {
            clock,
            poll,
            run_on_start: true,
            now: || Local::now().naive_local(),
        }
    }

    pub fn run_on_start(mut self, run_on_start: bool) -> Self {
        self.run_on_start = run_on_start;
        self
    }

    pub fn with_clock(mut self, now: fn() -> NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    /// Loops until `shutdown` turns true. Returns how many runs were started.
    pub async fn run(
        mut self,
        manager: &ScraperManager,
        mut shutdown: watch::Receiver<bool>,
    ) -> usize {
        info!(
            "⏰ Scheduler started: daily run at {}, polling every {}s",
            self.clock.trigger(),
            self.poll.as_secs()
        );
        let mut runs = 0;

        if self.run_on_start {
            self.clock.observe((self.now)());
            runs += 1;
            execute(manager, &shutdown, runs).await;
        }

        let mut ticker = tokio::time::interval(self.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut signals_open = true;

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    if self.clock.should_fire((self.now)()) {
                        runs += 1;
                        execute(manager, &shutdown, runs).await;
                    }
                }
                changed = shutdown.changed(), if signals_open => {
                    if changed.is_err() {
                        debug!("Shutdown sender dropped; scheduler keeps running");
                        signals_open = false;
                    }
                }
            }
        }

        info!("👋 Scheduler stopped after {} runs", runs);
        runs
    }
}

async fn execute(manager: &ScraperManager, shutdown: &watch::Receiver<bool>, run: usize) {
    info!("▶️ Run {} started", run);
    match manager.run_once(shutdown).await {
        Ok(summary) => {
            let elapsed = summary.finished_at - summary.started_at;
            info!(
                "✅ Run {} finished in {}ms: {} new of {} relevant articles, {} sources failed",
                run,
                elapsed.num_milliseconds(),
                summary.stored,
                summary.attempted,
                summary.failed_sources()
            );
            for (source, accepted) in summary.per_source_counts() {
                debug!("  {}: {}", source, accepted);
            }
        }
        Err(e) => error!("❌ Run {} failed: {}", run, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::HumanDuration;
    use crate::fetcher::stub::StaticFetcher;
    use crate::registry::Registry;
    use nb_storage::MemoryStorage;
    use std::sync::Arc;

    fn at(date: (i32, u32, u32), time: (u32, u32, u32)) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_hms_opt(time.0, time.1, time.2)
            .unwrap()
    }

    fn manager() -> ScraperManager {
        ScraperManager::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(StaticFetcher::new()),
            Registry::bolivia().unwrap(),
        )
    }

    #[test]
    fn test_parse_trigger() {
        assert_eq!(TriggerClock::parse("08:00").unwrap().trigger(), "08:00");
        assert_eq!(TriggerClock::parse(" 7:05 ").unwrap().trigger(), "07:05");
        assert!(TriggerClock::parse("25:00").is_err());
        assert!(TriggerClock::parse("mañana").is_err());
    }

    #[test]
    fn test_fires_once_per_trigger_minute() {
        let mut clock = TriggerClock::parse("08:00").unwrap();
        assert!(!clock.should_fire(at((2024, 5, 1), (7, 59, 59))));
        assert!(clock.should_fire(at((2024, 5, 1), (8, 0, 0))));
        assert!(!clock.should_fire(at((2024, 5, 1), (8, 0, 30))));
        assert!(!clock.should_fire(at((2024, 5, 1), (8, 0, 59))));
        assert!(!clock.should_fire(at((2024, 5, 1), (8, 1, 0))));
        assert!(clock.should_fire(at((2024, 5, 2), (8, 0, 10))));
    }

    #[test]
    fn test_missed_minute_does_not_fire_late() {
        let mut clock = TriggerClock::parse("08:00").unwrap();
        assert!(!clock.should_fire(at((2024, 5, 1), (8, 2, 0))));
    }

    #[test]
    fn test_long_poll_still_fires_once() {
        let poll = "2m".parse::<HumanDuration>().unwrap().0;
        let mut clock = TriggerClock::parse("08:00").unwrap();
        let mut now = at((2024, 5, 1), (7, 55, 30));
        let mut fired = Vec::new();
        for _ in 0..10 {
            if clock.should_fire(now) {
                fired.push(now);
            }
            now += chrono::Duration::from_std(poll).unwrap();
        }
        assert_eq!(fired, vec![at((2024, 5, 1), (8, 1, 30))]);
    }

    #[test]
    fn test_hourly_poll_fires_every_day() {
        let mut clock = TriggerClock::parse("08:00").unwrap();
        let mut now = at((2024, 5, 1), (0, 17, 0));
        let mut fired = 0;
        for _ in 0..(24 * 3) {
            if clock.should_fire(now) {
                fired += 1;
            }
            now += chrono::Duration::hours(1);
        }
        assert_eq!(fired, 3);
    }

    #[test]
    fn test_observed_start_does_not_fire_twice() {
        let mut clock = TriggerClock::parse("08:00").unwrap();
        clock.observe(at((2024, 5, 1), (8, 0, 5)));
        assert!(!clock.should_fire(at((2024, 5, 1), (8, 0, 35))));
        assert!(!clock.should_fire(at((2024, 5, 1), (8, 1, 5))));
    }

    #[test]
    fn test_trigger_passed_during_run_fires_at_next_check() {
        let mut clock = TriggerClock::parse("08:00").unwrap();
        clock.observe(at((2024, 5, 1), (7, 59, 0)));
        assert!(clock.should_fire(at((2024, 5, 1), (8, 6, 0))));
    }

    #[tokio::test]
    async fn test_loop_fires_once_within_trigger_minute() {
        let clock = TriggerClock::parse("08:00").unwrap();
        let scheduler = Scheduler::new(clock, Duration::from_millis(10))
            .run_on_start(false)
            .with_clock(|| at((2024, 5, 1), (8, 0, 15)));
        let manager = manager();
        let (tx, rx) = watch::channel(false);

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            tx.send(true).unwrap();
            tx
        });

        let runs = scheduler.run(&manager, rx).await;
        let _tx = stopper.await.unwrap();
        assert_eq!(runs, 1);
    }

    #[tokio::test]
    async fn test_run_on_start_then_stop() {
        let clock = TriggerClock::parse("08:00").unwrap();
        let scheduler = Scheduler::new(clock, Duration::from_millis(10))
            .with_clock(|| at((2024, 5, 1), (12, 0, 0)));
        let manager = manager();
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let runs = scheduler.run(&manager, rx).await;
        assert_eq!(runs, 1);
    }
}
