//! Fixed-interval cycle scheduler.

use std::future::Future;
use std::time::Duration;

use chrono::DateTime;
use chrono_tz::Tz;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use super::cycle::{Collector, CycleError, CycleOutcome};
use crate::data::MarketDataSource;

/// Per-outcome cycle counts for one scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub cycles: usize,
    pub skipped: usize,
    pub no_data: usize,
    pub persisted: usize,
    pub failed: usize,
    /// Tickers rejected for partial greeks, summed over persisted cycles.
    pub rejected: usize,
}

impl SchedulerStats {
    fn record(&mut self, outcome: &Result<CycleOutcome, CycleError>) {
        self.cycles += 1;
        match outcome {
            Ok(CycleOutcome::Skipped(_)) => self.skipped += 1,
            Ok(CycleOutcome::NoData(_)) => self.no_data += 1,
            Ok(CycleOutcome::Persisted(report)) => {
                self.persisted += 1;
                self.rejected += report.rejected;
            }
            Err(_) => self.failed += 1,
        }
    }
}

/// Runs a cycle immediately and then once per period until shut down.
///
/// Cycles never overlap. A cycle that outlasts the period delays the next
/// one instead of queueing a burst of catch-up cycles.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    period: Duration,
}

impl Scheduler {
    /// `period` must be non-zero.
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn from_minutes(minutes: u64) -> Self {
        Self::new(Duration::from_secs(minutes.saturating_mul(60)))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Loop until `shutdown` resolves. A failed cycle is logged and the
    /// loop carries on with the next tick.
    pub async fn run<S, C, F>(
        &self,
        collector: &Collector,
        source: &mut S,
        mut clock: C,
        shutdown: F,
    ) -> SchedulerStats
    where
        S: MarketDataSource + ?Sized,
        C: FnMut() -> DateTime<Tz>,
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut stats = SchedulerStats::default();
        info!(period_secs = self.period.as_secs(), "scheduler started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(?stats, "shutdown requested, scheduler stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let outcome = collector.run_cycle(source, clock()).await;
                    if let Err(e) = &outcome {
                        error!(error = %e, "collection cycle failed");
                    }
                    stats.record(&outcome);
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::SessionCalendar;
    use crate::collector::fake::FakeSource;
    use crate::config::ContractConfig;
    use crate::universe::UniverseSelector;
    use crate::writer::SnapshotWriter;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::path::Path;

    fn collector(dir: &Path) -> Collector {
        Collector::new(
            ContractConfig::default(),
            UniverseSelector::default(),
            SessionCalendar::default(),
            SnapshotWriter::new(dir.join("log.csv"), dir.join("latest.csv")),
        )
    }

    fn source() -> FakeSource {
        let strikes = [400, 500, 600].into_iter().map(Decimal::from).collect();
        FakeSource::new(dec!(500), strikes, FakeSource::expirations(2))
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_period() {
        let dir = tempfile::tempdir().unwrap();
        let collector = collector(dir.path());
        let mut source = source();
        let open = New_York.with_ymd_and_hms(2025, 6, 18, 10, 0, 0).unwrap();

        let stats = Scheduler::from_minutes(3)
            .run(
                &collector,
                &mut source,
                || open,
                tokio::time::sleep(Duration::from_secs(7 * 60)),
            )
            .await;

        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.persisted, 3);
        let log = std::fs::read_to_string(dir.path().join("log.csv")).unwrap();
        // header + 3 cycles × 3 strikes × 2 expirations × 2 rights
        assert_eq!(log.lines().count(), 1 + 3 * 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycles_do_not_stop_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let collector = collector(dir.path());
        let mut source = source();
        source.fail_connect = true;
        let open = New_York.with_ymd_and_hms(2025, 6, 18, 10, 0, 0).unwrap();

        let stats = Scheduler::from_minutes(3)
            .run(
                &collector,
                &mut source,
                || open,
                tokio::time::sleep(Duration::from_secs(10 * 60)),
            )
            .await;

        assert_eq!(stats.cycles, 4);
        assert_eq!(stats.failed, 4);
        assert!(!dir.path().join("log.csv").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failures_do_not_stop_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("log.csv");
        std::fs::create_dir(&log_path).unwrap();
        let collector = Collector::new(
            ContractConfig::default(),
            UniverseSelector::default(),
            SessionCalendar::default(),
            SnapshotWriter::new(log_path.clone(), dir.path().join("latest.csv")),
        );
        let mut source = source();
        let open = New_York.with_ymd_and_hms(2025, 6, 18, 10, 0, 0).unwrap();

        let stats = Scheduler::from_minutes(3)
            .run(
                &collector,
                &mut source,
                || open,
                tokio::time::sleep(Duration::from_secs(7 * 60)),
            )
            .await;

        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.failed, 3);
        assert_eq!(stats.persisted, 0);
        assert_eq!(source.calls.iter().filter(|c| **c == "connect").count(), 3);
        assert!(!dir.path().join("latest.csv").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_tickers_summed() {
        let dir = tempfile::tempdir().unwrap();
        let collector = collector(dir.path());
        let mut source = source();
        source.rejected.insert(1000);
        let open = New_York.with_ymd_and_hms(2025, 6, 18, 10, 0, 0).unwrap();

        let stats = Scheduler::from_minutes(3)
            .run(
                &collector,
                &mut source,
                || open,
                tokio::time::sleep(Duration::from_secs(4 * 60)),
            )
            .await;

        assert_eq!(stats.persisted, 2);
        assert_eq!(stats.rejected, 2);
    }

    #[test]
    fn test_huge_interval_saturates() {
        let scheduler = Scheduler::from_minutes(u64::MAX);
        assert_eq!(scheduler.period(), Duration::from_secs(u64::MAX));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_market_cycles_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let collector = collector(dir.path());
        let mut source = source();
        let saturday = New_York.with_ymd_and_hms(2025, 6, 21, 10, 0, 0).unwrap();

        let stats = Scheduler::from_minutes(3)
            .run(
                &collector,
                &mut source,
                || saturday,
                tokio::time::sleep(Duration::from_secs(4 * 60)),
            )
            .await;

        assert_eq!(
            stats,
            SchedulerStats {
                cycles: 2,
                skipped: 2,
                ..Default::default()
            }
        );
        assert!(source.calls.is_empty());
    }
}
