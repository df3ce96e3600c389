//! Fixed-cadence, single-flight runner for scheduled actions.
//!
//! ```text
//! run_immediately = true, interval = 900s
//!
//! t=0      t=900    t=1800   t=2700
//!  |--run--|  |--run-----|--run--|      overrun delays the next tick
//! ```
//!
//! Each tick awaits the action to completion before the next tick is taken,
//! so invocations never overlap. Failures are logged and counted, never
//! propagated.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::error::{BotError, Result};
use crate::metrics;
use crate::utils::unix_now;

/// Default number of consecutive not-found ticks before a distinct warning.
pub const DEFAULT_NOT_FOUND_THRESHOLD: u32 = 3;

/// A unit of work invoked once per scheduler tick.
pub trait ScheduledAction {
    /// Stable name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Identifier of the market the action is currently working on.
    fn market_in_play(&self) -> Option<&str> {
        None
    }

    /// Run one invocation.
    fn execute(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Counters shared between the scheduler and the status endpoints.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    ticks: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    not_found_streak: AtomicU64,
    last_tick_ok: AtomicBool,
    last_tick_at: AtomicI64,
    action: RwLock<Option<&'static str>>,
    last_market: RwLock<Option<String>>,
    last_error: RwLock<Option<String>>,
}

/// Point-in-time copy of [`SchedulerStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Name of the scheduled action.
    pub action: Option<&'static str>,
    /// Invocations started.
    pub ticks: u64,
    /// Invocations that returned `Ok`.
    pub successes: u64,
    /// Invocations that returned an error.
    pub failures: u64,
    /// Consecutive not-found failures up to the last tick.
    pub not_found_streak: u64,
    /// Whether the most recent invocation succeeded.
    pub last_tick_ok: bool,
    /// Unix seconds when the most recent invocation finished (0 if none).
    pub last_tick_at: i64,
    /// Market in play after the most recent invocation.
    pub last_market: Option<String>,
    /// Text of the most recent error.
    pub last_error: Option<String>,
}

fn write_lock<T>(lock: &RwLock<T>, value: T) {
    *lock.write().unwrap_or_else(|e| e.into_inner()) = value;
}

fn read_lock<T: Clone>(lock: &RwLock<T>) -> T {
    lock.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// True when a not-found streak of `streak` should raise the distinct
/// warning: at `threshold` and every `threshold` ticks after.
fn streak_warning_due(streak: u64, threshold: u64) -> bool {
    threshold > 0 && streak >= threshold && (streak - threshold) % threshold == 0
}

impl SchedulerStats {
    /// Ready once an invocation has succeeded and the last one did not fail.
    pub fn is_ready(&self) -> bool {
        self.successes.load(Ordering::Relaxed) > 0 && self.last_tick_ok.load(Ordering::Relaxed)
    }

    /// Consecutive not-found failures.
    pub fn not_found_streak(&self) -> u64 {
        self.not_found_streak.load(Ordering::Relaxed)
    }

    /// Copy every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            action: read_lock(&self.action),
            ticks: self.ticks.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            not_found_streak: self.not_found_streak(),
            last_tick_ok: self.last_tick_ok.load(Ordering::Relaxed),
            last_tick_at: self.last_tick_at.load(Ordering::Relaxed),
            last_market: read_lock(&self.last_market),
            last_error: read_lock(&self.last_error),
        }
    }

    fn record_start(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn record_success(&self, market: Option<&str>) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.not_found_streak.store(0, Ordering::Relaxed);
        self.last_tick_ok.store(true, Ordering::Relaxed);
        self.last_tick_at.store(unix_now(), Ordering::Relaxed);
        write_lock(&self.last_market, market.map(str::to_string));
    }

    /// Returns the not-found streak after this failure.
    fn record_failure(&self, err: &BotError, market: Option<&str>) -> u64 {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.last_tick_ok.store(false, Ordering::Relaxed);
        self.last_tick_at.store(unix_now(), Ordering::Relaxed);
        write_lock(&self.last_market, market.map(str::to_string));
        write_lock(&self.last_error, Some(err.to_string()));

        if err.is_not_found() {
            self.not_found_streak.fetch_add(1, Ordering::Relaxed) + 1
        } else {
            self.not_found_streak.store(0, Ordering::Relaxed);
            0
        }
    }
}

/// Invokes one action at a fixed cadence until shutdown.
#[derive(Debug, Clone)]
pub struct TaskScheduler {
    interval: Duration,
    run_immediately: bool,
    not_found_threshold: u32,
    stats: Arc<SchedulerStats>,
}

impl TaskScheduler {
    /// Scheduler ticking every `interval`, first at start if `run_immediately`.
    ///
    /// Intervals under one millisecond are raised to one millisecond.
    pub fn new(interval: Duration, run_immediately: bool) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            run_immediately,
            not_found_threshold: DEFAULT_NOT_FOUND_THRESHOLD,
            stats: Arc::new(SchedulerStats::default()),
        }
    }

    /// Consecutive not-found ticks before the distinct warning (minimum 1).
    pub fn with_not_found_threshold(mut self, threshold: u32) -> Self {
        self.not_found_threshold = threshold.max(1);
        self
    }

    /// Tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Shared counters, for the status server.
    pub fn stats_handle(&self) -> Arc<SchedulerStats> {
        Arc::clone(&self.stats)
    }

    /// Run `action` forever.
    pub async fn run<A: ScheduledAction>(&self, action: A) -> A {
        self.run_until(action, std::future::pending::<()>()).await
    }

    /// Run `action` until `shutdown` completes, then hand the action back.
    ///
    /// Shutdown is only observed between ticks; an invocation in flight
    /// always runs to completion.
    pub async fn run_until<A, F>(&self, mut action: A, shutdown: F) -> A
    where
        A: ScheduledAction,
        F: Future<Output = ()>,
    {
        let name = action.name();
        let first = if self.run_immediately {
            Instant::now()
        } else {
            Instant::now() + self.interval
        };
        let mut ticker = interval_at(first, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            action = name,
            interval_secs = self.interval.as_secs_f64(),
            run_immediately = self.run_immediately,
            "Scheduler started"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }
            // Errors are already logged and counted.
            let _ = self.invoke(&mut action).await;
        }

        info!(action = name, ticks = self.stats.snapshot().ticks, "Scheduler stopped");
        action
    }

    /// Run one invocation with logging, metrics, and stats bookkeeping.
    pub async fn invoke<A: ScheduledAction>(&self, action: &mut A) -> Result<()> {
        let name = action.name();
        write_lock(&self.stats.action, Some(name));
        let tick = self.stats.record_start();
        metrics::inc_scheduler_ticks(name);

        let started = std::time::Instant::now();
        let outcome = action.execute().await;
        metrics::record_action_duration(started, name);

        match &outcome {
            Ok(()) => {
                self.stats.record_success(action.market_in_play());
                debug!(
                    action = name,
                    tick,
                    market = action.market_in_play().unwrap_or("-"),
                    "Scheduled action completed"
                );
            }
            Err(e) => {
                let kind = e.kind();
                metrics::inc_scheduler_failures(name, kind);
                let streak = self.stats.record_failure(e, action.market_in_play());
                error!(
                    action = name,
                    tick,
                    kind,
                    market = action.market_in_play().unwrap_or("-"),
                    error = %e,
                    "Scheduled action failed"
                );

                if streak_warning_due(streak, u64::from(self.not_found_threshold)) {
                    warn!(
                        action = name,
                        streak,
                        "No market window found on {} consecutive ticks",
                        streak
                    );
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MarketError, NetworkError};
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    fn network_error() -> BotError {
        NetworkError::Status {
            url: "mock://listing".to_string(),
            status: 503,
            body: String::new(),
        }
        .into()
    }

    fn not_found() -> BotError {
        MarketError::NotFound {
            pattern: "btc-updown-15m-(\\d+)".to_string(),
        }
        .into()
    }

    /// Replays scripted outcomes (then succeeds) and records call offsets.
    struct Scripted {
        base: Instant,
        outcomes: VecDeque<Result<()>>,
        calls: Vec<Duration>,
        work: Duration,
        in_flight: bool,
        overlapped: bool,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<()>>) -> Self {
            Self {
                base: Instant::now(),
                outcomes: outcomes.into(),
                calls: Vec::new(),
                work: Duration::ZERO,
                in_flight: false,
                overlapped: false,
            }
        }

        fn with_work(mut self, work: Duration) -> Self {
            self.work = work;
            self
        }

        fn call_secs(&self) -> Vec<u64> {
            self.calls.iter().map(|d| d.as_secs()).collect()
        }
    }

    impl ScheduledAction for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn market_in_play(&self) -> Option<&str> {
            Some("btc-updown-15m-0")
        }

        async fn execute(&mut self) -> Result<()> {
            self.overlapped |= self.in_flight;
            self.in_flight = true;
            self.calls.push(self.base.elapsed());
            if !self.work.is_zero() {
                tokio::time::sleep(self.work).await;
            }
            self.in_flight = false;
            self.outcomes.pop_front().unwrap_or(Ok(()))
        }
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[tokio::test(start_paused = true)]
    async fn retries_on_next_tick_after_failures() {
        let scheduler = TaskScheduler::new(secs(900), true);
        let action = Scripted::new(vec![Err(network_error()), Err(network_error())]);

        let action = scheduler
            .run_until(action, tokio::time::sleep(secs(1801)))
            .await;

        assert_eq!(action.call_secs(), vec![0, 900, 1800]);
        let stats = scheduler.stats_handle().snapshot();
        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.failures, 2);
        assert_eq!(stats.successes, 1);
        assert!(stats.last_tick_ok);
        assert_eq!(stats.action, Some("scripted"));
        assert!(scheduler.stats_handle().is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_start_waits_one_interval() {
        let scheduler = TaskScheduler::new(secs(10), false);
        let action = scheduler
            .run_until(Scripted::new(vec![]), tokio::time::sleep(secs(25)))
            .await;
        assert_eq!(action.call_secs(), vec![10, 20]);
    }

    #[tokio::test(start_paused = true)]
    async fn overrun_delays_next_tick_without_overlap() {
        let scheduler = TaskScheduler::new(secs(900), true);
        let action = Scripted::new(vec![]).with_work(secs(1500));

        let action = scheduler
            .run_until(action, tokio::time::sleep(secs(3001)))
            .await;

        assert_eq!(action.call_secs(), vec![0, 1500, 3000]);
        assert!(!action.overlapped);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_waits_for_in_flight_invocation() {
        let scheduler = TaskScheduler::new(secs(900), true);
        let action = Scripted::new(vec![]).with_work(secs(100));

        let action = scheduler
            .run_until(action, tokio::time::sleep(secs(50)))
            .await;

        assert_eq!(action.call_secs(), vec![0]);
        assert!(!action.in_flight);
        assert_eq!(scheduler.stats_handle().snapshot().successes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_streak_resets_on_other_outcomes() {
        let scheduler = TaskScheduler::new(secs(1), true).with_not_found_threshold(3);
        let stats = scheduler.stats_handle();
        let mut action = Scripted::new(vec![
            Err(not_found()),
            Err(not_found()),
            Err(not_found()),
            Err(not_found()),
            Err(network_error()),
            Err(not_found()),
        ]);

        for expected in [1, 2, 3, 4, 0, 1] {
            assert!(scheduler.invoke(&mut action).await.is_err());
            assert_eq!(stats.not_found_streak(), expected);
        }

        assert!(scheduler.invoke(&mut action).await.is_ok());
        assert_eq!(stats.not_found_streak(), 0);
    }

    #[test]
    fn streak_warning_fires_at_multiples_of_threshold() {
        let due: Vec<u64> = (0..=9).filter(|s| streak_warning_due(*s, 3)).collect();
        assert_eq!(due, vec![3, 6, 9]);

        assert!(streak_warning_due(1, 1));
        assert!(streak_warning_due(2, 1));
        assert!(!streak_warning_due(0, 1));
        assert!(!streak_warning_due(5, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn readiness_tracks_last_outcome() {
        let scheduler = TaskScheduler::new(secs(1), true);
        let stats = scheduler.stats_handle();
        let mut action = Scripted::new(vec![Err(network_error()), Ok(()), Err(network_error())]);

        let _ = scheduler.invoke(&mut action).await;
        assert!(!stats.is_ready());
        let _ = scheduler.invoke(&mut action).await;
        assert!(stats.is_ready());
        let _ = scheduler.invoke(&mut action).await;
        assert!(!stats.is_ready());

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.last_market.as_deref(), Some("btc-updown-15m-0"));
        assert!(snapshot.last_error.unwrap().contains("503"));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let scheduler = TaskScheduler::new(Duration::ZERO, true).with_not_found_threshold(0);
        assert_eq!(scheduler.interval(), Duration::from_millis(1));
        assert_eq!(scheduler.not_found_threshold, 1);
    }
}
