use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::cycle::{CycleReport, ScanCycle};
use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Single-bit "cycle in progress" flag.
///
/// Owned by a scheduler and injected rather than global, so tests can run
/// independent schedulers side by side or make two of them share one gate.
#[derive(Clone, Debug, Default)]
pub struct CycleGate {
    running: Arc<AtomicBool>,
}

impl CycleGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip Idle -> Running. Returns `None` when a cycle already holds the gate.
    pub fn try_enter(&self) -> Option<GateGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GateGuard {
                running: Arc::clone(&self.running),
            })
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::Acquire) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }
}

/// Returns the gate to Idle when dropped, whether the cycle succeeded,
/// failed or panicked.
#[derive(Debug)]
pub struct GateGuard {
    running: Arc<AtomicBool>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// What a single tick did.
#[derive(Debug)]
pub enum TickOutcome {
    Started(JoinHandle<Result<CycleReport>>),
    Skipped,
}

/// Fires a [`ScanCycle`] on a fixed interval, never running two at once.
///
/// A tick that arrives while a cycle is in flight is dropped, not queued.
/// Cycle failures are logged and the scheduler returns to Idle, ready for the
/// next tick.
pub struct CycleScheduler {
    cycle: Arc<ScanCycle>,
    interval: Duration,
    gate: CycleGate,
}

impl fmt::Debug for CycleScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CycleScheduler")
            .field("cycle", &self.cycle)
            .field("interval", &self.interval)
            .field("state", &self.state())
            .finish()
    }
}

impl CycleScheduler {
    pub fn new(cycle: ScanCycle, interval: Duration) -> Self {
        Self::with_gate(Arc::new(cycle), interval, CycleGate::new())
    }

    pub fn with_gate(cycle: Arc<ScanCycle>, interval: Duration, gate: CycleGate) -> Self {
        Self {
            cycle,
            interval,
            gate,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.gate.state()
    }

    /// Handle one tick: start a cycle if Idle, otherwise skip.
    pub fn fire(&self) -> TickOutcome {
        let Some(guard) = self.gate.try_enter() else {
            info!(target: "transfer::scheduler", "previous cycle still running; skipping tick");
            return TickOutcome::Skipped;
        };

        let cycle = Arc::clone(&self.cycle);
        TickOutcome::Started(tokio::spawn(async move {
            let _guard = guard;
            let outcome = cycle.run().await;
            if let Err(err) = &outcome {
                error!(target: "transfer::scheduler", error = %err, "cycle failed; retrying on next tick");
            }
            outcome
        }))
    }

    /// Tick every `interval` until `shutdown` fires. The first tick lands one
    /// interval after start. An in-flight cycle is awaited before returning.
    pub async fn run(self, shutdown: CancellationToken) {
        let period = self.interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(target: "transfer::scheduler", interval_ms = period.as_millis() as u64, "scheduler started");

        let mut in_flight: Option<JoinHandle<Result<CycleReport>>> = None;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let TickOutcome::Started(handle) = self.fire() {
                        in_flight = Some(handle);
                    }
                }
            }
        }

        if let Some(handle) = in_flight {
            if !handle.is_finished() {
                info!(target: "transfer::scheduler", "waiting for in-flight cycle before stopping");
            }
            if let Err(err) = handle.await {
                warn!(target: "transfer::scheduler", error = %err, "cycle task failed");
            }
        }
        info!(target: "transfer::scheduler", "scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::error::{MoveError, TransferError};
    use crate::transfer::cycle::{CycleSettings, Inbox};
    use crate::transfer::mover::{Mover, WorkItem};

    /// Yields one item per listing and counts how often it was asked.
    #[derive(Default)]
    struct SingleFileInbox {
        listings: AtomicUsize,
    }

    #[async_trait]
    impl Inbox for SingleFileInbox {
        fn location(&self) -> String {
            "memory".into()
        }

        async fn list(&self) -> Result<Vec<WorkItem>> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            Ok(vec![WorkItem::new("a.csv")])
        }
    }

    struct MissingInbox;

    #[async_trait]
    impl Inbox for MissingInbox {
        fn location(&self) -> String {
            "/nowhere".into()
        }

        async fn list(&self) -> Result<Vec<WorkItem>> {
            Err(TransferError::DirectoryMissing {
                path: "/nowhere".into(),
            })
        }
    }

    /// Blocks every move until released by the test.
    #[derive(Default)]
    struct GatedMover {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Mover for GatedMover {
        async fn transfer(&self, _item: &WorkItem) -> std::result::Result<(), MoveError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    /// Sleeps for a fixed time and tracks overlapping moves.
    struct SlowMover {
        delay: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        done: AtomicUsize,
    }

    impl SlowMover {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                done: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Mover for SlowMover {
        async fn transfer(&self, _item: &WorkItem) -> std::result::Result<(), MoveError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.done.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct PanickingMover;

    #[async_trait]
    impl Mover for PanickingMover {
        async fn transfer(&self, _item: &WorkItem) -> std::result::Result<(), MoveError> {
            panic!("disk went away");
        }
    }

    fn cycle(inbox: Arc<dyn Inbox>, mover: Arc<dyn Mover>) -> Arc<ScanCycle> {
        Arc::new(ScanCycle::new(inbox, mover, CycleSettings::default()))
    }

    #[tokio::test]
    async fn tick_while_running_is_skipped() {
        let mover = Arc::new(GatedMover::default());
        let scheduler = CycleScheduler::with_gate(
            cycle(Arc::new(SingleFileInbox::default()), mover.clone()),
            Duration::from_secs(5),
            CycleGate::new(),
        );

        let TickOutcome::Started(first) = scheduler.fire() else {
            panic!("idle scheduler must start a cycle");
        };
        mover.entered.notified().await;
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert!(matches!(scheduler.fire(), TickOutcome::Skipped));

        mover.release.notify_one();
        let report = first.await.expect("cycle task").expect("cycle succeeds");
        assert_eq!(report.moved, 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        let TickOutcome::Started(second) = scheduler.fire() else {
            panic!("scheduler must accept ticks again after the cycle");
        };
        mover.entered.notified().await;
        mover.release.notify_one();
        second.await.expect("cycle task").expect("cycle succeeds");
    }

    #[tokio::test]
    async fn failed_cycle_returns_scheduler_to_idle() {
        let scheduler = CycleScheduler::new(
            ScanCycle::new(
                Arc::new(MissingInbox),
                Arc::new(GatedMover::default()),
                CycleSettings::default(),
            ),
            Duration::from_secs(5),
        );

        let TickOutcome::Started(handle) = scheduler.fire() else {
            panic!("idle scheduler must start a cycle");
        };
        let err = handle.await.expect("cycle task").expect_err("inbox missing");
        assert!(matches!(err, TransferError::DirectoryMissing { .. }));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(matches!(scheduler.fire(), TickOutcome::Started(_)));
    }

    #[tokio::test]
    async fn panicking_mover_still_returns_scheduler_to_idle() {
        let scheduler = CycleScheduler::with_gate(
            cycle(Arc::new(SingleFileInbox::default()), Arc::new(PanickingMover)),
            Duration::from_secs(5),
            CycleGate::new(),
        );

        let TickOutcome::Started(handle) = scheduler.fire() else {
            panic!("idle scheduler must start a cycle");
        };
        let report = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("cycle finishes")
            .expect("cycle task")
            .expect("cycle completes with a failed item");

        assert_eq!(report.moved, 0);
        assert_eq!(report.failed, 1);
        assert!(report.failures[0].error.contains("disk went away"));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(matches!(scheduler.fire(), TickOutcome::Started(_)));
    }

    #[tokio::test]
    async fn schedulers_sharing_a_gate_exclude_each_other() {
        let gate = CycleGate::new();
        let mover = Arc::new(GatedMover::default());
        let inbox: Arc<dyn Inbox> = Arc::new(SingleFileInbox::default());
        let a = CycleScheduler::with_gate(cycle(Arc::clone(&inbox), mover.clone()), Duration::from_secs(5), gate.clone());
        let b = CycleScheduler::with_gate(cycle(inbox, mover.clone()), Duration::from_secs(5), gate.clone());

        let TickOutcome::Started(handle) = a.fire() else {
            panic!("first scheduler starts");
        };
        mover.entered.notified().await;
        assert!(matches!(b.fire(), TickOutcome::Skipped));

        mover.release.notify_one();
        handle.await.expect("cycle task").expect("cycle succeeds");
        assert_eq!(gate.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn independent_schedulers_do_not_share_state() {
        let mover = Arc::new(GatedMover::default());
        let a = CycleScheduler::new(
            ScanCycle::new(Arc::new(SingleFileInbox::default()), mover.clone(), CycleSettings::default()),
            Duration::from_secs(5),
        );
        let b = CycleScheduler::new(
            ScanCycle::new(Arc::new(MissingInbox), mover.clone(), CycleSettings::default()),
            Duration::from_secs(5),
        );

        let TickOutcome::Started(handle) = a.fire() else {
            panic!("a starts");
        };
        mover.entered.notified().await;
        assert_eq!(b.state(), SchedulerState::Idle);
        let TickOutcome::Started(other) = b.fire() else {
            panic!("b has its own gate");
        };
        assert!(other.await.expect("cycle task").is_err());

        mover.release.notify_one();
        handle.await.expect("cycle task").expect("cycle succeeds");
    }

    #[tokio::test(start_paused = true)]
    async fn run_ticks_on_the_interval_until_shutdown() {
        let inbox = Arc::new(SingleFileInbox::default());
        let scheduler = CycleScheduler::new(
            ScanCycle::new(inbox.clone(), Arc::new(SlowMover::new(Duration::ZERO)), CycleSettings::default()),
            Duration::from_millis(20),
        );
        let shutdown = CancellationToken::new();
        let runner = tokio::spawn(scheduler.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(inbox.listings.load(Ordering::SeqCst), 0, "first tick waits one interval");

        tokio::time::sleep(Duration::from_millis(95)).await;
        shutdown.cancel();
        runner.await.expect("scheduler task");

        let listings = inbox.listings.load(Ordering::SeqCst);
        assert!((4..=6).contains(&listings), "unexpected cycle count {listings}");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_cycles_never_overlap() {
        let inbox = Arc::new(SingleFileInbox::default());
        let mover = Arc::new(SlowMover::new(Duration::from_millis(50)));
        let scheduler = CycleScheduler::new(
            ScanCycle::new(inbox.clone(), mover.clone(), CycleSettings::default()),
            Duration::from_millis(20),
        );
        let shutdown = CancellationToken::new();
        let runner = tokio::spawn(scheduler.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_millis(300)).await;
        shutdown.cancel();
        runner.await.expect("scheduler task");

        assert_eq!(mover.peak.load(Ordering::SeqCst), 1);
        let cycles = inbox.listings.load(Ordering::SeqCst);
        assert!(cycles >= 2, "cycles should keep firing, got {cycles}");
        assert!(cycles <= 6, "overlapping ticks must be dropped, got {cycles}");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_waits_for_the_in_flight_cycle() {
        let mover = Arc::new(SlowMover::new(Duration::from_millis(100)));
        let scheduler = CycleScheduler::new(
            ScanCycle::new(Arc::new(SingleFileInbox::default()), mover.clone(), CycleSettings::default()),
            Duration::from_millis(10),
        );
        let shutdown = CancellationToken::new();
        let runner = tokio::spawn(scheduler.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_millis(15)).await;
        assert_eq!(mover.in_flight.load(Ordering::SeqCst), 1);
        shutdown.cancel();
        runner.await.expect("scheduler task");

        assert_eq!(mover.done.load(Ordering::SeqCst), 1);
        assert_eq!(mover.in_flight.load(Ordering::SeqCst), 0);
    }
}
