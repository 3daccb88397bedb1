//! Refresh loop for the watch command.
//!
//! Cycles run inline on the scheduler task, so two cycles never overlap.
//! Refresh requests that arrive while a cycle is running are folded into a
//! single follow-up cycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between the end of one cycle and the start of the next.
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
        }
    }
}

impl SchedulerConfig {
    /// Creates a new scheduler config with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

/// Commands that can be sent to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Run a cycle now and restart the interval.
    RefreshNow,
    /// Stop the scheduler.
    Stop,
}

/// Scheduler state.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    /// Number of completed cycles.
    pub cycles: u64,
    /// When the last cycle finished.
    pub last_cycle: Option<DateTime<Utc>>,
    /// Refresh requests absorbed into an already scheduled cycle.
    pub coalesced: u64,
}

impl SchedulerState {
    /// Records a finished cycle.
    pub fn record_cycle(&mut self) {
        self.cycles += 1;
        self.last_cycle = Some(Utc::now());
    }
}

/// Shared scheduler state.
pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

/// Periodically runs a refresh cycle.
pub struct Scheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    /// Creates a new scheduler with the given configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: Arc::new(RwLock::new(SchedulerState::default())),
            command_tx,
            command_rx,
        }
    }

    /// Returns a handle for sending commands to the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    /// Returns the shared state.
    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs the loop until [`SchedulerCommand::Stop`] is received or every
    /// handle is dropped.
    ///
    /// The first cycle runs immediately.
    pub async fn run<F, Fut>(self, cycle_fn: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let Self {
            config,
            state,
            command_tx,
            mut command_rx,
        } = self;
        // Only external handles keep the loop alive.
        drop(command_tx);

        info!(interval_secs = config.interval.as_secs(), "scheduler started");

        run_cycle(&state, &cycle_fn).await;

        loop {
            match drain_pending(&mut command_rx, &state).await {
                Queued::Stop => {
                    info!("scheduler stopping");
                    break;
                }
                Queued::Refresh => {
                    debug!("running refresh requested during the last cycle");
                    run_cycle(&state, &cycle_fn).await;
                    continue;
                }
                Queued::Nothing => {}
            }

            tokio::select! {
                _ = tokio::time::sleep(config.interval) => {
                    debug!("interval elapsed");
                    run_cycle(&state, &cycle_fn).await;
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::RefreshNow) => {
                            debug!("received RefreshNow command");
                            run_cycle(&state, &cycle_fn).await;
                        }
                        Some(SchedulerCommand::Stop) | None => {
                            info!("scheduler stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}

async fn run_cycle<F, Fut>(state: &SharedSchedulerState, cycle_fn: &F)
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    debug!("starting cycle");
    cycle_fn().await;
    state.write().await.record_cycle();
}

/// What arrived while a cycle was running.
#[derive(Debug, PartialEq, Eq)]
enum Queued {
    Nothing,
    Refresh,
    Stop,
}

/// Empties the command queue after a cycle. Any number of queued refreshes
/// yields a single follow-up cycle; a queued stop wins over refreshes.
async fn drain_pending(
    command_rx: &mut mpsc::Receiver<SchedulerCommand>,
    state: &SharedSchedulerState,
) -> Queued {
    let mut refreshes: u64 = 0;
    let mut stop = false;
    while let Ok(cmd) = command_rx.try_recv() {
        match cmd {
            SchedulerCommand::RefreshNow => refreshes += 1,
            SchedulerCommand::Stop => stop = true,
        }
    }
    if stop {
        return Queued::Stop;
    }
    if refreshes == 0 {
        return Queued::Nothing;
    }
    if refreshes > 1 {
        debug!(coalesced = refreshes - 1, "coalesced refresh requests");
        state.write().await.coalesced += refreshes - 1;
    }
    Queued::Refresh
}

/// Handle for sending commands to a running scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    /// Requests an immediate cycle.
    pub async fn refresh_now(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::RefreshNow).await
    }

    /// Requests an immediate cycle from outside the runtime.
    ///
    /// Must not be called from an async context.
    pub fn blocking_refresh_now(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.blocking_send(SchedulerCommand::RefreshNow)
    }

    /// Stops the scheduler.
    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Stop).await
    }

    /// Returns the current scheduler state.
    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_cycle(
        count: Arc<AtomicU32>,
        work: Duration,
    ) -> impl Fn() -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
    + Send
    + Sync
    + 'static {
        move || {
            let count = count.clone();
            Box::pin(async move {
                tokio::time::sleep(work).await;
                count.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    #[test]
    fn config_default() {
        assert_eq!(SchedulerConfig::default().interval, Duration::from_secs(600));
    }

    #[tokio::test(start_paused = true)]
    async fn runs_initial_cycle_then_on_interval() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(60)));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting_cycle(count.clone(), Duration::ZERO)));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(handle.state().await.cycles, 2);
        assert!(handle.state().await.last_cycle.is_some());

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_now_runs_a_cycle() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(600)));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting_cycle(count.clone(), Duration::ZERO)));

        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.refresh_now().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn refresh_from_plain_thread() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(600)));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting_cycle(count.clone(), Duration::ZERO)));

        let thread_handle = handle.clone();
        tokio::task::spawn_blocking(move || thread_handle.blocking_refresh_now())
            .await
            .unwrap()
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while count.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_during_a_cycle_are_coalesced() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(600)));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting_cycle(count.clone(), Duration::from_secs(10))));

        // Initial cycle is in flight.
        tokio::time::sleep(Duration::from_secs(1)).await;
        for _ in 0..3 {
            handle.refresh_now().await.unwrap();
        }

        tokio::time::sleep(Duration::from_secs(30)).await;
        // Initial cycle, one follow-up, remaining two dropped.
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(handle.state().await.coalesced, 2);

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_during_timed_cycle_runs_after_it() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(60)));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting_cycle(count.clone(), Duration::from_secs(10))));

        // Initial cycle 0..10s, timed cycle 70..80s.
        tokio::time::sleep(Duration::from_secs(75)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        handle.refresh_now().await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        let state = handle.state().await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(state.cycles, 3);
        assert_eq!(state.coalesced, 0);

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn queued_stop_wins_over_refresh() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(600)));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting_cycle(count.clone(), Duration::from_secs(10))));

        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.refresh_now().await.unwrap();
        handle.stop().await.unwrap();

        task.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_handles_dropped() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(60)));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting_cycle(count, Duration::ZERO)));
        drop(handle);

        task.await.unwrap();
    }
}
