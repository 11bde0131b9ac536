//! Periodic driver for the poll cycle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

use super::cycle::{Policy, PollCycle};

/// Runs a [`PollCycle`] at a fixed interval until stopped.
///
/// Cycles run inline in a single task, so they never overlap: a tick that
/// falls due while a cycle is still running is skipped. Stopping prevents
/// further cycles but lets an in-flight one finish.
pub struct Scheduler {
    stop_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Start the timer; the first cycle runs immediately.
    pub fn start(cycle: Arc<PollCycle>, policy: Policy, interval: Duration) -> Self {
        Self::spawn(cycle, policy, interval, Instant::now())
    }

    /// Start the timer; the first cycle runs after one interval.
    pub fn start_delayed(cycle: Arc<PollCycle>, policy: Policy, interval: Duration) -> Self {
        Self::spawn(cycle, policy, interval, Instant::now() + interval)
    }

    fn spawn(cycle: Arc<PollCycle>, policy: Policy, interval: Duration, first: Instant) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut timer = time::interval_at(first, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(?policy, interval_secs = interval.as_secs(), "Scheduler started");
            loop {
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = timer.tick() => {
                        cycle.run_logged(policy).await;
                    }
                }
            }
            info!("Scheduler stopped");
        });

        Self {
            stop_tx,
            task: Mutex::new(Some(task)),
        }
    }

    /// Request the timer to stop.
    ///
    /// Returns `true` the first time it is called and `false` afterwards.
    pub fn stop(&self) -> bool {
        !self.stop_tx.send_replace(true)
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Wait for the timer task to exit. Call after [`stop`](Self::stop).
    pub async fn join(&self) {
        let task = match self.task.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Scheduler task ended abnormally");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop_tx.send_replace(true);
    }
}
