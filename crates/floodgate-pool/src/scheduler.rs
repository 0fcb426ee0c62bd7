//! Periodic task scheduling
//!
//! The pool arms its leak scan through the narrow [`Scheduler`] seam so
//! tests can substitute a manual ticker for the Tokio-backed default.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// A unit of work run repeatedly at a fixed rate.
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    async fn tick(&self);
}

/// Executes periodic tasks.
pub trait Scheduler: Send + Sync {
    /// Run `task` every `period` until the scheduler shuts down.
    fn schedule_periodic(&self, task: Arc<dyn PeriodicTask>, period: Duration);

    /// Stop all scheduled tasks. Idempotent.
    fn shutdown(&self);
}

/// Fixed-rate scheduler backed by the Tokio runtime.
///
/// Each scheduled task gets its own worker; a slow tick delays the next
/// one rather than bunching missed ticks together. Workers are aborted
/// on shutdown and on drop.
pub struct TokioScheduler {
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self {
            workers: Mutex::new(Vec::new()),
        }
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_periodic(&self, task: Arc<dyn PeriodicTask>, period: Duration) {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick of a Tokio interval completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                task.tick().await;
            }
        });
        self.workers.lock().push(handle);
    }

    fn shutdown(&self) {
        for worker in self.workers.lock().drain(..) {
            worker.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Test scheduler that runs registered tasks only when told to.
#[cfg(test)]
pub(crate) struct ManualScheduler {
    tasks: Mutex<Vec<Arc<dyn PeriodicTask>>>,
}

#[cfg(test)]
impl ManualScheduler {
    pub(crate) fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn task_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Run every registered task once.
    pub(crate) async fn fire(&self) {
        let tasks: Vec<_> = self.tasks.lock().clone();
        for task in tasks {
            task.tick().await;
        }
    }
}

#[cfg(test)]
impl Scheduler for ManualScheduler {
    fn schedule_periodic(&self, task: Arc<dyn PeriodicTask>, _period: Duration) {
        self.tasks.lock().push(task);
    }

    fn shutdown(&self) {}
}
