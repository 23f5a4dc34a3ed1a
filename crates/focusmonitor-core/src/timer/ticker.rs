//! Recurring trigger for driving the machine's clock.
//!
//! The machine itself never spawns anything; whichever process runs it
//! owns a [`Ticker`] and must cancel it when the state it serves is left.
//! Dropping the ticker aborts the task, so a stale trigger can never fire
//! after the owner has moved on.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Handle to a spawned recurring task.
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawn a task invoking `f` once per `period`, starting one period
    /// from now. Must be called from within a tokio runtime.
    pub fn every<F>(period: Duration, mut f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first interval tick resolves immediately; skip it so the
            // first callback lands one full period out.
            interval.tick().await;
            loop {
                interval.tick().await;
                f();
            }
        });
        Self { handle }
    }

    /// Stop the trigger. Safe to call more than once.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
