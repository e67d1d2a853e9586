//! One-shot countdown to session expiry.

use std::time::Duration;

use jiff::Timestamp;
use tokio::{runtime::Handle, task::JoinHandle, time::Instant};
use tracing::debug;

/// Longest single sleep. Tokio's timer wheel cannot represent much more than two years.
const MAX_SLEEP: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A scheduled expiry callback. Dropping or cancelling it aborts the pending task.
#[derive(Debug)]
pub(crate) struct CountdownTimer {
    generation: u64,
    deadline: Timestamp,
    task: JoinHandle<()>,
}

impl CountdownTimer {
    /// Spawn a task on `runtime` that calls `on_fire(generation)` once `delay` has passed.
    pub(crate) fn arm<F>(
        runtime: &Handle,
        generation: u64,
        deadline: Timestamp,
        delay: Duration,
        on_fire: F,
    ) -> Self
    where
        F: FnOnce(u64) + Send + 'static,
    {
        debug!(generation, %deadline, delay_secs = delay.as_secs(), "countdown armed");

        let task = runtime.spawn(async move {
            sleep_for(delay).await;

            on_fire(generation);
        });

        Self {
            generation,
            deadline,
            task,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn deadline(&self) -> Timestamp {
        self.deadline
    }

    pub(crate) fn cancel(self) {
        debug!(generation = self.generation, "countdown cancelled");

        self.task.abort();
    }
}

/// Sleep for `delay` in bounded steps, re-checking the remaining time after each one.
async fn sleep_for(delay: Duration) {
    let wake_at = Instant::now().checked_add(delay);

    loop {
        let now = Instant::now();
        let remaining = wake_at.map_or(MAX_SLEEP, |at| at.saturating_duration_since(now));

        if remaining.is_zero() {
            return;
        }

        tokio::time::sleep_until(now + remaining.min(MAX_SLEEP)).await;
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
