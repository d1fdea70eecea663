// Cancellable repeating timer for the polling loop
use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

/// Runs a task every `period`, starting one period from now.
///
/// Each run is awaited before the next tick is considered, so runs never
/// overlap: a slow run delays the following one instead. Dropping the handle
/// cancels the timer.
#[derive(Debug)]
pub struct RepeatingTimer {
    stop_tx: watch::Sender<bool>,
}

impl RepeatingTimer {
    pub fn spawn<F, Fut>(period: Duration, mut task: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        tokio::spawn(async move {
            let mut timer = tokio::time::interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        task().await;
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Self { stop_tx }
    }

    /// Stop scheduling further runs. A run already in progress completes.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for RepeatingTimer {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
    }
}
