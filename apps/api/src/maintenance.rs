//! Periodic sweeps for the in-memory stores.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::state::AppState;

/// Running sweep tasks, stopped together on shutdown.
pub struct MaintenanceTasks {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl MaintenanceTasks {
    /// Starts the cache/rate-window sweep and the abuse log retention sweep.
    pub fn start(state: &AppState, cache_sweep_every: Duration, log_sweep_every: Duration) -> Self {
        let mut tasks = Self::new();

        let cache_state = state.clone();
        tasks.spawn_periodic("response cache", cache_sweep_every, move || {
            let state = cache_state.clone();
            async move {
                match state.response_cache_service.sweep_expired().await {
                    Ok(removed) if removed > 0 => info!(removed, "swept expired cache entries"),
                    Ok(_) => {}
                    Err(error) => warn!(error = %error, "response cache sweep failed"),
                }
                match state.rate_limit_service.cleanup().await {
                    Ok(removed) if removed > 0 => info!(removed, "swept expired rate windows"),
                    Ok(_) => {}
                    Err(error) => warn!(error = %error, "rate window sweep failed"),
                }
            }
        });

        let log_state = state.clone();
        tasks.spawn_periodic("abuse log", log_sweep_every, move || {
            let state = log_state.clone();
            async move {
                if let Err(error) = state.abuse_event_service.prune_expired().await {
                    warn!(error = %error, "abuse log sweep failed");
                }
            }
        });

        tasks
    }

    fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shutdown,
            handles: Vec::new(),
        }
    }

    /// Runs `task` every `period`, first after one full period.
    pub fn spawn_periodic<F, Fut>(&mut self, name: &'static str, period: Duration, task: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut shutdown = self.shutdown.subscribe();
        self.handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(task = name, period_seconds = period.as_secs(), "maintenance task started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => task().await,
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!(task = name, "maintenance task stopped");
        }));
    }

    /// Signals every task to stop and waits for them to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(error) = handle.await {
                warn!(error = %error, "maintenance task ended abnormally");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::MaintenanceTasks;

    #[tokio::test(start_paused = true)]
    async fn periodic_task_runs_once_per_period_until_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut tasks = MaintenanceTasks::new();
        let counter = runs.clone();
        tasks.spawn_periodic("counter", Duration::from_secs(300), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(651)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        tasks.shutdown().await;
        tokio::time::sleep(Duration::from_secs(900)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }
}
