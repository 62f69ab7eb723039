//! Background task that sweeps and flushes every container.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::resolver::ContainerRegistry;
use crate::Result;

/// Intervals are clamped to at least this long.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to the periodic sweep/flush task.
///
/// Nothing runs in the background unless a sweeper is spawned explicitly.
#[derive(Debug)]
pub struct Sweeper {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn the task on the current tokio runtime.
    ///
    /// Every `sweep_interval` each distinct container is swept; every
    /// `flush_interval` each is flushed. Failures are logged and the task
    /// carries on.
    pub fn spawn(
        registry: Arc<ContainerRegistry>,
        sweep_interval: Duration,
        flush_interval: Duration,
    ) -> Self {
        Self::start(registry, Some(sweep_interval), flush_interval)
    }

    /// Spawn a task that only flushes; expired data is left to lazy expiry.
    pub fn spawn_flush_only(registry: Arc<ContainerRegistry>, flush_interval: Duration) -> Self {
        Self::start(registry, None, flush_interval)
    }

    fn start(
        registry: Arc<ContainerRegistry>,
        sweep_interval: Option<Duration>,
        flush_interval: Duration,
    ) -> Self {
        let (shutdown, mut stop) = watch::channel(false);
        let sweeping = sweep_interval.is_some();
        let sweep_interval = sweep_interval.unwrap_or(flush_interval).max(MIN_INTERVAL);
        let flush_interval = flush_interval.max(MIN_INTERVAL);

        let task = tokio::spawn(async move {
            let mut sweep_tick = tokio::time::interval(sweep_interval);
            let mut flush_tick = tokio::time::interval(flush_interval);
            // Both intervals fire immediately; skip that first tick.
            sweep_tick.tick().await;
            flush_tick.tick().await;

            loop {
                tokio::select! {
                    _ = sweep_tick.tick(), if sweeping => {
                        let removed = sweep_all(&registry);
                        if removed > 0 {
                            info!(removed, "Periodic sweep evicted expired sessions");
                        }
                    }
                    _ = flush_tick.tick() => {
                        // Failures are already logged per container; retry next tick.
                        if flush_all(&registry).is_err() {
                            debug!("Periodic flush incomplete");
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            debug!("Sweeper stopping");
                            break;
                        }
                    }
                }
            }
        });

        Self { shutdown, task }
    }

    /// Stop the task and wait for it to finish its current pass.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Sweeper task ended abnormally");
        }
    }
}

/// Sweep every distinct container once. Returns the total evicted.
pub fn sweep_all(registry: &ContainerRegistry) -> usize {
    let mut total = 0;
    for container in registry.containers() {
        match container.sweep() {
            Ok(removed) => total += removed,
            Err(e) => warn!(container = %container.name(), error = %e, "Sweep failed"),
        }
    }
    total
}

/// Flush every distinct container once.
///
/// Every container is attempted even if an earlier one fails; the first
/// failure is returned.
pub fn flush_all(registry: &ContainerRegistry) -> Result<()> {
    let mut first_error = None;
    for container in registry.containers() {
        if let Err(e) = container.flush() {
            warn!(container = %container.name(), error = %e, "Flush failed");
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}
