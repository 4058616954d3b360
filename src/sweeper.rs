//! Background cache sweeping
//!
//! Periodically drops expired entries from the shared cache so that keys which
//! are never requested again do not linger for the life of the process.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::Cache;

/// Default interval between sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Handle for controlling the background sweep task
pub struct CacheSweeper {
    /// Flag to signal shutdown
    shutdown_tx: mpsc::Sender<()>,
    /// The sweep task, if one was started
    task: Option<JoinHandle<()>>,
}

impl CacheSweeper {
    /// Spawns a task purging expired entries from `cache` every `interval`
    ///
    /// A zero interval starts nothing; the returned handle is then inert.
    /// Must be called from within a tokio runtime.
    pub fn spawn<T: 'static>(cache: Arc<dyn Cache<T>>, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if interval.is_zero() {
            return Self {
                shutdown_tx,
                task: None,
            };
        }

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Skip the first tick (immediate)
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = cache.purge_expired();
                        if removed > 0 {
                            debug!(removed, remaining = cache.len(), "Purged expired cache entries");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            task: Some(task),
        }
    }

    /// Whether a sweep task is running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the sweep task and waits for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Some(task) = self.task {
            let _ = task.await;
        }
    }
}
