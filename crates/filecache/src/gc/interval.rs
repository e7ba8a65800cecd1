use super::{run_sweep, GarbageCollector};
use crate::errors::{CacheError, RecoveryHint, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Collector that sweeps every `interval` in a background task.
///
/// The task starts with the instance hook and stops on [`close`] or drop.
/// A zero interval never starts it.
///
/// [`close`]: GarbageCollector::close
#[derive(Debug)]
pub struct IntervalGc {
    dir: PathBuf,
    interval: Duration,
    shutdown: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl IntervalGc {
    pub fn new(dir: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            interval,
            shutdown: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the background task is running
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

#[async_trait]
impl GarbageCollector for IntervalGc {
    async fn on_instance_init(&self) {
        if self.interval == Duration::ZERO {
            tracing::warn!("GC interval is zero, interval collection disabled");
            return;
        }
        if self.shutdown.is_cancelled() {
            return;
        }

        let mut slot = self.handle.lock();
        if slot.is_some() {
            return;
        }

        let dir = self.dir.clone();
        let period = self.interval;
        let shutdown = self.shutdown.clone();
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        run_sweep(dir.clone(), shutdown.clone(), "interval").await;
                    }
                }
            }
        }));
        tracing::info!(
            "GC started for {} every {:?}",
            self.dir.display(),
            self.interval
        );
    }

    fn on_operation(&self) {}

    async fn close(&self) -> Result<()> {
        self.shutdown.cancel();
        let handle = self.handle.lock().take();
        let Some(handle) = handle else {
            return Ok(());
        };

        match handle.await {
            Ok(()) => {
                tracing::info!("GC stopped for {}", self.dir.display());
                Ok(())
            }
            Err(e) => {
                tracing::warn!("GC task for {} failed: {}", self.dir.display(), e);
                Err(CacheError::TaskFailed {
                    task: "interval gc",
                    reason: e.to_string(),
                    recovery_hint: RecoveryHint::Ignore,
                })
            }
        }
    }
}

impl Drop for IntervalGc {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}
