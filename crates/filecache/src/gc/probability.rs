use super::{run_sweep, GarbageCollector};
use crate::errors::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Decide whether a hook with the given divisor fires.
///
/// `0` never fires, `1` always fires, `n` fires with probability `1/n`.
pub fn decide_to_run(divisor: u32) -> bool {
    match divisor {
        0 => false,
        1 => true,
        n => fastrand::u32(0..n) == 0,
    }
}

/// Collector that sweeps with a fixed probability per notification.
///
/// The instance hook sweeps before returning. Operation hooks start the
/// sweep as a tracked background task and return immediately.
#[derive(Debug)]
pub struct ProbabilityGc {
    dir: PathBuf,
    on_init_divisor: u32,
    on_op_divisor: u32,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl ProbabilityGc {
    pub fn new(dir: impl Into<PathBuf>, on_init_divisor: u32, on_op_divisor: u32) -> Self {
        Self {
            dir: dir.into(),
            on_init_divisor,
            on_op_divisor,
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Wait for background sweeps started so far, without shutting down
    pub async fn wait_idle(&self) {
        if self.shutdown.is_cancelled() {
            self.tracker.wait().await;
            return;
        }
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

#[async_trait]
impl GarbageCollector for ProbabilityGc {
    async fn on_instance_init(&self) {
        if self.shutdown.is_cancelled() || !decide_to_run(self.on_init_divisor) {
            return;
        }
        run_sweep(self.dir.clone(), self.shutdown.clone(), "init").await;
    }

    fn on_operation(&self) {
        if self.shutdown.is_cancelled() || !decide_to_run(self.on_op_divisor) {
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            tracing::debug!("No runtime available, skipping GC sweep");
            return;
        };
        self.tracker.spawn_on(
            run_sweep(self.dir.clone(), self.shutdown.clone(), "operation"),
            &handle,
        );
    }

    async fn close(&self) -> Result<()> {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gc::tests::put_expired;
    use tempfile::TempDir;

    #[test]
    fn test_decide_to_run() {
        for _ in 0..100 {
            assert!(!decide_to_run(0));
            assert!(decide_to_run(1));
        }

        let hits = (0..10_000).filter(|_| decide_to_run(2)).count();
        assert!((4_000..6_000).contains(&hits), "hits: {hits}");
    }

    #[tokio::test]
    async fn test_init_hook_sweeps_inline() {
        let temp_dir = TempDir::new().unwrap();
        let paths = put_expired(temp_dir.path(), "old");

        let gc = ProbabilityGc::new(temp_dir.path(), 1, 0);
        gc.on_instance_init().await;

        assert!(!paths.content.exists());
        assert!(!paths.metadata.exists());
    }

    #[tokio::test]
    async fn test_operation_hook_sweeps_in_background() {
        let temp_dir = TempDir::new().unwrap();
        let paths = put_expired(temp_dir.path(), "old");

        let gc = ProbabilityGc::new(temp_dir.path(), 0, 1);
        gc.on_instance_init().await;
        assert!(paths.content.exists());

        gc.on_operation();
        gc.wait_idle().await;
        assert!(!paths.content.exists());

        // Still usable after waiting.
        let again = put_expired(temp_dir.path(), "old2");
        gc.on_operation();
        gc.wait_idle().await;
        assert!(!again.content.exists());
        gc.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_divisors_never_sweep() {
        let temp_dir = TempDir::new().unwrap();
        let paths = put_expired(temp_dir.path(), "old");

        let gc = ProbabilityGc::new(temp_dir.path(), 0, 0);
        gc.on_instance_init().await;
        for _ in 0..10 {
            gc.on_operation();
        }
        gc.close().await.unwrap();

        assert!(paths.content.exists());
    }

    #[tokio::test]
    async fn test_closed_collector_ignores_hooks() {
        let temp_dir = TempDir::new().unwrap();
        let paths = put_expired(temp_dir.path(), "old");

        let gc = ProbabilityGc::new(temp_dir.path(), 1, 1);
        gc.close().await.unwrap();
        gc.on_instance_init().await;
        gc.on_operation();
        gc.wait_idle().await;

        assert!(paths.content.exists());
    }
}
