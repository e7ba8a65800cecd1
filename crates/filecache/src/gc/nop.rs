use super::GarbageCollector;
use crate::errors::Result;
use async_trait::async_trait;

/// Collector that never removes anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NopGc;

#[async_trait]
impl GarbageCollector for NopGc {
    async fn on_instance_init(&self) {}

    fn on_operation(&self) {}

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gc::tests::put_expired;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_nop_keeps_expired_entries() {
        let temp_dir = TempDir::new().unwrap();
        let paths = put_expired(temp_dir.path(), "old");

        let gc = NopGc;
        gc.on_instance_init().await;
        gc.on_operation();
        gc.close().await.unwrap();

        assert!(paths.content.exists());
        assert!(paths.metadata.exists());
    }
}
