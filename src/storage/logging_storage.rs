use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::storage::{Meta, Result, Storage};
use super::{Content, Key};

/// A decorator that logs every storage operation and its outcome at `debug`.
pub struct LoggingStorage {
    inner: Arc<dyn Storage>,
}

impl LoggingStorage {
    /// Wrap a storage with operation logging.
    pub fn new(inner: Arc<dyn Storage>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Storage for LoggingStorage {
    async fn exists(&self, key: &Key) -> Result<bool> {
        let result = self.inner.exists(key).await;
        debug!(storage = %self.inner.identifier(), key = %key, result = ?result, "exists");
        result
    }

    async fn list(&self, prefix: &Key) -> Result<Vec<Key>> {
        let result = self.inner.list(prefix).await;
        match &result {
            Ok(keys) => {
                debug!(storage = %self.inner.identifier(), prefix = %prefix, count = keys.len(), "list")
            }
            Err(e) => debug!(storage = %self.inner.identifier(), prefix = %prefix, error = %e, "list"),
        }
        result
    }

    async fn save(&self, key: &Key, content: Content) -> Result<()> {
        let size = content.size();
        let result = self.inner.save(key, content).await;
        debug!(storage = %self.inner.identifier(), key = %key, size = ?size, result = ?result, "save");
        result
    }

    async fn move_value(&self, source: &Key, destination: &Key) -> Result<()> {
        let result = self.inner.move_value(source, destination).await;
        debug!(
            storage = %self.inner.identifier(),
            source = %source,
            destination = %destination,
            result = ?result,
            "move"
        );
        result
    }

    async fn metadata(&self, key: &Key) -> Result<Meta> {
        let result = self.inner.metadata(key).await;
        debug!(storage = %self.inner.identifier(), key = %key, result = ?result, "metadata");
        result
    }

    async fn value(&self, key: &Key) -> Result<Content> {
        let result = self.inner.value(key).await;
        match &result {
            Ok(content) => {
                debug!(storage = %self.inner.identifier(), key = %key, size = ?content.size(), "value")
            }
            Err(e) => debug!(storage = %self.inner.identifier(), key = %key, error = %e, "value"),
        }
        result
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        let result = self.inner.delete(key).await;
        debug!(storage = %self.inner.identifier(), key = %key, result = ?result, "delete");
        result
    }

    fn identifier(&self) -> String {
        self.inner.identifier()
    }
}
