use std::sync::Arc;

use async_trait::async_trait;

use super::storage::{Meta, Result, Storage};
use super::{Content, Key};

/// A view of another storage restricted to the keys under a prefix.
///
/// Every key is resolved relative to the prefix, and listings strip it again.
/// A root prefix makes this a transparent pass-through.
pub struct SubStorage {
    prefix: Key,
    inner: Arc<dyn Storage>,
}

impl SubStorage {
    /// Create a view of `inner` rooted at `prefix`.
    pub fn new(prefix: Key, inner: Arc<dyn Storage>) -> Self {
        Self { prefix, inner }
    }

    fn prefixed(&self, key: &Key) -> Key {
        self.prefix.concat(key)
    }
}

#[async_trait]
impl Storage for SubStorage {
    async fn exists(&self, key: &Key) -> Result<bool> {
        self.inner.exists(&self.prefixed(key)).await
    }

    async fn list(&self, prefix: &Key) -> Result<Vec<Key>> {
        let keys = self.inner.list(&self.prefixed(prefix)).await?;
        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(&self.prefix))
            .collect())
    }

    async fn save(&self, key: &Key, content: Content) -> Result<()> {
        super::storage::check_not_root(key)?;
        self.inner.save(&self.prefixed(key), content).await
    }

    async fn move_value(&self, source: &Key, destination: &Key) -> Result<()> {
        self.inner
            .move_value(&self.prefixed(source), &self.prefixed(destination))
            .await
    }

    async fn metadata(&self, key: &Key) -> Result<Meta> {
        self.inner.metadata(&self.prefixed(key)).await
    }

    async fn value(&self, key: &Key) -> Result<Content> {
        self.inner.value(&self.prefixed(key)).await
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        self.inner.delete(&self.prefixed(key)).await
    }

    fn identifier(&self) -> String {
        format!("{} (prefix {})", self.inner.identifier(), self.prefix)
    }
}
