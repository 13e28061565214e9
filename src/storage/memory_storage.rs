use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::storage::{check_not_root, Meta, Result, Storage, StorageError};
use super::{Content, Key};

/// An in-memory implementation of [`Storage`], intended primarily for testing.
///
/// Content is fully buffered before it is inserted, so a stream that fails
/// half way never leaves a partial value behind.
pub struct MemoryStorage {
    data: RwLock<BTreeMap<Key, Bytes>>,
}

impl MemoryStorage {
    /// Create a new empty in-memory storage.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn exists(&self, key: &Key) -> Result<bool> {
        let data = self.data.read().await;
        Ok(data.contains_key(key))
    }

    async fn list(&self, prefix: &Key) -> Result<Vec<Key>> {
        let data = self.data.read().await;
        Ok(data
            .range(prefix.clone()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn save(&self, key: &Key, content: Content) -> Result<()> {
        check_not_root(key)?;
        let bytes = content.into_bytes().await?;
        let mut data = self.data.write().await;
        data.insert(key.clone(), bytes);
        Ok(())
    }

    async fn move_value(&self, source: &Key, destination: &Key) -> Result<()> {
        check_not_root(destination)?;
        let mut data = self.data.write().await;
        let value = data
            .remove(source)
            .ok_or_else(|| StorageError::NotFound(source.clone()))?;
        data.insert(destination.clone(), value);
        Ok(())
    }

    async fn metadata(&self, key: &Key) -> Result<Meta> {
        let data = self.data.read().await;
        data.get(key)
            .map(|value| Meta {
                size: value.len() as u64,
            })
            .ok_or_else(|| StorageError::NotFound(key.clone()))
    }

    async fn value(&self, key: &Key) -> Result<Content> {
        let data = self.data.read().await;
        data.get(key)
            .cloned()
            .map(Content::from_bytes)
            .ok_or_else(|| StorageError::NotFound(key.clone()))
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        let mut data = self.data.write().await;
        data.remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.clone()))
    }

    fn identifier(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use futures::stream;

    use super::*;

    #[tokio::test]
    async fn test_value_roundtrip() {
        let storage = MemoryStorage::new();
        let key = Key::new("a/b");

        assert!(!storage.exists(&key).await.unwrap());

        storage
            .save(&key, Content::from_bytes(&b"hello world"[..]))
            .await
            .unwrap();

        assert!(storage.exists(&key).await.unwrap());
        assert_eq!(storage.metadata(&key).await.unwrap().size, 11);
        let value = storage.value(&key).await.unwrap().into_bytes().await.unwrap();
        assert_eq!(&value[..], b"hello world");
    }

    #[tokio::test]
    async fn test_read_nonexistent_value() {
        let storage = MemoryStorage::new();
        let result = storage.value(&Key::new("missing")).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_save_to_root_fails() {
        let storage = MemoryStorage::new();
        let result = storage.save(&Key::ROOT, Content::empty()).await;
        assert!(matches!(result, Err(StorageError::InvalidKey { .. })));
    }

    #[tokio::test]
    async fn test_failed_stream_leaves_no_value() {
        let storage = MemoryStorage::new();
        let key = Key::new("broken");
        let content = Content::from_stream(
            stream::iter(vec![
                Ok(Bytes::from_static(b"part")),
                Err(io::Error::new(io::ErrorKind::Other, "Error!")),
            ]),
            None,
        );

        assert!(storage.save(&key, content).await.is_err());
        assert!(!storage.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_is_segment_wise() {
        let storage = MemoryStorage::new();
        for key in ["a/b/1", "a/b/2", "a/bc/3", "a/b", "z"] {
            storage.save(&Key::new(key), Content::empty()).await.unwrap();
        }

        let listed = storage.list(&Key::new("a/b")).await.unwrap();
        assert_eq!(
            listed,
            vec![Key::new("a/b"), Key::new("a/b/1"), Key::new("a/b/2")]
        );
        assert_eq!(storage.list(&Key::ROOT).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_move_and_delete() {
        let storage = MemoryStorage::new();
        let source = Key::new("src");
        let dest = Key::new("dst/x");
        storage
            .save(&source, Content::from_bytes(&b"data"[..]))
            .await
            .unwrap();

        storage.move_value(&source, &dest).await.unwrap();
        assert!(!storage.exists(&source).await.unwrap());
        assert!(storage.exists(&dest).await.unwrap());

        storage.delete(&dest).await.unwrap();
        assert!(matches!(
            storage.delete(&dest).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_all() {
        let storage = MemoryStorage::new();
        for key in ["p/1", "p/2/3", "q"] {
            storage.save(&Key::new(key), Content::empty()).await.unwrap();
        }
        storage.delete_all(&Key::new("p")).await.unwrap();
        assert_eq!(storage.list(&Key::ROOT).await.unwrap(), vec![Key::new("q")]);
    }
}
