use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use super::lock::{Lock, LockError};
use super::storage_lock::StorageLock;
use crate::storage::{Key, Storage};

/// Run `operation` while holding a [`StorageLock`] on `key`.
///
/// The lock is released whether the operation succeeds or fails. A failure to
/// acquire is returned without running the operation; a failure to release is
/// returned only when the operation itself succeeded.
pub async fn exclusively<T, E, F, Fut>(
    storage: Arc<dyn Storage>,
    key: &Key,
    operation: F,
) -> std::result::Result<T, E>
where
    F: FnOnce(Arc<dyn Storage>) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: From<LockError>,
{
    let lock = StorageLock::new(storage.clone(), key.clone());
    lock.acquire().await?;
    let result = operation(storage).await;
    match (result, lock.release().await) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), release) => {
            if let Err(release_err) = release {
                warn!(key = %key, error = %release_err, "failed to release lock after failed operation");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Content, MemoryStorage, StorageError};

    #[tokio::test]
    async fn test_runs_operation_and_releases() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let key = Key::new("some/key");

        let value = exclusively(storage.clone(), &key, |storage| async move {
            storage.save(&Key::new("some/key"), Content::from_bytes(&b"data"[..])).await?;
            Ok::<_, LockError>(42)
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert!(storage.list(&Key::new(".artipie-locks")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_releases_when_operation_fails() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let key = Key::new("some/key");

        let result = exclusively(storage.clone(), &key, |_| async {
            Err::<(), _>(LockError::Storage(StorageError::Other("boom".to_string())))
        })
        .await;

        assert!(result.is_err());
        assert!(storage.list(&Key::new(".artipie-locks")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_skips_operation_when_lock_is_held() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let key = Key::new("some/key");
        let held = StorageLock::new(storage.clone(), key.clone());
        held.acquire().await.unwrap();

        let ran = std::sync::atomic::AtomicBool::new(false);

        let result = exclusively(storage.clone(), &key, |_| async {
            ran.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok::<(), LockError>(())
        })
        .await;

        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
        assert!(matches!(result, Err(LockError::Contended { .. })));
    }
}
