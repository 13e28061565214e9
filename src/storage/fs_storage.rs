use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::storage::{check_not_root, Meta, Result, Storage, StorageError};
use super::{Content, Key};

/// Counter for generating unique temp file names.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Name of the scratch directory used for in-progress writes.
const TEMP_DIR: &str = ".tmp";

/// A filesystem-based implementation of [`Storage`].
///
/// Each key maps to a file relative to a configured base directory.
/// Writes are atomic: data is streamed to a temp file in `.tmp/` then renamed,
/// so readers never observe a partially written value.
pub struct FsStorage {
    base_path: PathBuf,
}

impl FsStorage {
    /// Create a new filesystem storage rooted at the given path.
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Resolve a key against the base path.
    ///
    /// Keys must stay below the base path and out of the scratch directory,
    /// so `.` and `..` segments and a leading `.tmp` segment are rejected.
    fn full_path(&self, key: &Key) -> Result<PathBuf> {
        let invalid = |message: &str| StorageError::InvalidKey {
            key: key.clone(),
            message: message.to_string(),
        };
        let mut path = self.base_path.clone();
        for (index, part) in key.parts().iter().enumerate() {
            if part == "." || part == ".." {
                return Err(invalid("relative path segments are not allowed"));
            }
            if index == 0 && part == TEMP_DIR {
                return Err(invalid("reserved for in-progress writes"));
            }
            path.push(part);
        }
        Ok(path)
    }

    /// Get the path to the temp directory.
    fn temp_dir(&self) -> PathBuf {
        self.base_path.join(TEMP_DIR)
    }

    /// Generate a unique temp file path.
    fn temp_file_path(&self) -> PathBuf {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let pid = std::process::id();
        self.temp_dir().join(format!("tmp.{}.{}", pid, counter))
    }

    /// Collect every file below `dir` into `keys`, using `key` as the key of `dir`.
    async fn walk(&self, dir: PathBuf, key: Key, keys: &mut Vec<Key>) -> Result<()> {
        let mut pending = vec![(dir, key)];
        while let Some((dir, key)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::Io(e)),
            };
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                if key.is_root() && name == TEMP_DIR {
                    continue;
                }
                let child = key.join(&name);
                if entry.file_type().await?.is_dir() {
                    pending.push((entry.path(), child));
                } else {
                    keys.push(child);
                }
            }
        }
        Ok(())
    }
}

fn not_found(key: &Key) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(key.clone())
        } else {
            StorageError::Io(e)
        }
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn exists(&self, key: &Key) -> Result<bool> {
        if key.is_root() {
            return Ok(false);
        }
        match fs::metadata(self.full_path(key)?).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn list(&self, prefix: &Key) -> Result<Vec<Key>> {
        let mut keys = Vec::new();
        let path = self.full_path(prefix)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => keys.push(prefix.clone()),
            Ok(_) => self.walk(path, prefix.clone(), &mut keys).await?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::Io(e)),
        }
        keys.sort();
        Ok(keys)
    }

    async fn save(&self, key: &Key, content: Content) -> Result<()> {
        check_not_root(key)?;
        let full_path = self.full_path(key)?;
        let temp_path = self.temp_file_path();

        // Ensure temp directory exists
        fs::create_dir_all(self.temp_dir()).await?;

        // Stream into the temp file, removing it if the content fails
        let written: std::io::Result<()> = async {
            let mut file = fs::File::create(&temp_path).await?;
            let mut stream = content.into_stream();
            while let Some(chunk) = stream.next().await {
                file.write_all(&chunk?).await?;
            }
            file.flush().await
        }
        .await;
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }

        // Create parent directories of final path if needed
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Atomically rename temp file to final location
        fs::rename(&temp_path, &full_path).await?;
        Ok(())
    }

    async fn move_value(&self, source: &Key, destination: &Key) -> Result<()> {
        check_not_root(destination)?;
        let source_path = self.full_path(source)?;
        let dest_path = self.full_path(destination)?;
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(source_path, dest_path)
            .await
            .map_err(not_found(source))
    }

    async fn metadata(&self, key: &Key) -> Result<Meta> {
        let meta = fs::metadata(self.full_path(key)?)
            .await
            .map_err(not_found(key))?;
        if !meta.is_file() {
            return Err(StorageError::NotFound(key.clone()));
        }
        Ok(Meta { size: meta.len() })
    }

    async fn value(&self, key: &Key) -> Result<Content> {
        // Directories are not values
        self.metadata(key).await?;
        let data = fs::read(self.full_path(key)?).await.map_err(not_found(key))?;
        Ok(Content::from_bytes(data))
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        if key.is_root() {
            return Err(StorageError::NotFound(key.clone()));
        }
        fs::remove_file(self.full_path(key)?)
            .await
            .map_err(not_found(key))
    }

    fn identifier(&self) -> String {
        format!("fs:{}", self.base_path.display())
    }
}
