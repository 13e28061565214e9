use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::docker::{Blob, BlobSource, Layers};
use super::error::{RegistryError, Result};
use super::types::Digest;

/// Layers served from a cache first, then from the origin.
///
/// Blobs are content addressed, so a cached blob can never be stale and the
/// origin is not consulted once the cache has it. A failing cache is treated
/// as a miss. Nothing is written to the cache here; replication happens when
/// manifests are fetched.
pub struct CacheLayers {
    origin: Arc<dyn Layers>,
    cache: Arc<dyn Layers>,
}

impl CacheLayers {
    pub fn new(origin: Arc<dyn Layers>, cache: Arc<dyn Layers>) -> Self {
        Self { origin, cache }
    }
}

#[async_trait]
impl Layers for CacheLayers {
    async fn put(&self, _source: BlobSource) -> Result<Blob> {
        Err(RegistryError::Unsupported("blob upload to a cache-through repository"))
    }

    async fn get(&self, digest: &Digest) -> Result<Option<Blob>> {
        match self.cache.get(digest).await {
            Ok(Some(blob)) => return Ok(Some(blob)),
            Ok(None) => {}
            Err(e) => warn!(digest = %digest, error = %e, "cache failed to load blob"),
        }
        self.origin.get(digest).await
    }
}
