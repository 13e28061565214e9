use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use super::error::Result;
use super::listing::{Catalog, Tags};
use super::manifest::Manifest;
use super::types::{Digest, ManifestReference, RepoName, Tag};
use crate::storage::{Content, Key, Storage};

// =============================================================================
// Blobs
// =============================================================================

/// A stored blob, read lazily from its storage.
#[derive(Clone)]
pub struct Blob {
    digest: Digest,
    storage: Arc<dyn Storage>,
    key: Key,
}

impl Blob {
    pub fn new(digest: Digest, storage: Arc<dyn Storage>, key: Key) -> Self {
        Self {
            digest,
            storage,
            key,
        }
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Size of the blob in bytes.
    pub async fn size(&self) -> Result<u64> {
        Ok(self.storage.metadata(&self.key).await?.size)
    }

    /// Open the blob content.
    pub async fn content(&self) -> Result<Content> {
        Ok(self.storage.value(&self.key).await?)
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("digest", &self.digest)
            .field("key", &self.key)
            .finish()
    }
}

/// Content to be stored as a blob.
pub enum BlobSource {
    /// Content claimed to have the given digest; the claim is verified
    /// before the blob becomes visible.
    Checked { content: Content, digest: Digest },
    /// Bytes stored under their own sha256 digest.
    Trusted { content: Bytes },
}

impl BlobSource {
    pub fn checked(content: Content, digest: Digest) -> Self {
        BlobSource::Checked { content, digest }
    }

    pub fn trusted(content: impl Into<Bytes>) -> Self {
        BlobSource::Trusted {
            content: content.into(),
        }
    }
}

// =============================================================================
// Registry Traits
// =============================================================================

/// A docker registry: a set of named repositories.
#[async_trait]
pub trait Docker: Send + Sync {
    /// The repository with the given name.
    fn repo(&self, name: &RepoName) -> Arc<dyn Repo>;

    /// Repository names strictly after `from`, at most `limit` of them.
    async fn catalog(&self, from: Option<&RepoName>, limit: usize) -> Result<Catalog>;
}

/// A single image repository.
pub trait Repo: Send + Sync {
    fn layers(&self) -> Arc<dyn Layers>;
    fn manifests(&self) -> Arc<dyn Manifests>;
}

/// Content-addressed blobs of a repository.
#[async_trait]
pub trait Layers: Send + Sync {
    /// Store a blob.
    async fn put(&self, source: BlobSource) -> Result<Blob>;

    /// Find a blob by digest.
    async fn get(&self, digest: &Digest) -> Result<Option<Blob>>;
}

/// Manifests of a repository, addressed by digest or tag.
#[async_trait]
pub trait Manifests: Send + Sync {
    /// Store a manifest and link it under `reference` and under its digest.
    async fn put(&self, reference: &ManifestReference, content: Bytes) -> Result<Manifest>;

    /// Find a manifest.
    async fn get(&self, reference: &ManifestReference) -> Result<Option<Manifest>>;

    /// Tags strictly after `from`, at most `limit` of them.
    async fn tags(&self, from: Option<&Tag>, limit: usize) -> Result<Tags>;
}
