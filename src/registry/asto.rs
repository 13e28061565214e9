//! A registry kept in a [`Storage`] using the docker-distribution layout.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::try_join_all;
use tracing::debug;

use super::docker::{Blob, BlobSource, Docker, Layers, Manifests, Repo};
use super::error::{RegistryError, Result};
use super::layout;
use super::listing::{page, Catalog, Tags};
use super::manifest::Manifest;
use super::types::{Digest, ManifestReference, RepoName, Tag};
use crate::storage::{Content, Key, Storage};

// =============================================================================
// Blob Store
// =============================================================================

/// Content-addressed blobs shared by every repository of a registry.
#[derive(Clone)]
pub struct BlobStore {
    storage: Arc<dyn Storage>,
}

impl BlobStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Find a blob by digest.
    pub async fn blob(&self, digest: &Digest) -> Result<Option<Blob>> {
        let key = layout::blob(digest);
        if self.storage.exists(&key).await? {
            Ok(Some(Blob::new(digest.clone(), self.storage.clone(), key)))
        } else {
            Ok(None)
        }
    }

    /// Store a blob unless one with the same digest exists.
    pub async fn put(&self, source: BlobSource) -> Result<Blob> {
        match source {
            BlobSource::Trusted { content } => {
                let digest = Digest::sha256_of(&content);
                let key = layout::blob(&digest);
                if !self.storage.exists(&key).await? {
                    self.storage.save(&key, Content::from_bytes(content)).await?;
                }
                Ok(Blob::new(digest, self.storage.clone(), key))
            }
            BlobSource::Checked { content, digest } => {
                let key = layout::blob(&digest);
                if !self.storage.exists(&key).await? {
                    self.put_checked(content, &digest, &key).await?;
                }
                Ok(Blob::new(digest, self.storage.clone(), key))
            }
        }
    }

    /// Save to a scratch key, verify the digest, then move into place.
    async fn put_checked(&self, content: Content, digest: &Digest, key: &Key) -> Result<()> {
        let upload = layout::upload(&uuid::Uuid::new_v4().to_string());
        self.storage.save(&upload, content).await?;
        let verified = self.verify_upload(&upload, digest).await;
        match verified {
            Ok(()) => Ok(self.storage.move_value(&upload, key).await?),
            Err(e) => {
                if let Err(delete_err) = self.storage.delete(&upload).await {
                    debug!(key = %upload, error = %delete_err, "failed to remove rejected upload");
                }
                Err(e)
            }
        }
    }

    async fn verify_upload(&self, upload: &Key, digest: &Digest) -> Result<()> {
        let actual = digest
            .algorithm()?
            .hex_content(self.storage.value(upload).await?)
            .await?;
        if actual != digest.hex() {
            return Err(RegistryError::DigestMismatch {
                expected: digest.clone(),
                actual: Digest::new(digest.alg(), actual),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Layers
// =============================================================================

/// Layers of a storage-backed repository.
pub struct AstoLayers {
    blobs: BlobStore,
}

impl AstoLayers {
    pub fn new(blobs: BlobStore) -> Self {
        Self { blobs }
    }
}

#[async_trait]
impl Layers for AstoLayers {
    async fn put(&self, source: BlobSource) -> Result<Blob> {
        self.blobs.put(source).await
    }

    async fn get(&self, digest: &Digest) -> Result<Option<Blob>> {
        self.blobs.blob(digest).await
    }
}

// =============================================================================
// Manifests
// =============================================================================

/// Manifests of a storage-backed repository.
///
/// Manifest bytes are stored as blobs; link files under the repository hold
/// the digest for each tag and for each revision.
pub struct AstoManifests {
    storage: Arc<dyn Storage>,
    blobs: BlobStore,
    name: RepoName,
}

impl AstoManifests {
    pub fn new(storage: Arc<dyn Storage>, blobs: BlobStore, name: RepoName) -> Self {
        Self {
            storage,
            blobs,
            name,
        }
    }

    /// Check the media type is set and every referenced local blob exists.
    async fn validate(&self, manifest: &Manifest) -> Result<()> {
        if manifest.media_type()?.is_none() {
            return Err(RegistryError::InvalidManifest(
                "required field `mediaType` is empty".to_string(),
            ));
        }
        let mut digests = vec![manifest.config()?];
        digests.extend(
            manifest
                .layers()?
                .into_iter()
                .filter(|layer| layer.urls.is_empty())
                .map(|layer| layer.digest),
        );
        try_join_all(digests.iter().map(|digest| async move {
            match self.blobs.blob(digest).await? {
                Some(_) => Ok(()),
                None => Err(RegistryError::InvalidManifest(format!(
                    "blob does not exist: {}",
                    digest
                ))),
            }
        }))
        .await?;
        Ok(())
    }

    async fn add_link(&self, reference: &ManifestReference, digest: &Digest) -> Result<()> {
        let key = layout::manifest(&self.name, reference);
        self.storage
            .save(&key, Content::from_bytes(digest.to_string().into_bytes()))
            .await?;
        Ok(())
    }

    async fn read_link(&self, reference: &ManifestReference) -> Result<Option<Digest>> {
        let key = layout::manifest(&self.name, reference);
        if !self.storage.exists(&key).await? {
            return Ok(None);
        }
        let link = self.storage.value(&key).await?.into_string().await?;
        Ok(Some(link.trim().parse()?))
    }
}

#[async_trait]
impl Manifests for AstoManifests {
    async fn put(&self, reference: &ManifestReference, content: Bytes) -> Result<Manifest> {
        let manifest = Manifest::from_bytes(content);
        self.validate(&manifest).await?;
        self.blobs
            .put(BlobSource::trusted(manifest.bytes().clone()))
            .await?;
        let digest = manifest.digest();
        let revision = ManifestReference::Digest(digest.clone());
        futures::try_join!(
            self.add_link(&revision, digest),
            self.add_link(reference, digest),
        )?;
        Ok(manifest)
    }

    async fn get(&self, reference: &ManifestReference) -> Result<Option<Manifest>> {
        let Some(digest) = self.read_link(reference).await? else {
            return Ok(None);
        };
        let Some(blob) = self.blobs.blob(&digest).await? else {
            return Ok(None);
        };
        let bytes = blob.content().await?.into_bytes().await?;
        Ok(Some(Manifest::new(digest, bytes)))
    }

    async fn tags(&self, from: Option<&Tag>, limit: usize) -> Result<Tags> {
        let root = layout::tags(&self.name);
        let keys = self.storage.list(&root).await?;
        let names = keys.iter().filter_map(|key| {
            key.strip_prefix(&root)
                .and_then(|rest| rest.parts().first().cloned())
        });
        Ok(Tags::new(
            self.name.as_str(),
            page(names, from.map(Tag::as_str), limit),
        ))
    }
}

// =============================================================================
// Repository and Registry
// =============================================================================

/// A storage-backed repository.
pub struct AstoRepo {
    layers: Arc<AstoLayers>,
    manifests: Arc<AstoManifests>,
}

impl AstoRepo {
    pub fn new(storage: Arc<dyn Storage>, name: RepoName) -> Self {
        let blobs = BlobStore::new(storage.clone());
        Self {
            layers: Arc::new(AstoLayers::new(blobs.clone())),
            manifests: Arc::new(AstoManifests::new(storage, blobs, name)),
        }
    }
}

impl Repo for AstoRepo {
    fn layers(&self) -> Arc<dyn Layers> {
        self.layers.clone()
    }

    fn manifests(&self) -> Arc<dyn Manifests> {
        self.manifests.clone()
    }
}

/// A registry kept entirely in one storage.
pub struct AstoDocker {
    storage: Arc<dyn Storage>,
}

impl AstoDocker {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Docker for AstoDocker {
    fn repo(&self, name: &RepoName) -> Arc<dyn Repo> {
        Arc::new(AstoRepo::new(self.storage.clone(), name.clone()))
    }

    /// A repository is every path under `repositories/` that holds a
    /// `_manifests` directory.
    async fn catalog(&self, from: Option<&RepoName>, limit: usize) -> Result<Catalog> {
        let root = layout::repositories();
        let keys = self.storage.list(&root).await?;
        let names = keys.iter().filter_map(|key| {
            let rest = key.strip_prefix(&root)?;
            let end = rest.parts().iter().position(|p| p == layout::MANIFESTS)?;
            (end > 0).then(|| rest.parts()[..end].join("/"))
        });
        Ok(Catalog::new(page(
            names,
            from.map(RepoName::as_str),
            limit,
        )))
    }
}
