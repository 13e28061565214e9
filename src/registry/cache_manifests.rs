use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::try_join_all;
use tracing::{debug, error, warn};

use super::docker::{BlobSource, Manifests, Repo};
use super::error::{RegistryError, Result};
use super::events::{self, ArtifactEvent, EventSink, DEFAULT_OWNER};
use super::listing::{join_page, Tags};
use super::manifest::Manifest;
use super::types::{Digest, ManifestReference, RepoName, Tag};

/// Repository type recorded in artifact events.
const REPO_TYPE: &str = "docker-proxy";

/// Manifests served from the origin first, falling back to a cache.
///
/// A manifest found at the origin is returned as-is while a detached task
/// copies its config, its local layers and the manifest itself into the
/// cache, then publishes an [`ArtifactEvent`]. Replication failures are only
/// logged. Manifests the origin does not have, or cannot serve, are looked up
/// in the cache.
#[derive(Clone)]
pub struct CacheManifests {
    name: RepoName,
    origin: Arc<dyn Repo>,
    cache: Arc<dyn Repo>,
    events: Option<EventSink>,
    registry: String,
}

impl CacheManifests {
    /// `registry` is the name of the proxy registry recorded in events.
    pub fn new(
        name: RepoName,
        origin: Arc<dyn Repo>,
        cache: Arc<dyn Repo>,
        events: Option<EventSink>,
        registry: impl Into<String>,
    ) -> Self {
        Self {
            name,
            origin,
            cache,
            events,
            registry: registry.into(),
        }
    }

    /// Replicate a manifest in the background.
    fn spawn_copy(&self, reference: ManifestReference, manifest: Manifest) {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.copy(&reference, &manifest).await {
                error!(
                    repo = %this.name,
                    reference = %reference,
                    error = %e,
                    "failed to cache manifest"
                );
            }
        });
    }

    async fn copy(&self, reference: &ManifestReference, manifest: &Manifest) -> Result<()> {
        let config = manifest.config()?;
        let layers = manifest.layers()?;
        let local = layers
            .iter()
            .filter(|layer| layer.urls.is_empty())
            .map(|layer| self.copy_blob(&layer.digest));
        futures::try_join!(self.copy_blob(&config), try_join_all(local))?;

        self.cache
            .manifests()
            .put(reference, manifest.bytes().clone())
            .await?;

        let size = layers.iter().map(|layer| layer.size).sum();
        events::publish(
            self.events.as_ref(),
            ArtifactEvent::insert(
                REPO_TYPE,
                self.registry.as_str(),
                DEFAULT_OWNER,
                self.name.as_str(),
                manifest.digest().to_string(),
                size,
            ),
        );
        debug!(repo = %self.name, reference = %reference, "manifest cached");
        Ok(())
    }

    async fn copy_blob(&self, digest: &Digest) -> Result<()> {
        let blob = self
            .origin
            .layers()
            .get(digest)
            .await?
            .ok_or_else(|| RegistryError::BlobUnknown(digest.clone()))?;
        let content = blob.content().await?;
        self.cache
            .layers()
            .put(BlobSource::checked(content, digest.clone()))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Manifests for CacheManifests {
    async fn put(&self, _reference: &ManifestReference, _content: Bytes) -> Result<Manifest> {
        Err(RegistryError::Unsupported(
            "manifest upload to a cache-through repository",
        ))
    }

    async fn get(&self, reference: &ManifestReference) -> Result<Option<Manifest>> {
        match self.origin.manifests().get(reference).await {
            Ok(Some(manifest)) => {
                if manifest.is_supported() {
                    self.spawn_copy(reference.clone(), manifest.clone());
                } else {
                    debug!(
                        repo = %self.name,
                        reference = %reference,
                        "manifest media type is not supported, skipping cache"
                    );
                }
                Ok(Some(manifest))
            }
            Ok(None) => match self.cache.manifests().get(reference).await {
                Ok(cached) => Ok(cached),
                Err(e) => {
                    warn!(
                        repo = %self.name,
                        reference = %reference,
                        error = %e,
                        "cache failed to load manifest"
                    );
                    Ok(None)
                }
            },
            Err(e) => {
                warn!(
                    repo = %self.name,
                    reference = %reference,
                    error = %e,
                    "origin failed to load manifest, using cache"
                );
                self.cache.manifests().get(reference).await
            }
        }
    }

    async fn tags(&self, from: Option<&Tag>, limit: usize) -> Result<Tags> {
        let origin = self.origin.manifests().tags(from, limit).await?;
        let cache = match self.cache.manifests().tags(from, limit).await {
            Ok(tags) => tags.tags,
            Err(e) => {
                warn!(repo = %self.name, error = %e, "cache failed to list tags");
                Vec::new()
            }
        };
        Ok(Tags::new(
            self.name.as_str(),
            join_page(origin.tags, cache, from.map(Tag::as_str), limit),
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use super::*;
    use crate::registry::asto::tests::{publish, LAYER};
    use crate::registry::cache_layers::tests::FaultyLayers;
    use crate::registry::docker::Layers;
    use crate::registry::{AstoDocker, Docker};
    use crate::storage::{LoggingStorage, MemoryStorage};

    /// Test double returning a canned manifest, nothing, or an error.
    #[derive(Clone, Copy)]
    pub(crate) enum Mode {
        Empty,
        Full,
        Faulty,
    }

    pub(crate) struct FakeManifests {
        mode: Mode,
        marker: &'static str,
        tags: Vec<&'static str>,
    }

    impl FakeManifests {
        pub(crate) fn new(mode: Mode, marker: &'static str) -> Self {
            Self {
                mode,
                marker,
                tags: Vec::new(),
            }
        }

        pub(crate) fn with_tags(tags: Vec<&'static str>) -> Self {
            Self {
                mode: Mode::Full,
                marker: "tags",
                tags,
            }
        }

        fn fail<T>(&self) -> Result<T> {
            Err(RegistryError::Other(format!("{} is faulty", self.marker)))
        }
    }

    #[async_trait]
    impl Manifests for FakeManifests {
        async fn put(&self, _reference: &ManifestReference, _content: Bytes) -> Result<Manifest> {
            self.fail()
        }

        async fn get(&self, _reference: &ManifestReference) -> Result<Option<Manifest>> {
            match self.mode {
                Mode::Empty => Ok(None),
                Mode::Full => Ok(Some(Manifest::new(
                    Digest::new("sha256", self.marker),
                    &b"{}"[..],
                ))),
                Mode::Faulty => self.fail(),
            }
        }

        async fn tags(&self, _from: Option<&Tag>, _limit: usize) -> Result<Tags> {
            match self.mode {
                Mode::Faulty => self.fail(),
                _ => Ok(Tags::new(
                    "",
                    self.tags.iter().map(|t| t.to_string()).collect(),
                )),
            }
        }
    }

    /// Repository made of the given manifests and layers that always fail.
    pub(crate) struct SimpleRepo {
        manifests: Arc<dyn Manifests>,
    }

    impl SimpleRepo {
        pub(crate) fn new(manifests: impl Manifests + 'static) -> Arc<Self> {
            Arc::new(Self {
                manifests: Arc::new(manifests),
            })
        }
    }

    impl Repo for SimpleRepo {
        fn layers(&self) -> Arc<dyn Layers> {
            Arc::new(FaultyLayers::default())
        }

        fn manifests(&self) -> Arc<dyn Manifests> {
            self.manifests.clone()
        }
    }

    fn name(value: &str) -> RepoName {
        RepoName::new(value).unwrap()
    }

    async fn load(origin: Mode, cache: Mode) -> Option<String> {
        let manifests = CacheManifests::new(
            name("test"),
            SimpleRepo::new(FakeManifests::new(origin, "origin")),
            SimpleRepo::new(FakeManifests::new(cache, "cache")),
            None,
            "*",
        );
        manifests
            .get(&"ref".parse().unwrap())
            .await
            .unwrap()
            .map(|manifest| manifest.digest().hex().to_string())
    }

    #[tokio::test]
    async fn test_returns_expected_source() {
        use Mode::*;
        let cases = [
            (Empty, Empty, None),
            (Empty, Full, Some("cache")),
            (Full, Empty, Some("origin")),
            (Faulty, Full, Some("cache")),
            (Full, Faulty, Some("origin")),
            (Faulty, Empty, None),
            (Empty, Faulty, None),
            (Full, Full, Some("origin")),
        ];
        for (origin, cache, expected) in cases {
            assert_eq!(
                load(origin, cache).await.as_deref(),
                expected,
                "unexpected result for the given origin/cache combination"
            );
        }
    }

    #[tokio::test]
    async fn test_both_faulty_fails() {
        let manifests = CacheManifests::new(
            name("test"),
            SimpleRepo::new(FakeManifests::new(Mode::Faulty, "origin")),
            SimpleRepo::new(FakeManifests::new(Mode::Faulty, "cache")),
            None,
            "*",
        );
        assert!(manifests.get(&"ref".parse().unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn test_caches_manifest_and_publishes_event() {
        let reference: ManifestReference = "1".parse().unwrap();
        let origin = AstoDocker::new(Arc::new(MemoryStorage::new())).repo(&name("my-alpine"));
        let published = publish(origin.as_ref(), "1").await;
        let cache_storage = Arc::new(LoggingStorage::new(Arc::new(MemoryStorage::new())));
        let cache = AstoDocker::new(cache_storage).repo(&name("my-cache"));
        let (sink, mut events) = tokio::sync::mpsc::unbounded_channel();

        let returned = CacheManifests::new(
            name("cache-alpine"),
            origin,
            cache.clone(),
            Some(sink),
            "my-docker-proxy",
        )
        .get(&reference)
        .await
        .unwrap()
        .unwrap();
        assert_eq!(returned, published);

        let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .expect("manifest was not cached in time")
            .unwrap();
        let cached = cache.manifests().get(&reference).await.unwrap().unwrap();
        assert_eq!(cached.bytes(), published.bytes());
        for layer in published.layers().unwrap() {
            let present = cache.layers().get(&layer.digest).await.unwrap().is_some();
            assert_eq!(present, layer.urls.is_empty(), "layer {}", layer.digest);
        }

        assert_eq!(event.repo_type, "docker-proxy");
        assert_eq!(event.repo_name, "my-docker-proxy");
        assert_eq!(event.owner, "UNKNOWN");
        assert_eq!(event.artifact_name, "cache-alpine");
        assert_eq!(event.version, published.digest().to_string());
        assert_eq!(event.size, LAYER.len() as u64 + 1000);
        assert!(events.try_recv().is_err(), "exactly one event");
    }

    #[tokio::test]
    async fn test_replication_failure_keeps_response() {
        let reference: ManifestReference = "1".parse().unwrap();
        let source = AstoDocker::new(Arc::new(MemoryStorage::new())).repo(&name("source"));
        publish(source.as_ref(), "1").await;
        // Origin serves the manifest but none of its blobs.
        let origin = SimpleRepo::new(OriginOnlyManifests(source.manifests()));
        let cache = AstoDocker::new(Arc::new(MemoryStorage::new())).repo(&name("cache"));
        let (sink, mut events) = tokio::sync::mpsc::unbounded_channel();

        let manifests =
            CacheManifests::new(name("test"), origin, cache.clone(), Some(sink), "proxy");
        assert!(manifests.get(&reference).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(events.try_recv().is_err());
        assert!(cache.manifests().get(&reference).await.unwrap().is_none());
    }

    /// Forwards to another manifests store.
    struct OriginOnlyManifests(Arc<dyn Manifests>);

    #[async_trait]
    impl Manifests for OriginOnlyManifests {
        async fn put(&self, reference: &ManifestReference, content: Bytes) -> Result<Manifest> {
            self.0.put(reference, content).await
        }

        async fn get(&self, reference: &ManifestReference) -> Result<Option<Manifest>> {
            self.0.get(reference).await
        }

        async fn tags(&self, from: Option<&Tag>, limit: usize) -> Result<Tags> {
            self.0.tags(from, limit).await
        }
    }

    #[tokio::test]
    async fn test_loads_tags_from_origin_and_cache() {
        let manifests = CacheManifests::new(
            name("tags-test"),
            SimpleRepo::new(FakeManifests::with_tags(vec!["one", "three", "four"])),
            SimpleRepo::new(FakeManifests::with_tags(vec!["one", "two"])),
            None,
            "*",
        );
        let from = Tag::new("four").unwrap();

        let tags = manifests.tags(Some(&from), 3).await.unwrap();

        assert_eq!(tags.name, "tags-test");
        assert_eq!(tags.tags, vec!["one", "three", "two"]);
    }

    #[tokio::test]
    async fn test_tags_survive_faulty_cache() {
        let manifests = CacheManifests::new(
            name("tags-test"),
            SimpleRepo::new(FakeManifests::with_tags(vec!["a", "b"])),
            SimpleRepo::new(FakeManifests::new(Mode::Faulty, "cache")),
            None,
            "*",
        );
        assert_eq!(manifests.tags(None, 10).await.unwrap().tags, vec!["a", "b"]);

        let failing = CacheManifests::new(
            name("tags-test"),
            SimpleRepo::new(FakeManifests::new(Mode::Faulty, "origin")),
            SimpleRepo::new(FakeManifests::with_tags(vec!["a"])),
            None,
            "*",
        );
        assert!(failing.tags(None, 10).await.is_err());
    }

    #[tokio::test]
    async fn test_upload_unsupported() {
        let manifests = CacheManifests::new(
            name("test"),
            SimpleRepo::new(FakeManifests::new(Mode::Empty, "origin")),
            SimpleRepo::new(FakeManifests::new(Mode::Empty, "cache")),
            None,
            "*",
        );
        assert!(matches!(
            manifests
                .put(&"1".parse().unwrap(), Bytes::from_static(b"{}"))
                .await,
            Err(RegistryError::Unsupported(_))
        ));
    }
}
