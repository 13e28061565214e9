use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::cache_layers::CacheLayers;
use super::cache_manifests::CacheManifests;
use super::docker::{Docker, Layers, Manifests, Repo};
use super::error::Result;
use super::events::EventSink;
use super::listing::{join_page, Catalog};
use super::types::RepoName;

/// A repository pairing an origin with a cache: layers come from the cache
/// first, manifests from the origin first.
pub struct CacheRepo {
    name: RepoName,
    origin: Arc<dyn Repo>,
    cache: Arc<dyn Repo>,
    events: Option<EventSink>,
    registry: String,
}

impl CacheRepo {
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
}

impl Repo for CacheRepo {
    fn layers(&self) -> Arc<dyn Layers> {
        Arc::new(CacheLayers::new(self.origin.layers(), self.cache.layers()))
    }

    fn manifests(&self) -> Arc<dyn Manifests> {
        Arc::new(CacheManifests::new(
            self.name.clone(),
            self.origin.clone(),
            self.cache.clone(),
            self.events.clone(),
            self.registry.clone(),
        ))
    }
}

/// A caching proxy registry over an origin registry.
pub struct CacheDocker {
    origin: Arc<dyn Docker>,
    cache: Arc<dyn Docker>,
    events: Option<EventSink>,
    registry: String,
}

impl CacheDocker {
    /// `registry` names this proxy in published artifact events.
    pub fn new(
        origin: Arc<dyn Docker>,
        cache: Arc<dyn Docker>,
        events: Option<EventSink>,
        registry: impl Into<String>,
    ) -> Self {
        Self {
            origin,
            cache,
            events,
            registry: registry.into(),
        }
    }
}

#[async_trait]
impl Docker for CacheDocker {
    fn repo(&self, name: &RepoName) -> Arc<dyn Repo> {
        Arc::new(CacheRepo::new(
            name.clone(),
            self.origin.repo(name),
            self.cache.repo(name),
            self.events.clone(),
            self.registry.clone(),
        ))
    }

    /// Origin names first, then cached names the origin did not list.
    async fn catalog(&self, from: Option<&RepoName>, limit: usize) -> Result<Catalog> {
        let origin = self.origin.catalog(from, limit).await?;
        let cache = match self.cache.catalog(from, limit).await {
            Ok(catalog) => catalog.repositories,
            Err(e) => {
                warn!(error = %e, "cache failed to list repositories");
                Vec::new()
            }
        };
        Ok(Catalog::new(join_page(
            origin.repositories,
            cache,
            from.map(RepoName::as_str),
            limit,
        )))
    }
}
