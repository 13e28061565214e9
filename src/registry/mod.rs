//! Docker registry storage and its caching proxy.
//!
//! [`AstoDocker`] keeps a registry in a [`Storage`](crate::storage::Storage)
//! using the docker-distribution layout. [`CacheDocker`] fronts an origin
//! registry with a cache registry:
//!
//! - layers are served from the cache when present, otherwise from the origin
//! - manifests are served from the origin and replicated into the cache in
//!   the background, with the cache as fallback
//! - tag lists and catalogs merge one page from each side
//!
//! Uploads through the caching proxy fail with [`RegistryError::Unsupported`].

mod asto;
mod cache_docker;
mod cache_layers;
mod cache_manifests;
mod docker;
mod error;
pub mod events;
mod layout;
mod listing;
mod manifest;
mod types;

pub use asto::{AstoDocker, AstoLayers, AstoManifests, AstoRepo, BlobStore};
pub use cache_docker::{CacheDocker, CacheRepo};
pub use cache_layers::CacheLayers;
pub use cache_manifests::CacheManifests;
pub use docker::{Blob, BlobSource, Docker, Layers, Manifests, Repo};
pub use error::{RegistryError, Result};
pub use events::{ArtifactEvent, EventSink, EventType};
pub use listing::{join_page, Catalog, Tags};
pub use manifest::{Layer, Manifest, MEDIA_TYPE_DOCKER_V2, MEDIA_TYPE_OCI_V1};
pub use types::{Digest, ManifestReference, RepoName, Tag};
