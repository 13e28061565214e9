use bytes::Bytes;
use serde::Deserialize;

use super::error::{RegistryError, Result};
use super::types::Digest;
use crate::storage::Content;

/// Docker image manifest, schema version 2.
pub const MEDIA_TYPE_DOCKER_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// OCI image manifest, version 1.
pub const MEDIA_TYPE_OCI_V1: &str = "application/vnd.oci.image.manifest.v1+json";

/// Manifest media types whose blobs can be replicated.
pub const SUPPORTED_MEDIA_TYPES: [&str; 2] = [MEDIA_TYPE_DOCKER_V2, MEDIA_TYPE_OCI_V1];

/// An image manifest: raw JSON bytes plus the digest they are stored under.
///
/// The JSON is parsed on demand, so a manifest with an unreadable body can
/// still be carried around and served as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    digest: Digest,
    content: Bytes,
}

/// A blob referenced by a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub digest: Digest,
    pub size: u64,
    /// External locations serving the blob; when non-empty the blob is not
    /// expected in the registry itself.
    pub urls: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    media_type: Option<String>,
    config: Option<Descriptor>,
    #[serde(default)]
    layers: Vec<Descriptor>,
}

#[derive(Deserialize)]
struct Descriptor {
    digest: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    urls: Vec<String>,
}

impl Manifest {
    pub fn new(digest: Digest, content: impl Into<Bytes>) -> Self {
        Self {
            digest,
            content: content.into(),
        }
    }

    /// A manifest stored under the sha256 digest of its bytes.
    pub fn from_bytes(content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self::new(Digest::sha256_of(&content), content)
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn bytes(&self) -> &Bytes {
        &self.content
    }

    pub fn content(&self) -> Content {
        Content::from_bytes(self.content.clone())
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    fn document(&self) -> Result<Document> {
        serde_json::from_slice(&self.content)
            .map_err(|e| RegistryError::InvalidManifest(format!("failed to parse manifest: {}", e)))
    }

    /// The `mediaType` field, if present and non-empty.
    pub fn media_type(&self) -> Result<Option<String>> {
        Ok(self.document()?.media_type.filter(|t| !t.is_empty()))
    }

    /// Digest of the image config blob.
    pub fn config(&self) -> Result<Digest> {
        let config = self
            .document()?
            .config
            .ok_or_else(|| RegistryError::InvalidManifest("missing `config`".to_string()))?;
        config.digest.parse()
    }

    /// The layers in manifest order.
    pub fn layers(&self) -> Result<Vec<Layer>> {
        self.document()?
            .layers
            .into_iter()
            .map(|layer| {
                Ok(Layer {
                    digest: layer.digest.parse()?,
                    size: layer.size,
                    urls: layer.urls,
                })
            })
            .collect()
    }

    /// Whether the media type is one whose blobs can be replicated. An
    /// unparseable body is not supported.
    pub fn is_supported(&self) -> bool {
        matches!(
            self.media_type(),
            Ok(Some(media_type)) if SUPPORTED_MEDIA_TYPES.contains(&media_type.as_str())
        )
    }
}
