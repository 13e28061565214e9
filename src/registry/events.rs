//! Audit events emitted when artifacts land in a cache.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

/// Owner recorded when the acting user is not known.
pub const DEFAULT_OWNER: &str = "UNKNOWN";

/// What happened to the artifact. Caches only ever add artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Insert,
}

/// One artifact added to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactEvent {
    pub repo_type: String,
    pub repo_name: String,
    pub owner: String,
    pub artifact_name: String,
    pub version: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub event_type: EventType,
}

impl ArtifactEvent {
    /// An insert event stamped with the current time.
    pub fn insert(
        repo_type: impl Into<String>,
        repo_name: impl Into<String>,
        owner: impl Into<String>,
        artifact_name: impl Into<String>,
        version: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            repo_type: repo_type.into(),
            repo_name: repo_name.into(),
            owner: owner.into(),
            artifact_name: artifact_name.into(),
            version: version.into(),
            size,
            created_at: Utc::now().timestamp_millis(),
            event_type: EventType::Insert,
        }
    }
}

/// Queue accepting artifact events. Delivery is best effort.
pub type EventSink = UnboundedSender<ArtifactEvent>;

/// Send an event, logging when the receiving side is gone.
pub(crate) fn publish(sink: Option<&EventSink>, event: ArtifactEvent) {
    if let Some(sink) = sink {
        if let Err(e) = sink.send(event) {
            warn!(artifact = %e.0.artifact_name, "artifact event queue closed, event dropped");
        }
    }
}
