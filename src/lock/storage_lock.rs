use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::lock::{Lock, Result};
use super::proposals::Proposals;
use crate::storage::{Key, Storage};

/// A lock built only from storage operations (save, list, value, delete).
///
/// [`acquire`](Lock::acquire) writes a proposal
/// `.artipie-locks/<target>/<id>`, lists the sibling proposals and fails,
/// withdrawing its own proposal, if any sibling is still live: empty content
/// never expires, an instant counts until it passes, unreadable (vanished)
/// proposals do not count. On success the proposal stays in place as the lock
/// record until [`release`](Lock::release) deletes it.
///
/// # Race window
///
/// Acquisition is check-then-act over a listing, with no single arbiter. Two
/// proposals written in close succession can each list an empty set of
/// competitors before the other write is visible, and both acquisitions then
/// succeed. This lock gives best-effort exclusion between cooperating
/// writers, not linearizable mutual exclusion.
pub struct StorageLock {
    proposals: Proposals,
    id: String,
    expiration: Option<DateTime<Utc>>,
}

impl StorageLock {
    /// A lock on `target` with a random proposal id that never expires.
    pub fn new(storage: Arc<dyn Storage>, target: Key) -> Self {
        Self::with_id(storage, target, uuid::Uuid::new_v4().to_string(), None)
    }

    /// A lock on `target` with a random proposal id that stops counting as a
    /// competitor after `expiration`.
    pub fn with_expiration(
        storage: Arc<dyn Storage>,
        target: Key,
        expiration: DateTime<Utc>,
    ) -> Self {
        Self::with_id(
            storage,
            target,
            uuid::Uuid::new_v4().to_string(),
            Some(expiration),
        )
    }

    /// A lock on `target` using a caller-chosen proposal id.
    pub fn with_id(
        storage: Arc<dyn Storage>,
        target: Key,
        id: impl Into<String>,
        expiration: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            proposals: Proposals::new(storage, target),
            id: id.into(),
            expiration,
        }
    }

    /// The id of this lock's proposal.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The storage key of this lock's proposal.
    pub fn proposal_key(&self) -> Key {
        self.proposals.key(&self.id)
    }
}

#[async_trait]
impl Lock for StorageLock {
    async fn acquire(&self) -> Result<()> {
        self.proposals.create(&self.id, self.expiration).await?;
        if let Err(e) = self.proposals.check_single(&self.id).await {
            if let Err(delete_err) = self.proposals.delete(&self.id).await {
                warn!(
                    proposal = %self.proposal_key(),
                    error = %delete_err,
                    "failed to withdraw lock proposal"
                );
            }
            return Err(e);
        }
        debug!(proposal = %self.proposal_key(), "lock acquired");
        Ok(())
    }

    async fn release(&self) -> Result<()> {
        self.proposals.delete(&self.id).await?;
        debug!(proposal = %self.proposal_key(), "lock released");
        Ok(())
    }
}
