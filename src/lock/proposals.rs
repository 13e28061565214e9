//! Lock proposals kept as storage records.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::try_join_all;

use super::lock::{LockError, Result};
use crate::storage::{Content, Key, Storage, StorageError};

/// Root of all lock proposals in a storage.
pub const LOCKS_ROOT: &str = ".artipie-locks";

/// The proposals competing for one target key.
///
/// Each proposal is stored at `.artipie-locks/<target>/<id>`. Its content is
/// empty (never expires) or an RFC 3339 instant after which it no longer
/// counts as a competitor. Nothing purges expired proposals.
pub(crate) struct Proposals {
    storage: Arc<dyn Storage>,
    target: Key,
}

impl Proposals {
    pub(crate) fn new(storage: Arc<dyn Storage>, target: Key) -> Self {
        Self { storage, target }
    }

    /// Directory holding every proposal for the target.
    pub(crate) fn root(target: &Key) -> Key {
        Key::new(LOCKS_ROOT).concat(target)
    }

    /// Key of the proposal with the given id.
    pub(crate) fn key(&self, id: &str) -> Key {
        Self::root(&self.target).join(id)
    }

    /// Store a proposal.
    pub(crate) async fn create(&self, id: &str, expiration: Option<DateTime<Utc>>) -> Result<()> {
        let content = match expiration {
            Some(instant) => Content::from_bytes(format_instant(&instant).into_bytes()),
            None => Content::empty(),
        };
        self.storage.save(&self.key(id), content).await?;
        Ok(())
    }

    /// Check that no proposal other than `id` is live.
    ///
    /// Proposals that vanish between listing and reading are ignored.
    pub(crate) async fn check_single(&self, id: &str) -> Result<()> {
        let now = Utc::now();
        let own = self.key(id);
        let proposals = self.storage.list(&Self::root(&self.target)).await?;
        try_join_all(
            proposals
                .iter()
                .filter(|key| **key != own)
                .map(|proposal| self.check_expired(proposal, &own, &proposals, now)),
        )
        .await?;
        Ok(())
    }

    async fn check_expired(
        &self,
        proposal: &Key,
        own: &Key,
        proposals: &[Key],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let Some(expiration) = self.value_if_present(proposal).await? else {
            return Ok(());
        };
        if is_live(proposal, &expiration, now)? {
            return Err(LockError::Contended {
                own: own.clone(),
                others: proposals.to_vec(),
                live: proposal.clone(),
                expiration,
            });
        }
        Ok(())
    }

    /// Delete the proposal with the given id.
    pub(crate) async fn delete(&self, id: &str) -> Result<()> {
        self.storage.delete(&self.key(id)).await?;
        Ok(())
    }

    async fn value_if_present(&self, key: &Key) -> Result<Option<String>> {
        match self.storage.value(key).await {
            Ok(content) => {
                let bytes = content.into_bytes().await.map_err(StorageError::from)?;
                Ok(Some(String::from_utf8_lossy(&bytes).trim().to_string()))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Format an instant the way proposals store it, e.g. `2020-08-18T13:09:30.429Z`.
pub(crate) fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whether a proposal with the given content still counts at `now`.
fn is_live(key: &Key, expiration: &str, now: DateTime<Utc>) -> Result<bool> {
    if expiration.is_empty() {
        return Ok(true);
    }
    let instant = DateTime::parse_from_rfc3339(expiration).map_err(|_| {
        LockError::InvalidProposal {
            key: key.clone(),
            value: expiration.to_string(),
        }
    })?;
    Ok(instant.with_timezone(&Utc) > now)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_format_instant() {
        let instant = Utc
            .with_ymd_and_hms(2020, 8, 18, 13, 9, 30)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(429))
            .unwrap();
        assert_eq!(format_instant(&instant), "2020-08-18T13:09:30.429Z");

        let whole = Utc.with_ymd_and_hms(2020, 8, 18, 13, 9, 30).unwrap();
        assert_eq!(format_instant(&whole), "2020-08-18T13:09:30.000Z");
    }

    #[test]
    fn test_is_live() {
        let key = Key::new("k");
        let now = Utc::now();
        assert!(is_live(&key, "", now).unwrap());
        assert!(is_live(&key, "2999-01-01T00:00:00Z", now).unwrap());
        assert!(!is_live(&key, "2020-08-18T13:09:30.429Z", now).unwrap());
        assert!(matches!(
            is_live(&key, "tomorrow", now),
            Err(LockError::InvalidProposal { .. })
        ));
    }

    #[test]
    fn test_root_key() {
        assert_eq!(
            Proposals::root(&Key::new("a/b/c")),
            Key::new(".artipie-locks/a/b/c")
        );
    }
}
