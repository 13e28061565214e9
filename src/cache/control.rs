//! Freshness validation for cached items.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

use super::cache::Result;
use super::remote::Remote;
use crate::storage::Key;
use crate::util::DigestAlgorithm;

/// Decides whether a previously obtained item may be served without refetching.
///
/// `content` yields the item under validation, so a policy can inspect the
/// bytes (e.g. hash them) without the cache prescribing how they are read.
#[async_trait]
pub trait CacheControl: Send + Sync {
    /// Whether the item stored under `key` is still valid.
    async fn validate(&self, key: &Key, content: &dyn Remote) -> Result<bool>;
}

/// The two trivial policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standard {
    /// Never trust a cached item; always refetch.
    Never,
    /// Always trust a cached item once it exists.
    Always,
}

#[async_trait]
impl CacheControl for Standard {
    async fn validate(&self, _key: &Key, _content: &dyn Remote) -> Result<bool> {
        Ok(matches!(self, Standard::Always))
    }
}

/// Valid when the hash of the supplied content equals an expected digest.
///
/// The content is taken from whatever `Remote` the caller passes to
/// [`CacheControl::validate`]; it is not read from the cache by this policy.
pub struct DigestVerification {
    algorithm: DigestAlgorithm,
    expected: String,
}

impl DigestVerification {
    /// Expect `expected` (hex, case-insensitive) under `algorithm`.
    pub fn new(algorithm: DigestAlgorithm, expected: impl Into<String>) -> Self {
        Self {
            algorithm,
            expected: expected.into().to_ascii_lowercase(),
        }
    }
}

#[async_trait]
impl CacheControl for DigestVerification {
    async fn validate(&self, key: &Key, content: &dyn Remote) -> Result<bool> {
        let Some(content) = content.get().await? else {
            return Ok(false);
        };
        let actual = self.algorithm.hex_content(content).await?;
        let valid = actual == self.expected;
        if !valid {
            debug!(
                key = %key,
                algorithm = %self.algorithm,
                expected = %self.expected,
                actual = %actual,
                "digest mismatch"
            );
        }
        Ok(valid)
    }
}

/// Valid only when every child policy reports valid.
///
/// All children are evaluated concurrently and every one of them is invoked;
/// there is no short-circuit. Any child error fails the whole validation.
pub struct All {
    controls: Vec<Arc<dyn CacheControl>>,
}

impl All {
    pub fn new(controls: Vec<Arc<dyn CacheControl>>) -> Self {
        Self { controls }
    }
}

#[async_trait]
impl CacheControl for All {
    async fn validate(&self, key: &Key, content: &dyn Remote) -> Result<bool> {
        let results = join_all(
            self.controls
                .iter()
                .map(|control| control.validate(key, content)),
        )
        .await;
        let mut valid = true;
        for result in results {
            valid &= result?;
        }
        Ok(valid)
    }
}
