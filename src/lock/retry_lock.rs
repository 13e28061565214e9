use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::lock::{Lock, Result};

/// Number of attempts made for each operation.
const MAX_ATTEMPTS: u32 = 3;

/// Delay before the second attempt; each later delay grows by half.
const INITIAL_DELAY: Duration = Duration::from_millis(500);

/// A [`Lock`] decorator retrying failed operations.
///
/// Both `acquire` and `release` are attempted up to three times: once
/// immediately, then after 500 ms, then after a further 750 ms. The error of
/// the last attempt is returned.
pub struct RetryLock {
    origin: Arc<dyn Lock>,
}

impl RetryLock {
    pub fn new(origin: Arc<dyn Lock>) -> Self {
        Self { origin }
    }

    async fn retry<'a, F, Fut>(&'a self, operation: &str, attempt: F) -> Result<()>
    where
        F: Fn(&'a dyn Lock) -> Fut,
        Fut: std::future::Future<Output = Result<()>> + 'a,
    {
        let mut delay = INITIAL_DELAY;
        let mut tries = 1;
        loop {
            match attempt(self.origin.as_ref()).await {
                Ok(()) => return Ok(()),
                Err(e) if tries >= MAX_ATTEMPTS => return Err(e),
                Err(e) => {
                    debug!(operation, attempt = tries, error = %e, "lock operation failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay = delay * 3 / 2;
                    tries += 1;
                }
            }
        }
    }
}

#[async_trait]
impl Lock for RetryLock {
    async fn acquire(&self) -> Result<()> {
        self.retry("acquire", |lock| lock.acquire()).await
    }

    async fn release(&self) -> Result<()> {
        self.retry("release", |lock| lock.release()).await
    }
}
