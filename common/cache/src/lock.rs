//! Distributed mutual-exclusion lock capability and its Redis
//! implementation.
//!
//! Locks are auto-expiring: a record abandoned by a crashed holder is
//! reclaimed by the backend once its expiration passes. Every acquisition
//! carries an ownership token, and release is verified against it on the
//! backend, so a holder whose lock expired mid-computation cannot release
//! the record a newer holder has since created.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use common_redis::{Client as RedisClient, CustomRedisError};

use crate::error::LockError;
use crate::metrics::STALE_LOCK_TOKEN_COUNTER;

/// Ownership token minted by a successful `try_lock`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken(String);

impl LockToken {
    pub fn generate() -> Self {
        LockToken(Uuid::new_v4().to_string())
    }

    pub fn new(raw: impl Into<String>) -> Self {
        LockToken(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Mutual-exclusion lock visible to and enforced across independent
/// processes.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Attempt to acquire the lock for `key` without blocking.
    ///
    /// Returns `Some(token)` iff this caller created the lock record; at
    /// most one caller observes `Some` for a given generation of the lock.
    /// The token is required to release it.
    async fn try_lock(&self, key: &str) -> Result<Option<LockToken>, LockError>;

    /// Release the lock for `key` if it is still held under `token`.
    ///
    /// A token mismatch means the record expired and was re-acquired by
    /// another holder; the record is left in place and the call still
    /// succeeds, since the lock no longer belongs to this holder.
    async fn unlock(&self, key: &str, token: LockToken) -> Result<(), LockError>;
}

/// Redis-backed [`DistributedLock`] with prefix namespacing.
///
/// The lock record is created with `SET .. EX .. NX` storing the ownership
/// token as its payload, and released with an atomic compare-and-delete
/// against that token.
pub struct RedisLocker {
    client: Arc<dyn RedisClient + Send + Sync>,
    prefix: String,
    expiration_seconds: u64,
}

impl RedisLocker {
    /// `expiration` must be chosen large enough to cover the worst-case
    /// duration of the computation the lock protects; if the computation
    /// outlives it, the at-most-one-computation guarantee degrades to
    /// best-effort. Sub-second expirations round up to the one-second
    /// minimum of `SET .. EX`.
    pub fn new(
        client: Arc<dyn RedisClient + Send + Sync>,
        prefix: impl Into<String>,
        expiration: Duration,
    ) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            expiration_seconds: expiration.as_secs().max(1),
        }
    }

    fn redis_key_name(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    fn map_err(err: CustomRedisError) -> LockError {
        LockError::Backend(err.to_string())
    }
}

#[async_trait]
impl DistributedLock for RedisLocker {
    async fn try_lock(&self, key: &str) -> Result<Option<LockToken>, LockError> {
        let token = LockToken::generate();
        let acquired = self
            .client
            .set_nx_ex(
                self.redis_key_name(key),
                token.as_str().to_string(),
                self.expiration_seconds,
            )
            .await
            .map_err(Self::map_err)?;

        Ok(acquired.then_some(token))
    }

    async fn unlock(&self, key: &str, token: LockToken) -> Result<(), LockError> {
        let deleted = self
            .client
            .del_if_eq(self.redis_key_name(key), token.as_str().to_string())
            .await
            .map_err(Self::map_err)?;

        if !deleted {
            metrics::counter!(STALE_LOCK_TOKEN_COUNTER).increment(1);
            tracing::warn!(
                key,
                "lock token no longer current; record expired or was re-acquired"
            );
        }

        Ok(())
    }
}
