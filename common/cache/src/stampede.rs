//! Stampede-safe get-or-compute coordination.
//!
//! [`StampedeCache`] implements the cache-aside pattern with cross-process
//! stampede prevention. On a miss, callers race for a distributed lock;
//! the single winner computes the value, publishes it to storage and
//! releases the lock, while every other caller polls storage on a bounded,
//! cancellable wait loop until the value appears.
//!
//! The coordinator holds no in-process shared mutable state and requires no
//! internal synchronization: mutual exclusion is delegated entirely to the
//! [`DistributedLock`] capability, and every storage check is a fresh
//! round-trip (a client-side snapshot could go stale between steps and
//! break the at-most-one-computation guarantee).

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{CacheError, StorageError};
use crate::lock::DistributedLock;
use crate::metrics::{
    CACHE_COMPUTE_COUNTER, CACHE_HIT_COUNTER, CACHE_READ_COUNTER, CANCELLED_COUNTER,
    LOCK_ACQUIRED_COUNTER, LOCK_CONTENDED_COUNTER, POLL_EXHAUSTED_COUNTER, UNLOCK_FAILED_COUNTER,
};
use crate::storage::CacheStorage;
use crate::value::StringSerializable;

/// Cache-aside coordinator over a [`CacheStorage`] and a
/// [`DistributedLock`].
///
/// The coordinator owns neither backend; both are shared resources that
/// arbitrarily many coordinator instances, in this process or others, may
/// touch for the same keys.
pub struct StampedeCache<V> {
    storage: Arc<dyn CacheStorage>,
    locker: Arc<dyn DistributedLock>,
    _value: PhantomData<fn() -> V>,
}

impl<V> StampedeCache<V>
where
    V: StringSerializable + Send,
{
    pub fn new(storage: Arc<dyn CacheStorage>, locker: Arc<dyn DistributedLock>) -> Self {
        Self {
            storage,
            locker,
            _value: PhantomData,
        }
    }

    /// Return the value associated with `key`, computing and storing it if
    /// no value exists yet.
    ///
    /// Exactly one concurrent caller per key invokes `compute` (as long as
    /// the lock's expiration covers the computation); the others poll
    /// storage up to `max_retries` times, sleeping `retry_wait` before each
    /// poll. The sleep is the only cancellable wait point: cancelling
    /// `cancel` there aborts with [`CacheError::Cancelled`], and exhausting
    /// the polls fails with [`CacheError::RetriesExhausted`] without
    /// retrying the whole call.
    ///
    /// `key` is an opaque non-empty identifier; namespacing is the
    /// backends' concern.
    pub async fn get_or_set_if_does_not_exist<F, Fut>(
        &self,
        cancel: &CancellationToken,
        key: &str,
        max_retries: u32,
        retry_wait: Duration,
        compute: F,
    ) -> Result<V, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        metrics::counter!(CACHE_READ_COUNTER).increment(1);

        match self.storage.get(key).await {
            Ok(raw) => {
                tracing::debug!(key, "cache hit");
                metrics::counter!(CACHE_HIT_COUNTER, "source" => "fast_path").increment(1);
                return Self::deserialize(&raw);
            }
            Err(StorageError::NotFound) => {}
            Err(err) => return Err(err.into()),
        }

        let Some(token) = self.locker.try_lock(key).await? else {
            // Another holder is computing the value concurrently; it should
            // become readable once that holder publishes it.
            metrics::counter!(LOCK_CONTENDED_COUNTER).increment(1);
            return self
                .wait_for_published_value(cancel, key, max_retries, retry_wait)
                .await;
        };

        tracing::debug!(key, "cache lock acquired");
        metrics::counter!(LOCK_ACQUIRED_COUNTER).increment(1);

        // The lock is released on every exit path of the critical section,
        // including compute, serialization and store failures. An unlock
        // failure is observed but never masks the section's result; the
        // abandoned record is reclaimed by the backend's expiration.
        let result = self.compute_and_store(key, compute).await;
        if let Err(err) = self.locker.unlock(key, token).await {
            metrics::counter!(UNLOCK_FAILED_COUNTER).increment(1);
            tracing::warn!(key, error = %err, "failed to release cache lock");
        }
        result
    }

    /// Invalidate the cache entry for `key`.
    ///
    /// Forwards directly to storage; the lock is not involved.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        Ok(self.storage.delete(key).await?)
    }

    // Critical section of the lock winner: re-check, compute, publish.
    async fn compute_and_store<F, Fut>(&self, key: &str, compute: F) -> Result<V, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        // Between the fast-path check and winning the lock another holder
        // may have already published the value, so storage has to be
        // checked again.
        match self.storage.get(key).await {
            Ok(raw) => {
                tracing::debug!(key, "value published before lock was acquired");
                metrics::counter!(CACHE_HIT_COUNTER, "source" => "recheck").increment(1);
                return Self::deserialize(&raw);
            }
            Err(StorageError::NotFound) => {}
            Err(err) => return Err(err.into()),
        }

        metrics::counter!(CACHE_COMPUTE_COUNTER).increment(1);
        let value = compute().await.map_err(CacheError::Compute)?;
        let raw = value
            .serialize_to_string()
            .map_err(CacheError::Serialization)?;
        self.storage.set(key, &raw).await?;

        Ok(value)
    }

    // Poll loop for callers that lost the lock race.
    async fn wait_for_published_value(
        &self,
        cancel: &CancellationToken,
        key: &str,
        max_retries: u32,
        retry_wait: Duration,
    ) -> Result<V, CacheError> {
        for _ in 0..max_retries {
            tokio::select! {
                _ = cancel.cancelled() => {
                    metrics::counter!(CANCELLED_COUNTER).increment(1);
                    return Err(CacheError::Cancelled);
                }
                _ = tokio::time::sleep(retry_wait) => {}
            }

            match self.storage.get(key).await {
                Ok(raw) => {
                    metrics::counter!(CACHE_HIT_COUNTER, "source" => "poll").increment(1);
                    return Self::deserialize(&raw);
                }
                Err(StorageError::NotFound) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        metrics::counter!(POLL_EXHAUSTED_COUNTER).increment(1);
        Err(CacheError::RetriesExhausted)
    }

    fn deserialize(raw: &str) -> Result<V, CacheError> {
        V::deserialize_from_string(raw).map_err(CacheError::Deserialization)
    }
}
