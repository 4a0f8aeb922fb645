//! Key/value storage capability and its Redis implementation.

use async_trait::async_trait;
use std::sync::Arc;

use common_redis::{Client as RedisClient, CustomRedisError};

use crate::error::StorageError;

/// Key/value storage for serialized cache entries.
///
/// Implementations are shared, externally-synchronized resources; arbitrarily
/// many coordinator instances (in one or many processes) may operate on the
/// same keys concurrently. `set` is an unconditional overwrite with no
/// compare-and-swap semantics; the backend resolves concurrent writes to
/// some total order and the last writer under that order wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Fetch the serialized value for `key`, or `StorageError::NotFound`
    /// when no entry exists.
    async fn get(&self, key: &str) -> Result<String, StorageError>;

    /// Create or overwrite the entry for `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the entry for `key`. Succeeds when the entry is absent.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Redis-backed [`CacheStorage`] with prefix namespacing.
///
/// Entries are stored without expiry by default; `with_ttl` opts into a
/// backend-level TTL per entry. The coordinator on top never expires
/// entries itself.
pub struct RedisCacheStorage {
    client: Arc<dyn RedisClient + Send + Sync>,
    prefix: String,
    ttl_seconds: Option<u64>,
}

impl RedisCacheStorage {
    pub fn new(client: Arc<dyn RedisClient + Send + Sync>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            ttl_seconds: None,
        }
    }

    pub fn with_ttl(
        client: Arc<dyn RedisClient + Send + Sync>,
        prefix: impl Into<String>,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            ttl_seconds: Some(ttl_seconds),
        }
    }

    fn redis_key_name(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    fn map_err(err: CustomRedisError) -> StorageError {
        match err {
            CustomRedisError::NotFound => StorageError::NotFound,
            other => StorageError::Backend(other.to_string()),
        }
    }
}

#[async_trait]
impl CacheStorage for RedisCacheStorage {
    async fn get(&self, key: &str) -> Result<String, StorageError> {
        self.client
            .get(self.redis_key_name(key))
            .await
            .map_err(Self::map_err)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let redis_key = self.redis_key_name(key);
        let result = match self.ttl_seconds {
            Some(ttl) => self.client.setex(redis_key, value.to_string(), ttl).await,
            None => self.client.set(redis_key, value.to_string()).await,
        };
        result.map_err(Self::map_err)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .del(self.redis_key_name(key))
            .await
            .map_err(Self::map_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_redis::{MockRedisClient, RedisErrorKind};

    fn storage_over(mock: MockRedisClient) -> RedisCacheStorage {
        RedisCacheStorage::new(Arc::new(mock), "storage-test")
    }

    #[tokio::test]
    async fn test_get_returns_stored_value() {
        let mut mock = MockRedisClient::new();
        mock.get_ret("storage-test:user", Ok("serialized".to_string()));

        let storage = storage_over(mock);

        let value = storage.get("user").await.unwrap();
        assert_eq!(value, "serialized");
    }

    #[tokio::test]
    async fn test_get_translates_not_found() {
        let storage = storage_over(MockRedisClient::new());

        let result = storage.get("does-not-exist").await;
        assert!(matches!(result, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn test_get_translates_backend_error() {
        let mut mock = MockRedisClient::new();
        mock.get_ret(
            "storage-test:user",
            Err(CustomRedisError::from_redis_kind(
                RedisErrorKind::IoError,
                "connection refused",
            )),
        );

        let storage = storage_over(mock);

        let result = storage.get("user").await;
        assert!(matches!(result, Err(StorageError::Backend(_))));
    }

    #[tokio::test]
    async fn test_set_uses_prefixed_key() {
        let mock = MockRedisClient::new();
        let storage = storage_over(mock.clone());

        storage.set("user", "serialized").await.unwrap();

        let calls = mock.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].op, "set");
        assert_eq!(calls[0].key, "storage-test:user");
    }

    #[tokio::test]
    async fn test_set_with_ttl_uses_setex() {
        let mock = MockRedisClient::new();
        let storage = RedisCacheStorage::with_ttl(Arc::new(mock.clone()), "storage-test", 300);

        storage.set("user", "serialized").await.unwrap();

        let calls = mock.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].op, "setex");
        assert_eq!(calls[0].key, "storage-test:user");
    }

    #[tokio::test]
    async fn test_delete_is_ok_when_absent() {
        let mock = MockRedisClient::new();
        let storage = storage_over(mock.clone());

        storage.delete("never-written").await.unwrap();

        let calls = mock.get_calls();
        assert_eq!(calls[0].op, "del");
        assert_eq!(calls[0].key, "storage-test:never-written");
    }
}
