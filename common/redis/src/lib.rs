use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

// Re-export ErrorKind so consumers can construct CustomRedisError in tests
pub use redis::ErrorKind as RedisErrorKind;

#[derive(Error, Debug, Clone)]
pub enum CustomRedisError {
    #[error("Not found in redis")]
    NotFound,
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout error")]
    Timeout,
    #[error(transparent)]
    Redis(#[from] Arc<redis::RedisError>),
}

impl From<redis::RedisError> for CustomRedisError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            CustomRedisError::Timeout
        } else {
            CustomRedisError::Redis(Arc::new(err))
        }
    }
}

impl From<std::string::FromUtf8Error> for CustomRedisError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        CustomRedisError::ParseError(err.to_string())
    }
}

impl CustomRedisError {
    /// Create a Redis error from an ErrorKind (primarily for testing)
    pub fn from_redis_kind(kind: redis::ErrorKind, description: &'static str) -> Self {
        CustomRedisError::Redis(Arc::new(redis::RedisError::from((kind, description))))
    }
}

/// The subset of Redis commands the cache layer is built on.
///
/// Only the commands we actually use are exposed, which keeps the mock
/// implementable by hand and lets tests inject failures per command.
#[async_trait]
pub trait Client {
    async fn get(&self, k: String) -> Result<String, CustomRedisError>;
    async fn set(&self, k: String, v: String) -> Result<(), CustomRedisError>;
    async fn setex(&self, k: String, v: String, seconds: u64) -> Result<(), CustomRedisError>;
    /// Atomic set-if-absent with expiry (`SET k v EX seconds NX`). Returns
    /// whether this call created the key.
    async fn set_nx_ex(&self, k: String, v: String, seconds: u64)
        -> Result<bool, CustomRedisError>;
    async fn del(&self, k: String) -> Result<(), CustomRedisError>;
    /// Atomic compare-and-delete: removes the key only when its current
    /// value equals `v`. Returns whether a key was deleted.
    async fn del_if_eq(&self, k: String, v: String) -> Result<bool, CustomRedisError>;
}

// Module declarations
mod client;
mod mock;

// Re-export public APIs
pub use client::RedisClient;
pub use mock::{MockRedisCall, MockRedisClient, MockRedisValue};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = CustomRedisError::NotFound;
        assert_eq!(err.to_string(), "Not found in redis");
    }

    #[test]
    fn test_from_redis_kind_wraps_redis_error() {
        let err = CustomRedisError::from_redis_kind(redis::ErrorKind::IoError, "test error");
        assert!(matches!(err, CustomRedisError::Redis(_)));
    }

    #[test]
    fn test_utf8_error_maps_to_parse_error() {
        let invalid = vec![0xf0, 0x28, 0x8c, 0x28];
        let err: CustomRedisError = String::from_utf8(invalid).unwrap_err().into();
        assert!(matches!(err, CustomRedisError::ParseError(_)));
    }
}
