//! Error taxonomy for the cache layer.
//!
//! `StorageError::NotFound` is an internal signal between the storage
//! capability and the coordinator; the coordinator never returns it to its
//! caller (a miss either resolves to a value or to one of the terminal
//! variants of [`CacheError`]).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("item identified by the given key does not exist")]
    NotFound,
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum LockError {
    #[error("lock backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("compute function failed: {0}")]
    Compute(#[source] anyhow::Error),
    #[error("serialization error: {0}")]
    Serialization(#[source] anyhow::Error),
    #[error("deserialization error: {0}")]
    Deserialization(#[source] anyhow::Error),
    #[error("cancelled while waiting for the value to be published")]
    Cancelled,
    #[error("the value could not be retrieved within the allotted retries")]
    RetriesExhausted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_converts_to_cache_error() {
        let err: CacheError = StorageError::Backend("connection refused".to_string()).into();
        assert!(matches!(
            err,
            CacheError::Storage(StorageError::Backend(_))
        ));
        assert_eq!(err.to_string(), "storage backend error: connection refused");
    }

    #[test]
    fn test_compute_error_preserves_source() {
        let err = CacheError::Compute(anyhow::anyhow!("db unreachable"));
        assert_eq!(err.to_string(), "compute function failed: db unreachable");
    }

    #[test]
    fn test_cancelled_and_exhausted_are_distinct() {
        assert_ne!(
            CacheError::Cancelled.to_string(),
            CacheError::RetriesExhausted.to_string()
        );
    }
}
