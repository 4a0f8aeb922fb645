//! Stampede-safe, distributed cache-aside coordination.
//!
//! This crate implements the cache-aside pattern with cross-process
//! stampede prevention: a caller asks for a value by key; on a miss,
//! exactly one caller (across possibly many processes) computes and stores
//! the value while every other concurrent caller for the same key waits
//! and then reads the freshly stored value instead of recomputing it.
//!
//! The coordinator is built on two injected capabilities:
//!
//! - [`CacheStorage`]: get/set/delete of serialized values by key
//! - [`DistributedLock`]: a named, auto-expiring, token-verified
//!   mutual-exclusion lock
//!
//! plus a [`StringSerializable`] contract for the cached value type.
//! Redis-backed implementations of both capabilities are provided
//! ([`RedisCacheStorage`], [`RedisLocker`]) on top of `common_redis`.
//!
//! # Example
//!
//! ```rust,ignore
//! use common_cache::{RedisCacheStorage, RedisLocker, StampedeCache};
//!
//! let storage = Arc::new(RedisCacheStorage::new(client.clone(), "users"));
//! let locker = Arc::new(RedisLocker::new(client, "users-lock", Duration::from_secs(5)));
//! let cache: StampedeCache<User> = StampedeCache::new(storage, locker);
//!
//! let user = cache
//!     .get_or_set_if_does_not_exist(&cancel, &user_id, 5, Duration::from_millis(100), || async {
//!         load_user_from_database(user_id).await
//!     })
//!     .await?;
//! ```

pub mod error;
pub mod lock;
pub mod metrics;
pub mod stampede;
pub mod storage;
pub mod value;

pub use error::{CacheError, LockError, StorageError};
pub use lock::{DistributedLock, LockToken, RedisLocker};
pub use stampede::StampedeCache;
pub use storage::{CacheStorage, RedisCacheStorage};
pub use value::StringSerializable;
