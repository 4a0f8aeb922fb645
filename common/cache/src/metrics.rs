//! Metric name constants for cache coordination.
//!
//! Counters are emitted by the coordinator and the Redis locker; they never
//! alter control flow.

pub const CACHE_READ_COUNTER: &str = "locked_cache_reads_total";
/// Labeled with `source`: `fast_path`, `recheck` or `poll`.
pub const CACHE_HIT_COUNTER: &str = "locked_cache_hit_total";
pub const CACHE_COMPUTE_COUNTER: &str = "locked_cache_compute_total";
pub const LOCK_ACQUIRED_COUNTER: &str = "locked_cache_lock_acquired_total";
pub const LOCK_CONTENDED_COUNTER: &str = "locked_cache_lock_contended_total";
pub const POLL_EXHAUSTED_COUNTER: &str = "locked_cache_poll_exhausted_total";
pub const CANCELLED_COUNTER: &str = "locked_cache_cancelled_total";
pub const UNLOCK_FAILED_COUNTER: &str = "locked_cache_unlock_failed_total";
pub const STALE_LOCK_TOKEN_COUNTER: &str = "locked_cache_stale_lock_token_total";
