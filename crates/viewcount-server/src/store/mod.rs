//! Counter store abstraction.
//!
//! All shared state (view counters, dedup markers, rate-limit buckets) lives
//! behind [`CounterStore`]. Implementations must perform `incr`, `set_nx_ex`
//! and `window_hit` atomically on the store side; the server never does a
//! read-modify-write itself.
//!
//! - `redis_store`: production backend (one multiplexed connection per process)
//! - `memory`: in-process backend for local runs and tests
//! - `observed`: decorator recording per-operation latency and errors

pub mod keys;
pub mod memory;
pub mod observed;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;
use viewcount_core::Result;

pub use keys::KeySpace;
pub use memory::MemoryStore;
pub use observed::ObservedStore;
pub use redis_store::RedisStore;

/// Snapshot of a sliding-window key after one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSample {
    /// Hits recorded in the previous fixed window.
    pub previous: u64,
    /// Hits recorded in the current fixed window, including this one.
    pub current: u64,
    /// Time elapsed since the current fixed window started.
    pub elapsed: Duration,
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Numeric value of `key`, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<u64>>;

    /// Atomically add 1 and return the new value (absent keys start at 0).
    async fn incr(&self, key: &str) -> Result<u64>;

    /// Unconditionally set `key` with a time-to-live.
    async fn set_ex(&self, key: &str, value: u64, ttl: Duration) -> Result<()>;

    /// Set `key` only when absent. Returns `true` if this call created it.
    async fn set_nx_ex(&self, key: &str, value: u64, ttl: Duration) -> Result<bool>;

    /// Record one hit on the fixed-window bucket of `key` for the store's
    /// current time and report the current and previous bucket counts.
    async fn window_hit(&self, key: &str, window: Duration) -> Result<WindowSample>;

    /// Liveness probe.
    async fn ping(&self) -> Result<()>;
}

/// Clamp a duration to whole milliseconds, at least 1.
pub(crate) fn millis(d: Duration) -> u64 {
    (d.as_millis() as u64).max(1)
}
