//! In-process counter store.
//!
//! Mirrors the Redis semantics the server relies on (atomic INCR keeping an
//! existing TTL, SET NX with expiry, lazy expiration). Time is read from
//! `tokio::time::Instant`, so tests can drive expiry with a paused clock.
//! Single-process only: counters are lost on restart.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::Instant;

use viewcount_core::error::{Result, ViewError};

use super::{millis, CounterStore, WindowSample};

/// Expired slots are swept once the map grows past this size.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Slot {
    value: u64,
    expires_at: Option<Instant>,
}

impl Slot {
    fn live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

#[derive(Debug)]
pub struct MemoryStore {
    slots: DashMap<String, Slot>,
    origin: Instant,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            origin: Instant::now(),
        }
    }

    /// No keys stored, expired ones included until swept.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn read(&self, key: &str, now: Instant) -> Option<u64> {
        let slot = *self.slots.get(key)?;
        if slot.live(now) {
            Some(slot.value)
        } else {
            self.slots.remove_if(key, |_, s| !s.live(now));
            None
        }
    }

    /// INCR with an optional expiry applied only when the key is created.
    fn bump(&self, key: &str, now: Instant, ttl_on_create: Option<Duration>) -> Result<u64> {
        let mut slot = self.slots.entry(key.to_string()).or_insert(Slot {
            value: 0,
            expires_at: None,
        });
        if !slot.live(now) {
            slot.value = 0;
            slot.expires_at = None;
        }
        if slot.value == 0 {
            if let Some(ttl) = ttl_on_create {
                slot.expires_at = Some(now + ttl);
            }
        }
        slot.value = slot
            .value
            .checked_add(1)
            .ok_or_else(|| ViewError::Store(format!("increment would overflow: {key}")))?;
        Ok(slot.value)
    }

    fn maybe_sweep(&self, now: Instant) {
        if self.slots.len() > SWEEP_THRESHOLD {
            self.slots.retain(|_, s| s.live(now));
            tracing::debug!(len = self.slots.len(), "memory store swept expired keys");
        }
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<u64>> {
        Ok(self.read(key, Instant::now()))
    }

    async fn incr(&self, key: &str) -> Result<u64> {
        self.bump(key, Instant::now(), None)
    }

    async fn set_ex(&self, key: &str, value: u64, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        self.maybe_sweep(now);
        self.slots.insert(
            key.to_string(),
            Slot {
                value,
                expires_at: Some(now + ttl),
            },
        );
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: u64, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        self.maybe_sweep(now);
        let slot = Slot {
            value,
            expires_at: Some(now + ttl),
        };
        match self.slots.entry(key.to_string()) {
            Entry::Occupied(mut e) => {
                if e.get().live(now) {
                    return Ok(false);
                }
                e.insert(slot);
                Ok(true)
            }
            Entry::Vacant(e) => {
                e.insert(slot);
                Ok(true)
            }
        }
    }

    async fn window_hit(&self, key: &str, window: Duration) -> Result<WindowSample> {
        let now = Instant::now();
        self.maybe_sweep(now);

        let window_ms = millis(window);
        let since_origin = now.duration_since(self.origin).as_millis() as u64;
        let bucket = since_origin / window_ms;

        let current = self.bump(&format!("{key}:{bucket}"), now, Some(window * 2))?;
        let previous = match bucket.checked_sub(1) {
            Some(prev) => self.read(&format!("{key}:{prev}"), now).unwrap_or(0),
            None => 0,
        };

        Ok(WindowSample {
            previous,
            current,
            elapsed: Duration::from_millis(since_origin % window_ms),
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
