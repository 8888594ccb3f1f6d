//! Store decorator that records latency and failures per operation.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use viewcount_core::Result;

use super::{CounterStore, WindowSample};
use crate::obs::ViewMetrics;

pub struct ObservedStore {
    inner: Arc<dyn CounterStore>,
    metrics: Arc<ViewMetrics>,
}

impl ObservedStore {
    pub fn new(inner: Arc<dyn CounterStore>, metrics: Arc<ViewMetrics>) -> Self {
        Self { inner, metrics }
    }

    async fn observe<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        let started = Instant::now();
        let res = fut.await;
        self.metrics
            .store_duration
            .observe(&[("op", op)], started.elapsed());
        if let Err(e) = &res {
            self.metrics.store_errors.inc(&[("op", op)]);
            tracing::warn!(op, error = %e, "counter store call failed");
        }
        res
    }
}

#[async_trait]
impl CounterStore for ObservedStore {
    async fn get(&self, key: &str) -> Result<Option<u64>> {
        self.observe("get", self.inner.get(key)).await
    }

    async fn incr(&self, key: &str) -> Result<u64> {
        self.observe("incr", self.inner.incr(key)).await
    }

    async fn set_ex(&self, key: &str, value: u64, ttl: Duration) -> Result<()> {
        self.observe("set_ex", self.inner.set_ex(key, value, ttl)).await
    }

    async fn set_nx_ex(&self, key: &str, value: u64, ttl: Duration) -> Result<bool> {
        self.observe("set_nx_ex", self.inner.set_nx_ex(key, value, ttl))
            .await
    }

    async fn window_hit(&self, key: &str, window: Duration) -> Result<WindowSample> {
        self.observe("window_hit", self.inner.window_hit(key, window))
            .await
    }

    async fn ping(&self) -> Result<()> {
        self.observe("ping", self.inner.ping()).await
    }
}
