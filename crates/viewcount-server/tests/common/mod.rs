//! Shared helpers for HTTP-level tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, Response, StatusCode},
    Router,
};
use dashmap::DashSet;
use tower::ServiceExt;

use viewcount_core::error::{Result, ViewError};
use viewcount_core::protocol::ViewBody;
use viewcount_server::{
    app_state::AppState,
    config::ViewConfig,
    router,
    store::{CounterStore, MemoryStore, WindowSample},
};

/// Memory store that counts calls and can fail every call or only
/// selected operations.
#[derive(Default)]
pub struct TestStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    failing: AtomicBool,
    failing_ops: DashSet<&'static str>,
}

impl TestStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
    }

    /// Fail only calls to `op` (`get`, `incr`, `set_ex`, `set_nx_ex`,
    /// `window_hit`, `ping`).
    pub fn fail_op(&self, op: &'static str) {
        self.failing_ops.insert(op);
    }

    pub fn clear_failures(&self) {
        self.failing.store(false, Ordering::SeqCst);
        self.failing_ops.clear();
    }

    fn enter(&self, op: &'static str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) || self.failing_ops.contains(op) {
            return Err(ViewError::Store(format!("{op}: connection refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl CounterStore for TestStore {
    async fn get(&self, key: &str) -> Result<Option<u64>> {
        self.enter("get")?;
        self.inner.get(key).await
    }

    async fn incr(&self, key: &str) -> Result<u64> {
        self.enter("incr")?;
        self.inner.incr(key).await
    }

    async fn set_ex(&self, key: &str, value: u64, ttl: Duration) -> Result<()> {
        self.enter("set_ex")?;
        self.inner.set_ex(key, value, ttl).await
    }

    async fn set_nx_ex(&self, key: &str, value: u64, ttl: Duration) -> Result<bool> {
        self.enter("set_nx_ex")?;
        self.inner.set_nx_ex(key, value, ttl).await
    }

    async fn window_hit(&self, key: &str, window: Duration) -> Result<WindowSample> {
        self.enter("window_hit")?;
        self.inner.window_hit(key, window).await
    }

    async fn ping(&self) -> Result<()> {
        self.enter("ping")?;
        self.inner.ping().await
    }
}

pub struct Harness {
    pub app: Router,
    pub store: Arc<TestStore>,
    pub state: AppState,
}

impl Harness {
    pub fn new(cfg: ViewConfig) -> Self {
        let store = Arc::new(TestStore::default());
        let state = AppState::new(cfg, store.clone());
        Self {
            app: router::build_router(state.clone()),
            store,
            state,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, client: Option<&str>) -> Response<Body> {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(ip) = client {
            req = req.header("x-forwarded-for", ip);
        }
        self.app
            .clone()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// Send and decode the JSON body.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        client: Option<&str>,
    ) -> (StatusCode, ViewBody) {
        let resp = self.send(method, uri, client).await;
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }
}

pub fn views(n: u64) -> ViewBody {
    ViewBody {
        views: Some(n),
        ..ViewBody::default()
    }
}

pub fn counted(n: u64, cached: bool) -> ViewBody {
    ViewBody {
        views: Some(n),
        cached: Some(cached),
        error: None,
    }
}

pub fn with_error(n: u64, msg: &str) -> ViewBody {
    ViewBody {
        views: Some(n),
        cached: None,
        error: Some(msg.to_string()),
    }
}
