//! Shared application state.
//!
//! Holds the process-wide store handle (created once at startup), the view
//! service built on top of it, and the metrics registry.

use std::sync::Arc;

use viewcount_core::error::Result;

use crate::config::{StoreBackend, ViewConfig};
use crate::obs::ViewMetrics;
use crate::services::ViewService;
use crate::store::{CounterStore, MemoryStore, ObservedStore, RedisStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn CounterStore>,
    views: ViewService,
    metrics: Arc<ViewMetrics>,
}

impl AppState {
    /// Build state around a store handle.
    pub fn new(cfg: ViewConfig, store: Arc<dyn CounterStore>) -> Self {
        let metrics = Arc::new(ViewMetrics::default());
        let store: Arc<dyn CounterStore> =
            Arc::new(ObservedStore::new(store, Arc::clone(&metrics)));
        let views = ViewService::new(Arc::clone(&store), &cfg, Arc::clone(&metrics));

        Self {
            inner: Arc::new(AppStateInner {
                store,
                views,
                metrics,
            }),
        }
    }

    /// Build the configured backend and state.
    /// Only configuration problems fail here; an unreachable Redis is
    /// connected lazily and degrades requests until it comes back.
    pub fn from_config(cfg: ViewConfig) -> Result<Self> {
        let store: Arc<dyn CounterStore> = match cfg.store.backend {
            StoreBackend::Redis => {
                let url = cfg.store.redis_url()?;
                Arc::new(RedisStore::open(&url)?)
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory counter store; counts are lost on restart");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::new(cfg, store))
    }

    pub fn views(&self) -> &ViewService {
        &self.inner.views
    }

    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.inner.store
    }

    pub fn metrics(&self) -> &ViewMetrics {
        &self.inner.metrics
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }
}
