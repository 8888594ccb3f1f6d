//! View counting state machine.
//!
//! validate slug -> method -> rate limit -> dedup -> increment -> reply.
//! Every store-facing step of one request sits behind a single failure
//! boundary: any store error collapses the request into
//! [`ViewReply::Degraded`] (200, zero views) and is only logged.

use std::sync::Arc;
use std::time::Duration;

use viewcount_core::error::Result;
use viewcount_core::protocol::reply::{OpClass, ViewReply};
use viewcount_core::{ClientId, Slug};

use crate::config::{DedupMode, ViewConfig};
use crate::dedup::DedupTracker;
use crate::obs::ViewMetrics;
use crate::policy::{Admission, SlidingWindowLimiter};
use crate::store::{CounterStore, KeySpace};

/// Request method as seen by the view service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMethod {
    Get,
    Post,
    Other,
}

impl ViewMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMethod::Get => "GET",
            ViewMethod::Post => "POST",
            ViewMethod::Other => "OTHER",
        }
    }
}

pub struct ViewService {
    store: Arc<dyn CounterStore>,
    keys: KeySpace,
    limiter: SlidingWindowLimiter,
    dedup: DedupTracker,
    dedup_mode: DedupMode,
    max_slug_len: usize,
    metrics: Arc<ViewMetrics>,
}

impl ViewService {
    pub fn new(store: Arc<dyn CounterStore>, cfg: &ViewConfig, metrics: Arc<ViewMetrics>) -> Self {
        let keys = KeySpace::new(cfg.store.key_prefix.clone());
        Self {
            limiter: SlidingWindowLimiter::new(Arc::clone(&store), keys.clone(), &cfg.rate_limit),
            dedup: DedupTracker::new(Arc::clone(&store), keys.clone()),
            dedup_mode: cfg.dedup.mode,
            max_slug_len: cfg.views.max_slug_len,
            store,
            keys,
            metrics,
        }
    }

    /// Handle one request. `raw_slug` is `None` when the slug is absent or
    /// was supplied in an unusable form (e.g. repeated).
    pub async fn handle(
        &self,
        method: ViewMethod,
        raw_slug: Option<&str>,
        client: &ClientId,
    ) -> ViewReply {
        let reply = self.dispatch(method, raw_slug, client).await;
        self.metrics
            .requests
            .inc(&[("method", method.as_str()), ("outcome", reply.outcome())]);
        reply
    }

    async fn dispatch(
        &self,
        method: ViewMethod,
        raw_slug: Option<&str>,
        client: &ClientId,
    ) -> ViewReply {
        let slug = match raw_slug.map(|s| Slug::parse(s, self.max_slug_len)) {
            Some(Ok(slug)) => slug,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "rejecting slug");
                return ViewReply::InvalidSlug;
            }
            None => return ViewReply::InvalidSlug,
        };

        let res = match method {
            ViewMethod::Get => self.read(&slug, client).await,
            ViewMethod::Post => self.write(&slug, client).await,
            ViewMethod::Other => return ViewReply::MethodNotAllowed,
        };

        match res {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(%slug, %client, method = method.as_str(), error = %e, "view request degraded");
                ViewReply::Degraded
            }
        }
    }

    async fn read(&self, slug: &Slug, client: &ClientId) -> Result<ViewReply> {
        if let Admission::Reject { retry_after } = self.limiter.check(OpClass::Read, client).await? {
            return self.limited(OpClass::Read, slug, client, retry_after).await;
        }
        Ok(ViewReply::Current {
            views: self.current(slug).await?,
        })
    }

    async fn write(&self, slug: &Slug, client: &ClientId) -> Result<ViewReply> {
        if let Admission::Reject { retry_after } = self.limiter.check(OpClass::Write, client).await? {
            return self.limited(OpClass::Write, slug, client, retry_after).await;
        }

        let fresh = match self.dedup_mode {
            DedupMode::CheckThenSet => !self.dedup.is_counted(client, slug).await?,
            DedupMode::SetIfAbsent => self.dedup.try_claim(client, slug).await?,
        };
        if !fresh {
            return Ok(ViewReply::Counted {
                views: self.current(slug).await?,
                cached: true,
            });
        }

        let views = self.store.incr(&self.keys.views(slug)).await?;
        if self.dedup_mode == DedupMode::CheckThenSet {
            self.dedup.mark_counted(client, slug).await?;
        }
        tracing::debug!(%slug, %client, views, "view counted");

        Ok(ViewReply::Counted {
            views,
            cached: false,
        })
    }

    async fn limited(
        &self,
        class: OpClass,
        slug: &Slug,
        client: &ClientId,
        retry_after: Duration,
    ) -> Result<ViewReply> {
        self.metrics.rate_limited.inc(&[("class", class.as_str())]);
        tracing::debug!(%slug, %client, class = class.as_str(), "rate limited");
        Ok(ViewReply::Limited {
            class,
            views: self.current(slug).await?,
            retry_after_secs: retry_after.as_secs().max(1),
        })
    }

    async fn current(&self, slug: &Slug) -> Result<u64> {
        Ok(self.store.get(&self.keys.views(slug)).await?.unwrap_or(0))
    }
}
