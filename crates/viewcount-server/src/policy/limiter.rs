use std::sync::Arc;
use std::time::Duration;

use viewcount_core::error::Result;
use viewcount_core::protocol::reply::OpClass;
use viewcount_core::ClientId;

use crate::config::{RateLimitSection, WindowRule};
use crate::store::{CounterStore, KeySpace, WindowSample};

/// Decision from rate-limit evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Reject { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admit)
    }
}

/// Sliding-window limiter over the shared counter store.
///
/// Stateless between calls: every decision is one `window_hit` round trip
/// and the estimate is derived from the returned bucket counts. Store
/// errors are returned to the caller untouched.
pub struct SlidingWindowLimiter {
    store: Arc<dyn CounterStore>,
    keys: KeySpace,
    read: WindowRule,
    write: WindowRule,
}

impl SlidingWindowLimiter {
    pub fn new(store: Arc<dyn CounterStore>, keys: KeySpace, rules: &RateLimitSection) -> Self {
        Self {
            store,
            keys,
            read: rules.read,
            write: rules.write,
        }
    }

    fn rule(&self, class: OpClass) -> &WindowRule {
        match class {
            OpClass::Read => &self.read,
            OpClass::Write => &self.write,
        }
    }

    pub async fn check(&self, class: OpClass, client: &ClientId) -> Result<Admission> {
        let rule = self.rule(class);
        if !rule.enabled {
            return Ok(Admission::Admit);
        }

        let window = Duration::from_secs(rule.window_secs);
        let sample = self
            .store
            .window_hit(&self.keys.window(class, client), window)
            .await?;

        Ok(evaluate(&sample, rule.limit, window))
    }
}

/// Weighted estimate: the previous bucket counts in proportion to how much
/// of it still overlaps the rolling window.
fn evaluate(sample: &WindowSample, limit: u64, window: Duration) -> Admission {
    let window_ms = window.as_millis().max(1);
    let elapsed_ms = sample.elapsed.as_millis().min(window_ms);
    let remaining_ms = window_ms - elapsed_ms;

    // ceil(previous * remaining / window) keeps the estimate conservative.
    let carried = (u128::from(sample.previous) * remaining_ms).div_ceil(window_ms);
    let estimate = carried + u128::from(sample.current);

    if estimate <= u128::from(limit) {
        Admission::Admit
    } else {
        let retry_after = Duration::from_millis(remaining_ms as u64).max(Duration::from_secs(1));
        Admission::Reject { retry_after }
    }
}
