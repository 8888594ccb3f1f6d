//! Admission policy (per-client sliding-window rate limiting).
//!
//! Two independent classes are tracked per client: loose reads and strict
//! writes. All window state lives in the counter store.

pub mod limiter;

pub use limiter::{Admission, SlidingWindowLimiter};
