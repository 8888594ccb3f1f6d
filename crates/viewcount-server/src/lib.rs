//! viewcount server library entry.
//!
//! Wires the counter store, admission policy, dedup tracker and view
//! service into an axum router. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod dedup;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod router;
pub mod services;
pub mod store;
pub mod transport;
