//! Axum router wiring.
//!
//! - `/api/views/{slug}` and `/api/views?slug=` : view counter (any method)
//! - `/healthz`, `/readyz`, `/metrics` : operational endpoints

use axum::{
    routing::{any, get},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/views", any(transport::http::views))
        .route("/api/views/:slug", any(transport::http::views))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
