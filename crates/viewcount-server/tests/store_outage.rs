#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
};
use tower::ServiceExt;

use viewcount_core::protocol::reply::MSG_FAILED;
use viewcount_core::protocol::ViewBody;
use viewcount_server::{
    app_state::AppState,
    config::{StoreBackend, ViewConfig},
    router,
};

fn unreachable_redis() -> ViewConfig {
    let mut cfg = ViewConfig::default();
    cfg.store.backend = StoreBackend::Redis;
    // nothing listens on port 1
    cfg.store.url = Some("redis://127.0.0.1:1/".into());
    cfg
}

#[tokio::test]
async fn unreachable_redis_starts_and_degrades() {
    let state = AppState::from_config(unreachable_redis()).expect("state without a live redis");
    let app = router::build_router(state.clone());

    for method in [Method::GET, Method::POST] {
        let req = Request::builder()
            .method(method)
            .uri("/api/views/hello-world")
            .header("x-forwarded-for", "1.2.3.4")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let body: ViewBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            ViewBody {
                views: Some(0),
                cached: None,
                error: Some(MSG_FAILED.to_string()),
            }
        );
    }

    let req = Request::builder().uri("/readyz").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(state.metrics().store_errors.get(&[("op", "window_hit")]) >= 2);
}

#[test]
fn malformed_redis_url_fails_at_startup() {
    let mut cfg = ViewConfig::default();
    cfg.store.url = Some("not a url".into());
    let err = AppState::from_config(cfg).err().expect("config error");
    assert_eq!(err.client_code().as_str(), "CONFIG");
}
