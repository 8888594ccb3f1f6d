//! HTTP handler for `/api/views/{slug}` and `/api/views?slug=...`.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use viewcount_core::protocol::reply::ViewReply;
use viewcount_core::ClientId;

use crate::app_state::AppState;
use crate::services::ViewMethod;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

fn view_method(m: &Method) -> ViewMethod {
    if *m == Method::GET {
        ViewMethod::Get
    } else if *m == Method::POST {
        ViewMethod::Post
    } else {
        ViewMethod::Other
    }
}

/// Path parameter wins; otherwise exactly one `slug` query value. A
/// repeated `slug` query key is treated as absent.
fn resolve_slug(path: Option<String>, query: &[(String, String)]) -> Option<String> {
    if path.is_some() {
        return path;
    }
    let mut values = query.iter().filter(|(k, _)| k == "slug").map(|(_, v)| v);
    match (values.next(), values.next()) {
        (Some(v), None) => Some(v.clone()),
        _ => None,
    }
}

fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientId {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok());
    ClientId::derive(forwarded, peer.map(|p| p.ip()))
}

fn render(reply: &ViewReply) -> Response {
    let status = StatusCode::from_u16(reply.status()).unwrap_or(StatusCode::OK);
    let mut resp = (status, Json(reply.body())).into_response();

    match reply {
        ViewReply::Limited { retry_after_secs, .. } => {
            resp.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
        }
        ViewReply::MethodNotAllowed => {
            resp.headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET, POST"));
        }
        _ => {}
    }
    resp
}

pub async fn views(
    State(app): State<AppState>,
    method: Method,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    path: Option<Path<String>>,
    query: Option<Query<Vec<(String, String)>>>,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let slug = resolve_slug(path.map(|Path(p)| p), &query);
    let client = client_identity(&headers, peer.map(|ConnectInfo(addr)| addr));

    let reply = app
        .views()
        .handle(view_method(&method), slug.as_deref(), &client)
        .await;
    render(&reply)
}
