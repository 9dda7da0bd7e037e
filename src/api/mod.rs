//! HTTP surface: the unary RPC routes, the WebSocket push channel, and CORS.

pub mod connection;
pub mod routes;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::server::GameServer;

pub fn create_router(server: Arc<GameServer>, config: &Config) -> Router {
    let cors = build_cors_layer(&config.allowed_origins, config.allow_same_host);

    Router::new()
        .route("/v1/rooms", post(routes::create_room))
        .route("/v1/rooms/{room_id}", get(routes::get_room))
        .route("/v1/rooms/{room_id}/join", post(routes::join_room))
        .route("/v1/rooms/{room_id}/game/start", post(routes::start_game))
        .route("/v1/rooms/{room_id}/solutions", post(routes::submit_solution))
        .route(
            "/v1/rooms/{room_id}/solutions/retract",
            post(routes::retract_solution),
        )
        .route(
            "/v1/rooms/{room_id}/finished",
            post(routes::mark_finished_solving),
        )
        .route("/v1/rooms/{room_id}/ready", post(routes::mark_ready_for_next))
        .route("/v1/stats", get(routes::stats))
        .route("/v1/ws", get(routes::ws_handler))
        .fallback(routes::fallback)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(server)
}

/// Exact-origin allow list, optionally widened to requests whose Origin
/// hostname equals the request Host.
pub fn build_cors_layer(allowed_origins: &[String], allow_same_host: bool) -> CorsLayer {
    let origins: Vec<String> = allowed_origins
        .iter()
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, parts: &axum::http::request::Parts| {
                origin_allowed(origin, parts, &origins, allow_same_host)
            },
        ))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn origin_allowed(
    origin: &HeaderValue,
    parts: &axum::http::request::Parts,
    allowed: &[String],
    allow_same_host: bool,
) -> bool {
    let Ok(origin_str) = origin.to_str() else {
        return false;
    };
    if allowed
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(origin_str))
    {
        return true;
    }

    if allow_same_host {
        let request_host = parts
            .headers
            .get(axum::http::header::HOST)
            .and_then(|value| value.to_str().ok())
            .map(hostname_of_authority);
        if let (Some(origin_host), Some(request_host)) =
            (origin_hostname(origin_str), request_host)
        {
            return origin_host.eq_ignore_ascii_case(request_host);
        }
    }

    false
}

fn origin_hostname(origin: &str) -> Option<&str> {
    let authority = origin
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(origin);
    let authority = authority.split('/').next().unwrap_or(authority);
    let host = hostname_of_authority(authority);
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

fn hostname_of_authority(authority: &str) -> &str {
    // IPv6 literals carry brackets; everything else drops an optional port.
    if let Some(stripped) = authority.strip_prefix('[') {
        return stripped.split(']').next().unwrap_or(stripped);
    }
    authority.split(':').next().unwrap_or(authority)
}
