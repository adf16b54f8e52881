//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS,
//! and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/topics", get(http::http_get_topics))
        .route("/api/v1/profile", get(http::http_get_profile).post(http::http_post_profile))
        .route("/api/v1/profile/level_up", post(http::http_post_level_up))
        .route("/api/v1/profile/reset", post(http::http_post_reset))
        .route("/api/v1/question", get(http::http_get_question))
        .route("/api/v1/submit", post(http::http_post_submit))
        .route("/api/v1/theory", get(http::http_get_theory))
        .route("/api/v1/leaderboard", get(http::http_get_leaderboard))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    use crate::domain::Difficulty;
    use crate::profile::ProfileStore;
    use crate::storage::KvStore;

    async fn test_router(onboarded: bool) -> Router {
        let storage = KvStore::in_memory();
        let profile = ProfileStore::load(storage.clone()).await;
        if onboarded {
            profile.set_identity("Ada".into(), Difficulty::Beginner).await;
        }
        build_router(Arc::new(AppState::for_tests(None, storage, profile)))
    }

    #[tokio::test]
    async fn protected_endpoints_require_an_onboarded_profile() {
        let app = test_router(false).await;
        let paths = [
            "/api/v1/question?topic=subqueries",
            "/api/v1/theory?topic=subqueries",
            "/api/v1/leaderboard",
        ];
        for path in paths {
            let res = app
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).expect("request"))
                .await
                .expect("response");
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        }
    }

    #[tokio::test]
    async fn onboarded_profile_reaches_the_quiz() {
        let app = test_router(true).await;
        let res = app
            .oneshot(
                Request::get("/api/v1/question?topic=window_functions")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_and_profile_reads_are_open() {
        let app = test_router(false).await;
        for path in ["/api/v1/health", "/api/v1/profile", "/api/v1/topics"] {
            let res = app
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).expect("request"))
                .await
                .expect("response");
            assert_eq!(res.status(), StatusCode::OK, "{path}");
        }
    }
}
