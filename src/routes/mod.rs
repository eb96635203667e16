//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

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
/// - Static dashboard from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
  let static_service = ServeDir::new("./static")
    .append_index_html_on_directories(true)
    .not_found_service(ServeFile::new("./static/index.html"));

  Router::new()
    .route("/ws", get(ws::ws_upgrade))
    .route("/api/v1/health", get(http::http_health))
    // Generation
    .route("/api/v1/quiz", post(http::http_post_quiz))
    .route("/api/v1/tasks/generate", post(http::http_post_generate_tasks))
    .route("/api/v1/yoga", post(http::http_post_yoga))
    .route("/api/v1/symptoms", post(http::http_post_symptoms))
    .route("/api/v1/generate/:schema", post(http::http_post_generate))
    .route("/api/v1/samples/:schema", get(http::http_get_samples))
    // Tasks
    .route("/api/v1/tasks", get(http::http_get_tasks))
    .route("/api/v1/tasks/:id/toggle", post(http::http_post_toggle_task))
    // Yoga practice
    .route("/api/v1/yoga/practice", post(http::http_post_practice))
    .route("/api/v1/yoga/streak", get(http::http_get_streak))
    // Videos
    .route("/api/v1/videos", get(http::http_get_videos))
    // Notifications
    .route(
      "/api/v1/notifications",
      get(http::http_get_notifications).delete(http::http_delete_notifications),
    )
    .route("/api/v1/notifications/:id/read", post(http::http_post_notification_read))
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
    .fallback_service(static_service)
}
