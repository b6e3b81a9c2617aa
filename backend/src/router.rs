//! Route table and HTTP middleware

use crate::api;
use crate::api::upload::MAX_REQUEST_BYTES;
use crate::state::AppState;
use crate::websocket;
use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = start.elapsed().as_millis(),
        "Request completed"
    );

    response
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Embedded client
        .route("/", get(api::index))
        .route("/static/app.js", get(api::app_js))
        .route("/static/style.css", get(api::style_css))
        .route("/api/health", get(api::health_check))
        // Live channel
        .route("/ws", get(websocket::websocket_handler))
        // Settings
        .route(
            "/api/settings",
            get(api::get_settings).post(api::save_settings),
        )
        .route("/api/settings/reset", post(api::reset_settings))
        // History
        .route(
            "/api/history",
            get(api::list_conversations).delete(api::delete_all_conversations),
        )
        .route(
            "/api/history/:filename",
            get(api::load_conversation).delete(api::delete_conversation),
        )
        // Uploads
        .route(
            "/api/upload",
            post(api::upload_files).layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES)),
        )
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
