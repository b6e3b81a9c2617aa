//! Embedded browser client and health check

use axum::{
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use serde::Serialize;

const INDEX_HTML: &str = include_str!("../../static/index.html");
const APP_JS: &str = include_str!("../../static/app.js");
const STYLE_CSS: &str = include_str!("../../static/style.css");

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `healthy` while the server answers
    pub status: String,
    /// Crate version
    pub version: String,
}

/// GET / - Single-page client
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /static/app.js
pub async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS,
    )
}

/// GET /static/style.css
pub async fn style_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE_CSS)
}

/// GET /api/health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_index_references_assets() {
        let Html(body) = index().await;
        assert!(body.contains("/static/app.js"));
        assert!(body.contains("/static/style.css"));
    }

    #[tokio::test]
    async fn test_asset_content_types() {
        let response = app_js().await.into_response();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/javascript; charset=utf-8"
        );

        let response = style_css().await.into_response();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");
    }

    #[test]
    fn test_client_speaks_live_channel_envelopes() {
        for envelope in ["chat", "execute", "new_chat", "clear_chat"] {
            assert!(
                APP_JS.contains(&format!("'{}'", envelope)),
                "client never sends {}",
                envelope
            );
        }
        // Streamed code blocks carry a Run control that sends `execute`
        assert!(APP_JS.contains("class=\"run-code\""));
        assert!(APP_JS.contains("addEventListener('click', clickRunCode)"));
    }

    #[tokio::test]
    async fn test_health() {
        let Json(health) = health_check().await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }
}
