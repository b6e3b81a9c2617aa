//! Settings API handlers
//!
//! Thin HTTP layer over the process-wide `SettingsStore`.

use crate::error::AppError;
use crate::state::{AppState, Settings};
use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// Acknowledgement returned by settings mutations
#[derive(Debug, Serialize)]
pub struct SettingsAck {
    /// Always `true`; failures use the error body
    pub success: bool,
    /// Human-readable confirmation
    pub message: String,
}

impl SettingsAck {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

/// GET /api/settings - Current settings snapshot
pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.settings.get().await)
}

/// POST /api/settings - Replace the snapshot (omitted keys take defaults)
pub async fn save_settings(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<SettingsAck>, AppError> {
    if !body.is_object() {
        return Err(AppError::Validation(
            "Settings must be a JSON object".to_string(),
        ));
    }
    state.settings.set_value(body).await?;
    info!("Settings saved via API");
    Ok(Json(SettingsAck::ok("Settings saved")))
}

/// POST /api/settings/reset - Restore defaults
pub async fn reset_settings(State(state): State<AppState>) -> Result<Json<SettingsAck>, AppError> {
    state.settings.reset().await?;
    Ok(Json(SettingsAck::ok("Settings reset")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_state;
    use crate::state::SafeMode;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use serde_json::json;

    #[tokio::test]
    async fn test_save_then_get_fills_defaults() {
        let (state, _dir) = test_state();

        let Json(ack) = save_settings(
            State(state.clone()),
            Json(json!({"model": "gpt-4o-mini", "safe_mode": "ask", "theme": "dark"})),
        )
        .await
        .unwrap();
        assert!(ack.success);
        assert_eq!(ack.message, "Settings saved");

        let Json(settings) = get_settings(State(state)).await;
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.safe_mode, SafeMode::Ask);
        assert_eq!(settings.max_output, 2800);
        assert_eq!(settings.extra.get("theme"), Some(&json!("dark")));
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let (state, _dir) = test_state();

        let err = save_settings(State(state.clone()), Json(json!({"temperature": 7.5})))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = save_settings(State(state.clone()), Json(json!({"safe_mode": "paranoid"})))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = save_settings(State(state.clone()), Json(json!(["not", "an", "object"])))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Previous snapshot untouched
        let Json(settings) = get_settings(State(state)).await;
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let (state, _dir) = test_state();
        save_settings(State(state.clone()), Json(json!({"auto_run": true})))
            .await
            .unwrap();

        let Json(ack) = reset_settings(State(state.clone())).await.unwrap();
        assert_eq!(ack.message, "Settings reset");

        let Json(settings) = get_settings(State(state)).await;
        assert!(!settings.auto_run);
        assert_eq!(settings, Settings::default());
    }
}
