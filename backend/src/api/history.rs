//! Conversation history API handlers

use crate::error::AppError;
use crate::history::{ConversationSummary, Message};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

/// Response for listing saved conversations
#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    /// Conversations, newest first
    pub conversations: Vec<ConversationSummary>,
}

/// Response for loading one conversation
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    /// Always `true`; failures use the error body
    pub success: bool,
    /// Every message of the conversation, in order
    pub messages: Vec<Message>,
}

/// Response for single and bulk deletes
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Always `true`; failures use the error body
    pub success: bool,
}

/// GET /api/history - Saved conversations, newest first
pub async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<ConversationsResponse>, AppError> {
    let conversations = state.history.list().await?;
    Ok(Json(ConversationsResponse { conversations }))
}

/// GET /api/history/:filename - Full transcript of one conversation
pub async fn load_conversation(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<ConversationResponse>, AppError> {
    let messages = state.history.load(&filename).await?;
    Ok(Json(ConversationResponse {
        success: true,
        messages,
    }))
}

/// DELETE /api/history/:filename - Remove one conversation
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.history.delete(&filename).await?;
    Ok(Json(DeleteResponse { success: true }))
}

/// DELETE /api/history - Remove every conversation
pub async fn delete_all_conversations(
    State(state): State<AppState>,
) -> Result<Json<DeleteResponse>, AppError> {
    let removed = state.history.delete_all().await?;
    tracing::info!(removed, "History cleared via API");
    Ok(Json(DeleteResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_state;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn test_list_load_delete() {
        let (state, _dir) = test_state();
        let name = state
            .history
            .save(&[Message::user("hello there friend"), Message::user("again")])
            .await
            .unwrap();

        let Json(listing) = list_conversations(State(state.clone())).await.unwrap();
        assert_eq!(listing.conversations.len(), 1);
        assert_eq!(listing.conversations[0].filename, name);

        let Json(loaded) = load_conversation(State(state.clone()), Path(name.clone()))
            .await
            .unwrap();
        assert!(loaded.success);
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded.messages[1].content, "again");

        let Json(deleted) = delete_conversation(State(state.clone()), Path(name.clone()))
            .await
            .unwrap();
        assert!(deleted.success);

        let Json(listing) = list_conversations(State(state.clone())).await.unwrap();
        assert!(listing.conversations.is_empty());

        // Deleting again is still a success
        let Json(deleted) = delete_conversation(State(state), Path(name)).await.unwrap();
        assert!(deleted.success);
    }

    #[tokio::test]
    async fn test_missing_conversation_is_not_found() {
        let (state, _dir) = test_state();
        let err = load_conversation(State(state), Path("does-not-exist.json".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let (state, _dir) = test_state();
        let err = load_conversation(State(state.clone()), Path("../settings.json".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = delete_conversation(State(state), Path(".hidden.json".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_all_empties_listing() {
        let (state, _dir) = test_state();
        state.history.save(&[Message::user("first chat")]).await.unwrap();
        state.history.save(&[Message::user("second chat")]).await.unwrap();

        let Json(deleted) = delete_all_conversations(State(state.clone())).await.unwrap();
        assert!(deleted.success);

        let Json(listing) = list_conversations(State(state)).await.unwrap();
        assert!(listing.conversations.is_empty());
    }
}
