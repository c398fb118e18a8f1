//! Chat REST handlers.
//!
//! Endpoints:
//! - POST /api/v1/chat/messages                     - Send a message (pushed over the hub too)
//! - POST /api/v1/chat/messages/{id}/read           - Mark a message as read
//! - GET  /api/v1/chat/history/{other_user_id}      - Conversation page, oldest first
//! - GET  /api/v1/chat/unread                       - Unread count for the caller
//! - GET  /api/v1/presence/{user_id}                - Online state of a user

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use artspace_core::presence::PresenceInfo;
use artspace_types::chat::{ChatMessage, MessageId, UserId};

use crate::http::error::AppError;
use crate::http::extractors::auth::Caller;
use crate::http::extractors::query::HistoryQuery;
use crate::state::AppState;

/// Request body for sending a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: i64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UnreadResponse {
    pub user_id: UserId,
    pub unread: u64,
}

/// Parse a numeric id from a path parameter, returning a 400 error on invalid format.
fn parse_id(s: &str) -> Result<i64, AppError> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("Invalid id: {s}")))
}

/// POST /api/v1/chat/messages - Send a message to another user.
pub async fn send_message(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ChatMessage>), AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let message = state
        .chat_hub
        .send_message(&caller.hub, UserId(request.receiver_id), &request.message)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// POST /api/v1/chat/messages/{id}/read - Mark a message addressed to the caller as read.
pub async fn mark_as_read(
    State(state): State<AppState>,
    caller: Caller,
    Path(message_id): Path<String>,
) -> Result<Json<ChatMessage>, AppError> {
    let id = MessageId(parse_id(&message_id)?);
    let message = state.chat_hub.mark_as_read(&caller.hub, id).await?;
    Ok(Json(message))
}

/// GET /api/v1/chat/history/{other_user_id} - Conversation between the caller and another user.
pub async fn get_history(
    State(state): State<AppState>,
    caller: Caller,
    Path(other_user_id): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let other = UserId(parse_id(&other_user_id)?);
    let messages = state
        .chat_hub
        .get_chat_history(&caller.hub, other, query.skip, query.take)
        .await?;
    Ok(Json(messages))
}

/// GET /api/v1/chat/unread - Number of unread messages addressed to the caller.
pub async fn get_unread(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<UnreadResponse>, AppError> {
    let unread = state.chat_hub.unread_count(&caller.hub).await?;
    Ok(Json(UnreadResponse {
        user_id: caller.user_id,
        unread,
    }))
}

/// GET /api/v1/presence/{user_id} - Whether a user currently has live hub connections.
pub async fn get_presence(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<Json<PresenceInfo>, AppError> {
    let user = UserId(parse_id(&user_id)?);
    Ok(Json(state.chat_hub.presence_of(&caller.hub, user)?))
}
