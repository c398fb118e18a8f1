//! Caller identity extractor.
//!
//! Extracts and verifies the access token from:
//! - `Authorization: Bearer <token>` header
//! - `access_token` query parameter (browsers cannot set headers on a
//!   WebSocket upgrade)
//!
//! and resolves the caller's numeric user id from the verified claims.
//! Every authenticated REST handler and the realtime hub upgrade go through
//! this one extractor.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;

use artspace_core::chat::hub::HubCaller;
use artspace_types::chat::UserId;
use artspace_types::error::ChatError;

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: UserId,
    pub hub: HubCaller,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;
        let context = state.tokens.verify(&token)?;

        let hub = HubCaller::detached(context);
        let user_id = hub.user_id()?;

        Ok(Caller { user_id, hub })
    }
}

/// Extract the access token from request headers or the query string.
fn extract_token(parts: &Parts) -> Result<String, AppError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Chat(ChatError::Unauthenticated(
                "Invalid Authorization header encoding".to_string(),
            ))
        })?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    if let Ok(Query(query)) = Query::<TokenQuery>::try_from_uri(&parts.uri) {
        if let Some(token) = query.access_token.filter(|t| !t.is_empty()) {
            return Ok(token);
        }
    }

    Err(AppError::Chat(ChatError::Unauthenticated(
        "Missing access token. Provide via 'Authorization: Bearer <token>' or '?access_token=<token>'."
            .to_string(),
    )))
}
