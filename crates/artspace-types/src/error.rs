use thiserror::Error;

/// Errors surfaced by chat operations.
///
/// This is the taxonomy every transport boundary (REST, realtime hub)
/// translates into its own error shape.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Machine-readable code used in realtime error frames.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::Unauthenticated(_) => "UNAUTHENTICATED",
            ChatError::NotFound(_) => "NOT_FOUND",
            ChatError::Forbidden(_) => "FORBIDDEN",
            ChatError::BadRequest(_) => "BAD_REQUEST",
            ChatError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Errors from store operations (used by trait definitions in artspace-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ChatError::NotFound("message not found".to_string()),
            RepositoryError::Forbidden(msg) => ChatError::Forbidden(msg),
            query @ RepositoryError::Query(_) => ChatError::Internal(query.to_string()),
        }
    }
}

/// Errors from access token issuance and verification.
///
/// Never carries token material or the signing secret.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed access token")]
    Malformed,

    #[error("access token signature mismatch")]
    BadSignature,

    #[error("access token expired")]
    Expired,

    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

impl From<AuthError> for ChatError {
    fn from(e: AuthError) -> Self {
        ChatError::Unauthenticated(e.to_string())
    }
}
