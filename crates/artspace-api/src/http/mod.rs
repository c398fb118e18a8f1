//! HTTP layer for Artspace chat.
//!
//! Axum-based REST API at `/api/v1/`, the realtime hub at `/hub/chat`,
//! token authentication and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
