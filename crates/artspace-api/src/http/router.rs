//! Axum router configuration with middleware.
//!
//! REST routes live under `/api/v1/`, the realtime hub at `/hub/chat`.
//! Middleware: CORS, tracing.
//!
//! When `server.web_dir` is configured and exists, the built web client is
//! served from it. API routes take priority; unknown paths fall through to
//! the client's `index.html` for client-side routing.

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let web_dir = state.config.server.web_dir.clone();

    let api_routes = Router::new()
        // Chat
        .route("/chat/messages", post(handlers::chat::send_message))
        .route(
            "/chat/messages/{id}/read",
            post(handlers::chat::mark_as_read),
        )
        .route(
            "/chat/history/{other_user_id}",
            get(handlers::chat::get_history),
        )
        .route("/chat/unread", get(handlers::chat::get_unread))
        // Presence
        .route("/presence/{user_id}", get(handlers::chat::get_presence));

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/hub/chat", get(handlers::ws::hub_handler))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(web_dir) = web_dir.filter(|dir| std::path::Path::new(dir).exists()) {
        let index_path = format!("{web_dir}/index.html");
        let serve_dir = ServeDir::new(&web_dir).fallback(ServeFile::new(index_path));
        router = router.fallback_service(serve_dir);
        tracing::info!(path = %web_dir, "Static web client serving enabled");
    }

    router
}

/// GET /health - Liveness plus realtime hub load (no auth required).
async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    let presence = state.chat_hub.presence();
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "online_users": presence.online_users().len(),
        "connections": presence.total_connections(),
    }))
}
