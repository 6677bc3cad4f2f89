//! Router configuration for the HTTP and WebSocket API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::handlers::{assistant_chat, detect_stress, get_dashboard, list_workshops, AppState};
use super::middleware::create_cors_layer;
use super::ws::chat_ws_handler;
use crate::config::ServerConfig;

/// Extra room for multipart framing on top of the image size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main router.
pub fn create_router(app_state: Arc<AppState>, server: &ServerConfig) -> Router {
    let upload_limit = app_state.stress.max_upload_bytes() + MULTIPART_OVERHEAD;

    let api_routes = Router::new()
        .route(
            "/stress-detection",
            post(detect_stress).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/chat", post(assistant_chat))
        .route("/dashboard", get(get_dashboard))
        .route("/workshops", get(list_workshops));

    let mut router = Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(chat_ws_handler))
        .merge(create_health_router());

    if let Some(static_router) = create_static_router(&server.static_path) {
        router = router.merge(static_router);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&server.cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health_check))
}

/// Serve `static_path` under `/public`.
///
/// Returns `None` when static serving is disabled (empty path).
pub fn create_static_router<S>(static_path: &str) -> Option<Router<S>>
where
    S: Clone + Send + Sync + 'static,
{
    if static_path.is_empty() {
        return None;
    }
    if !Path::new(static_path).is_dir() {
        tracing::warn!("Static directory not found: {}", static_path);
    }
    Some(Router::new().nest_service("/public", ServeDir::new(static_path)))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_health_router() {
        let _router: Router = create_health_router();
    }

    #[test]
    fn test_static_router_disabled() {
        assert!(create_static_router::<()>("").is_none());
        assert!(create_static_router::<()>("public").is_some());
    }
}
