//! Axum router configuration with middleware.
//!
//! All API routes are under `/api/`.
//! Middleware: CORS, tracing.
//!
//! The chat widget's static assets are served from `static/`
//! (configurable via `YASMIN_WEB_DIR`). API routes take priority; unknown
//! paths fall through to the widget's `index.html`. If the directory does
//! not exist, only the API is served.

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/conversations",
            get(handlers::conversation::list_conversations),
        )
        .route(
            "/conversations/{id}",
            get(handlers::conversation::get_conversation),
        )
        .route(
            "/conversations/{id}/title",
            put(handlers::conversation::update_title),
        )
        .route(
            "/conversations/{id}",
            delete(handlers::conversation::delete_conversation),
        )
        .route("/chat", post(handlers::chat::chat))
        .route("/regenerate", post(handlers::chat::regenerate));

    let mut router = Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Serve the widget's static files from disk if the directory exists.
    let web_dir = std::env::var("YASMIN_WEB_DIR").unwrap_or_else(|_| "static".to_string());
    if std::path::Path::new(&web_dir).exists() {
        let index_path = format!("{web_dir}/index.html");
        let serve_dir = ServeDir::new(&web_dir).fallback(ServeFile::new(index_path));
        router = router.fallback_service(serve_dir);
        tracing::info!(path = %web_dir, "Static widget serving enabled");
    }

    router
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
