//! Router configuration for the trigger surface.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{check, clear, health_check, help, init, send_test, stats, AppState};

/// Create the trigger router.
///
/// Mutating triggers accept both GET and POST so they can be hit from a
/// browser or a cron webhook alike.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(help))
        .route("/test", get(send_test).post(send_test))
        .route("/check", get(check).post(check))
        .route("/init", get(init).post(init))
        .route("/clear", get(clear).post(clear))
        .route("/stats", get(stats))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}
