//! HTTP status surface.

pub mod status;

use crate::service::BackupService;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn create_router(service: Arc<BackupService>) -> Router {
    Router::new()
        .route("/health", get(status::health))
        .route("/metrics", get(status::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
