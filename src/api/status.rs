//! Health and metrics endpoints.

use crate::service::BackupService;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// GET /health - liveness check
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "message": "Backup system web server is running.",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /metrics - backup totals for external monitoring
pub async fn metrics(State(service): State<Arc<BackupService>>) -> impl IntoResponse {
    let stats = service.backup_stats().await;
    Json(json!({
        "total_backups": stats.total_backups,
        "total_size_mb": stats.total_size_mb,
        "latest_backup": stats.latest_backup,
        "system_health": 100,
    }))
}
