use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::routes::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub user_table: String,
    pub audit_table: String,
}

/// Health check endpoint
/// GET /health
pub async fn health_check_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let timestamp = chrono::Utc::now();

    let user_table_status = match state.directory.health_check().await {
        Ok(_) => "healthy".to_string(),
        Err(e) => {
            tracing::warn!("User table {} unhealthy: {}", state.directory.describe(), e);
            "unhealthy".to_string()
        }
    };

    // A missing audit table degrades prints but does not make the service
    // unhealthy.
    let audit_table_status = if state.audit_service.is_connected() {
        "connected"
    } else {
        "disconnected"
    };

    let overall_status = if user_table_status == "healthy" {
        "healthy"
    } else {
        "unhealthy"
    };

    let response = HealthResponse {
        status: overall_status.to_string(),
        timestamp,
        user_table: user_table_status,
        audit_table: audit_table_status.to_string(),
    };

    if overall_status == "healthy" {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
