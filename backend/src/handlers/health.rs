//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

/// Health check endpoint that verifies database connectivity
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
    {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!("Health check database error: {}", e);
            "disconnected"
        }
    };

    let status = if database == "connected" {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse { status, database })
}
