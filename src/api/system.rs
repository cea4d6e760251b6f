//! Unauthenticated health endpoint.

use axum::{Json, extract::State};
use chrono::Utc;
use std::sync::Arc;

use super::types::HealthBody;
use super::{ApiResponse, AppState};

/// `GET /api/health`
///
/// Always answers 200; `success` and `database` report whether the store
/// answered a ping.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthBody>> {
    let database = state.store().ping().await.is_ok();

    let body = HealthBody {
        timestamp: Utc::now(),
        database,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };

    let response = if database {
        ApiResponse::success(body).with_message("Server is running normally")
    } else {
        tracing::warn!("Health check: database did not answer");
        ApiResponse::failure("Database is unavailable", body)
    };

    Json(response)
}
