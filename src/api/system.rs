//! System endpoints: health probe and manual task triggers.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState};
use crate::services::SweepReport;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub version: &'static str,
    pub uptime: u64,
}

/// `GET /api/health`
///
/// Liveness plus a database ping. Answers 503 when the database is unreachable.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let database = state.store().ping().await.is_ok();

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::success(HealthResponse {
            status: if database { "ok" } else { "degraded" },
            database,
            version: env!("CARGO_PKG_VERSION"),
            uptime: state.start_time.elapsed().as_secs(),
        })),
    )
        .into_response()
}

/// `POST /api/system/tasks/notify`
///
/// Runs one reminder sweep and waits for it. Staff only.
pub async fn trigger_notify(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<SweepReport>>, ApiError> {
    if !caller.is_staff {
        return Err(ApiError::forbidden());
    }

    tracing::info!(user_id = %caller.id, "Manual reminder sweep requested");
    let report = state.notifications().run_sweep(Utc::now()).await?;
    Ok(Json(ApiResponse::success(report)))
}
