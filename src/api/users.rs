//! User account endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, UserDto};
use crate::domain::UserId;
use crate::services::{Registration, UserPatch};

/// `POST /api/users`. Open registration.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Registration>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let user = state.user_service().register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// `GET /api/users`. Staff only.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state.user_service().list(&caller).await?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = UserId::new(validate_id("user", id)?);
    let user = state.user_service().get(&caller, id).await?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = UserId::new(validate_id("user", id)?);
    let user = state.user_service().update(&caller, id, patch).await?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = UserId::new(validate_id("user", id)?);
    state.user_service().delete(&caller, id).await?;
    Ok(Json(ApiResponse::success(())))
}
