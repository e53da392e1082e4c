//! Habit endpoints.
//!
//! Handlers only map HTTP to [`HabitService`](crate::services::HabitService)
//! calls. Ownership checks and the habit rules live in the service.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{validate_id, validate_page, validate_page_size};
use super::{ApiError, ApiResponse, AppState, HabitDto, HabitPageDto};
use crate::domain::HabitId;
use crate::services::{HabitPatch, HabitPayload};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// `GET /api/habits?page=&page_size=`
///
/// The caller's habits ordered by id. Page size defaults to
/// `server.page_size`.
pub async fn list_habits(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<HabitPageDto>>, ApiError> {
    let (default_size, max_size) = {
        let config = state.config().read().await;
        (config.server.page_size, config.server.max_page_size)
    };

    let page = validate_page(query.page.unwrap_or(1))?;
    let page_size = validate_page_size(query.page_size.unwrap_or(default_size), max_size)?;

    let habits = state
        .habit_service()
        .list_own(&caller, page, page_size)
        .await?;

    Ok(Json(ApiResponse::success(HabitPageDto::new(
        habits, page, page_size,
    ))))
}

/// `GET /api/habits/public`
pub async fn list_public_habits(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<HabitDto>>>, ApiError> {
    let habits = state.habit_service().list_public().await?;
    Ok(Json(ApiResponse::success(
        habits.into_iter().map(HabitDto::from).collect(),
    )))
}

/// `POST /api/habits`
pub async fn create_habit(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Json(payload): Json<HabitPayload>,
) -> Result<(StatusCode, Json<ApiResponse<HabitDto>>), ApiError> {
    let habit = state.habit_service().create(&caller, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(HabitDto::from(habit))),
    ))
}

pub async fn get_habit(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<HabitDto>>, ApiError> {
    let id = HabitId::new(validate_id("habit", id)?);
    let habit = state.habit_service().get(&caller, id).await?;
    Ok(Json(ApiResponse::success(HabitDto::from(habit))))
}

/// `PUT /api/habits/{id}`: every field must be supplied.
pub async fn replace_habit(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<HabitPayload>,
) -> Result<Json<ApiResponse<HabitDto>>, ApiError> {
    let id = HabitId::new(validate_id("habit", id)?);
    let habit = state
        .habit_service()
        .replace(&caller, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(HabitDto::from(habit))))
}

/// `PATCH /api/habits/{id}`
pub async fn update_habit(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(patch): Json<HabitPatch>,
) -> Result<Json<ApiResponse<HabitDto>>, ApiError> {
    let id = HabitId::new(validate_id("habit", id)?);
    let habit = state.habit_service().update(&caller, id, patch).await?;
    Ok(Json(ApiResponse::success(HabitDto::from(habit))))
}

pub async fn delete_habit(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = HabitId::new(validate_id("habit", id)?);
    state.habit_service().delete(&caller, id).await?;
    Ok(Json(ApiResponse::success(())))
}
