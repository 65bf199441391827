use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::error::AppError;
use crate::permissions::service::require_permission;
use crate::state::AppState;

use super::dto::{CreateSheetRequest, PlanLimitsResponse, SheetSummary, UpdateSheetRequest};
use super::model::Sheet;
use super::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sheets", get(list_sheets).post(create_sheet))
        .route("/sheets/limits", get(get_plan_limits))
        .route(
            "/sheets/:id",
            get(get_sheet).put(update_sheet).delete(delete_sheet),
        )
}

async fn gate(state: &AppState, user_id: Uuid, action: &str) -> Result<(), AppError> {
    require_permission(&state.db, &state.permissions, user_id, "sheets", action).await
}

#[instrument(skip(state, payload))]
async fn create_sheet(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateSheetRequest>,
) -> Result<(StatusCode, Json<Sheet>), AppError> {
    gate(&state, user_id, "create").await?;
    let sheet = services::create_sheet(&state.db, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(sheet)))
}

#[instrument(skip(state))]
async fn list_sheets(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<SheetSummary>>, AppError> {
    gate(&state, user_id, "view").await?;
    let sheets = services::list_sheets(&state.db, user_id).await?;
    Ok(Json(sheets))
}

#[instrument(skip(state))]
async fn get_sheet(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Sheet>, AppError> {
    gate(&state, user_id, "view").await?;
    let sheet = services::get_sheet(&state.db, id, user_id).await?;
    Ok(Json(sheet))
}

#[instrument(skip(state, payload))]
async fn update_sheet(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSheetRequest>,
) -> Result<Json<Sheet>, AppError> {
    gate(&state, user_id, "edit").await?;
    let sheet = services::update_sheet(&state.db, id, user_id, payload).await?;
    Ok(Json(sheet))
}

#[instrument(skip(state))]
async fn delete_sheet(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    gate(&state, user_id, "delete").await?;
    services::delete_sheet(&state.db, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
async fn get_plan_limits(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PlanLimitsResponse>, AppError> {
    let limits = services::plan_limits(&state.db, user_id).await?;
    Ok(Json(limits))
}
