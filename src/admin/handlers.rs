use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::admin::dto::{
    AdminUpdateUserRequest, AssignRoleRequest, CreateRoleRequest, LogsQuery, LogsResponse,
    MetricsQuery, MetricsResponse, PlanCatalog, SystemParams, UpdateParamsRequest,
    UpdatePlanRequest, UpdatePlanResponse, UserFilters, UserListResponse,
};
use crate::admin::services;
use crate::auth::dto::PublicUser;
use crate::auth::jwt::AuthUser;
use crate::error::AppError;
use crate::permissions::service as permission_service;
use crate::permissions::types::{Permission, Role};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route(
            "/admin/users/:id",
            put(update_user).delete(deactivate_user),
        )
        .route("/admin/users/:id/role", put(assign_role))
        .route("/admin/parameters", get(get_parameters).put(update_parameters))
        .route("/admin/plans", get(get_plans))
        .route("/admin/plans/:tier", put(update_plan))
        .route("/admin/metrics", get(get_metrics))
        .route("/admin/logs", get(get_logs))
        .route("/admin/roles", get(list_roles).post(create_role))
        .route("/admin/roles/:id/permissions", get(role_permissions))
        .route("/admin/permissions", get(list_permissions))
}

async fn require_admin(state: &AppState, user_id: Uuid) -> Result<(), AppError> {
    permission_service::require_admin(&state.db, &state.permissions, user_id).await
}

#[instrument(skip(state))]
async fn list_users(
    State(state): State<AppState>,
    AuthUser(admin_id): AuthUser,
    Query(filters): Query<UserFilters>,
) -> Result<Json<UserListResponse>, AppError> {
    require_admin(&state, admin_id).await?;
    let users = services::list_users(&state.db, filters).await?;
    Ok(Json(users))
}

#[instrument(skip(state, payload))]
async fn update_user(
    State(state): State<AppState>,
    AuthUser(admin_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<Json<PublicUser>, AppError> {
    require_admin(&state, admin_id).await?;
    let user = services::update_user(&state, admin_id, id, payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
async fn deactivate_user(
    State(state): State<AppState>,
    AuthUser(admin_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, AppError> {
    require_admin(&state, admin_id).await?;
    let user = services::deactivate_user(&state, admin_id, id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
async fn assign_role(
    State(state): State<AppState>,
    AuthUser(admin_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRoleRequest>,
) -> Result<Json<PublicUser>, AppError> {
    require_admin(&state, admin_id).await?;
    let user =
        permission_service::assign_role(&state.db, &state.permissions, id, payload.role_id).await?;
    services::audit(
        &state.db,
        "ASSIGN_ROLE",
        admin_id,
        Some(id),
        Some(serde_json::json!({ "role_id": payload.role_id })),
    )
    .await;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
async fn get_parameters(
    State(state): State<AppState>,
    AuthUser(admin_id): AuthUser,
) -> Result<Json<SystemParams>, AppError> {
    require_admin(&state, admin_id).await?;
    let params = state.params.read().expect("params lock poisoned").clone();
    Ok(Json(params))
}

#[instrument(skip(state, payload))]
async fn update_parameters(
    State(state): State<AppState>,
    AuthUser(admin_id): AuthUser,
    Json(payload): Json<UpdateParamsRequest>,
) -> Result<Json<SystemParams>, AppError> {
    require_admin(&state, admin_id).await?;

    let updated = {
        let mut params = state.params.write().expect("params lock poisoned");
        if let Some(v) = payload.default_cost_per_kg_filament {
            params.default_cost_per_kg_filament = v;
        }
        if let Some(v) = payload.default_cost_per_kwh {
            params.default_cost_per_kwh = v;
        }
        if let Some(v) = payload.default_printer_wattage {
            params.default_printer_wattage = v;
        }
        if let Some(v) = payload.default_cost_per_hour {
            params.default_cost_per_hour = v;
        }
        if let Some(v) = payload.default_profit_margin_percent {
            params.default_profit_margin_percent = v;
        }
        if let Some(v) = payload.default_marketplace_fee_percent {
            params.default_marketplace_fee_percent = v;
        }
        if let Some(v) = payload.system_currency {
            params.system_currency = v;
        }
        if let Some(v) = payload.backup_retention_days {
            params.backup_retention_days = v;
        }
        if let Some(v) = payload.support_email {
            params.support_email = v;
        }
        params.clone()
    };

    services::audit(
        &state.db,
        "UPDATE_PARAMETERS",
        admin_id,
        None,
        serde_json::to_value(&updated).ok(),
    )
    .await;

    Ok(Json(updated))
}

#[instrument(skip(state))]
async fn get_plans(
    State(state): State<AppState>,
    AuthUser(admin_id): AuthUser,
) -> Result<Json<PlanCatalog>, AppError> {
    require_admin(&state, admin_id).await?;
    Ok(Json(services::plan_catalog()))
}

#[instrument(skip(state, payload))]
async fn update_plan(
    State(state): State<AppState>,
    AuthUser(admin_id): AuthUser,
    Path(tier): Path<String>,
    Json(payload): Json<UpdatePlanRequest>,
) -> Result<Json<UpdatePlanResponse>, AppError> {
    require_admin(&state, admin_id).await?;
    let response = services::update_plan(&state, admin_id, &tier, payload).await?;
    Ok(Json(response))
}

#[instrument(skip(state))]
async fn get_metrics(
    State(state): State<AppState>,
    AuthUser(admin_id): AuthUser,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<MetricsResponse>, AppError> {
    require_admin(&state, admin_id).await?;
    let metrics = services::metrics(&state.db, query.period).await?;
    Ok(Json(metrics))
}

#[instrument(skip(state))]
async fn get_logs(
    State(state): State<AppState>,
    AuthUser(admin_id): AuthUser,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, AppError> {
    require_admin(&state, admin_id).await?;
    let logs = services::list_logs(&state.db, query).await?;
    Ok(Json(logs))
}

#[instrument(skip(state))]
async fn list_roles(
    State(state): State<AppState>,
    AuthUser(admin_id): AuthUser,
) -> Result<Json<Vec<Role>>, AppError> {
    require_admin(&state, admin_id).await?;
    let roles = crate::permissions::repo::list_roles(&state.db).await?;
    Ok(Json(roles))
}

#[instrument(skip(state, payload))]
async fn create_role(
    State(state): State<AppState>,
    AuthUser(admin_id): AuthUser,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<Json<Role>, AppError> {
    require_admin(&state, admin_id).await?;
    let role = permission_service::create_role(
        &state.db,
        &state.permissions,
        &payload.name,
        payload.description.as_deref(),
        &payload.permission_ids,
    )
    .await?;
    services::audit(
        &state.db,
        "CREATE_ROLE",
        admin_id,
        None,
        Some(serde_json::json!({ "role": role.name })),
    )
    .await;
    Ok(Json(role))
}

#[instrument(skip(state))]
async fn role_permissions(
    State(state): State<AppState>,
    AuthUser(admin_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Permission>>, AppError> {
    require_admin(&state, admin_id).await?;
    let permissions = crate::permissions::repo::role_permissions(&state.db, id).await?;
    Ok(Json(permissions))
}

#[instrument(skip(state))]
async fn list_permissions(
    State(state): State<AppState>,
    AuthUser(admin_id): AuthUser,
) -> Result<Json<Vec<Permission>>, AppError> {
    require_admin(&state, admin_id).await?;
    let permissions = crate::permissions::repo::list_permissions(&state.db).await?;
    Ok(Json(permissions))
}
