use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::admin::dto::{
    AdminUpdateUserRequest, LogsQuery, LogsResponse, MetricsResponse, PlanCatalog,
    PlanCatalogEntry, UpdatePlanRequest, UpdatePlanResponse, UserFilters, UserListResponse,
};
use crate::admin::repo;
use crate::auth::repo_types::User;
use crate::error::AppError;
use crate::plans::PlanTier;
use crate::state::AppState;

const USER_STATUSES: [&str; 2] = ["active", "inactive"];

/// Record an administrative action. Audit failures are logged, never
/// propagated; the action itself already succeeded.
pub async fn audit(
    db: &PgPool,
    action: &str,
    admin_id: Uuid,
    target_id: Option<Uuid>,
    details: Option<serde_json::Value>,
) {
    if let Err(e) = repo::insert_audit_log(db, action, admin_id, target_id, details.as_ref()).await
    {
        warn!(error = %e, action, "audit log write failed");
    }
}

pub async fn list_users(db: &PgPool, filters: UserFilters) -> Result<UserListResponse, AppError> {
    let page = filters.page.max(1);
    let limit = filters.limit.clamp(1, 100);
    let offset = (page - 1) * limit;

    let plan = filters.plan.as_deref();
    let status = filters.status.as_deref();
    let search = filters.search.as_deref();

    let (users, total) = tokio::try_join!(
        repo::list_users(db, plan, status, search, limit, offset),
        repo::count_users(db, plan, status, search),
    )?;

    Ok(UserListResponse {
        users,
        total,
        total_pages: (total + limit - 1) / limit,
        page,
    })
}

pub async fn update_user(
    state: &AppState,
    admin_id: Uuid,
    user_id: Uuid,
    req: AdminUpdateUserRequest,
) -> Result<User, AppError> {
    if let Some(plan) = req.plan.as_deref() {
        // reject before touching storage; the tier set is closed
        plan.parse::<PlanTier>()
            .map_err(|e| AppError::Validation(e.to_string()))?;
    }
    if let Some(status) = req.status.as_deref() {
        if !USER_STATUSES.contains(&status) {
            return Err(AppError::Validation(format!("invalid status: {status}")));
        }
    }
    if let Some(email) = req.email.as_deref() {
        if User::email_taken(&state.db, email, Some(user_id)).await? {
            return Err(AppError::Conflict("Email already in use".into()));
        }
    }

    let user = repo::update_user(
        &state.db,
        user_id,
        req.name.as_deref(),
        req.email.as_deref(),
        req.plan.as_deref(),
        req.status.as_deref(),
        req.role_id,
    )
    .await?
    .ok_or(AppError::NotFound("user"))?;

    if req.role_id.is_some() {
        state.permissions.invalidate(user_id);
    }

    info!(user_id = %user_id, admin_id = %admin_id, "user updated by admin");
    audit(
        &state.db,
        "UPDATE_USER",
        admin_id,
        Some(user_id),
        Some(serde_json::json!({
            "plan": req.plan,
            "status": req.status,
            "role_changed": req.role_id.is_some(),
        })),
    )
    .await;

    Ok(user)
}

pub async fn deactivate_user(
    state: &AppState,
    admin_id: Uuid,
    user_id: Uuid,
) -> Result<User, AppError> {
    let user = repo::deactivate_user(&state.db, user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    info!(user_id = %user_id, admin_id = %admin_id, "user deactivated");
    audit(&state.db, "DEACTIVATE_USER", admin_id, Some(user_id), None).await;
    Ok(user)
}

pub fn plan_catalog() -> PlanCatalog {
    PlanCatalog {
        free: PlanCatalogEntry {
            name: "Free".into(),
            price: 0.0,
            max_sheets: 3,
            limits: PlanTier::Free.limits(),
            support: false,
            reports: false,
            export: false,
        },
        basic: PlanCatalogEntry {
            name: "Basic".into(),
            price: 29.90,
            max_sheets: 15,
            limits: PlanTier::Basic.limits(),
            support: true,
            reports: true,
            export: true,
        },
        premium: PlanCatalogEntry {
            name: "Premium".into(),
            price: 59.90,
            max_sheets: -1,
            limits: PlanTier::Premium.limits(),
            support: true,
            reports: true,
            export: true,
        },
    }
}

/// Validate and acknowledge a plan edit. The catalogue itself is
/// code-defined; the edit is audit-logged but not persisted.
pub async fn update_plan(
    state: &AppState,
    admin_id: Uuid,
    tier: &str,
    req: UpdatePlanRequest,
) -> Result<UpdatePlanResponse, AppError> {
    let tier: PlanTier = tier
        .parse()
        .map_err(|e: crate::plans::UnknownPlanError| AppError::Validation(e.to_string()))?;

    info!(tier = %tier, admin_id = %admin_id, "plan configuration updated");
    audit(
        &state.db,
        "UPDATE_PLAN",
        admin_id,
        None,
        Some(serde_json::json!({
            "tier": tier.as_str(),
            "name": req.name,
            "price": req.price,
        })),
    )
    .await;

    Ok(UpdatePlanResponse {
        tier: tier.as_str().into(),
        name: req.name,
        price: req.price,
        max_sheets: req.max_sheets,
        max_rows: req.max_rows,
        max_custom_columns: req.max_custom_columns,
        updated_at: OffsetDateTime::now_utc(),
    })
}

/// Parse a "<days>d" period string.
pub fn parse_period(period: &str) -> Result<i32, AppError> {
    let days: i32 = period
        .strip_suffix('d')
        .unwrap_or(period)
        .parse()
        .map_err(|_| AppError::Validation(format!("invalid period: {period}")))?;
    if days <= 0 {
        return Err(AppError::Validation(format!("invalid period: {period}")));
    }
    Ok(days)
}

pub async fn metrics(db: &PgPool, period: String) -> Result<MetricsResponse, AppError> {
    let window_days = parse_period(&period)?;

    // independent aggregates; one failure aborts the whole response
    let (total_users, active_users, new_signups, total_sheets, recent_sheets) = tokio::try_join!(
        repo::count_all_users(db),
        repo::count_active_users(db),
        repo::count_new_users(db, window_days),
        repo::count_all_sheets(db),
        repo::count_recent_sheets(db, window_days),
    )?;

    let monthly_growth_percent = if new_signups > 0 && total_users > new_signups {
        (new_signups as f64 / (total_users - new_signups) as f64) * 100.0
    } else {
        0.0
    };

    Ok(MetricsResponse {
        total_users,
        active_users,
        new_signups,
        total_sheets,
        recent_sheets,
        monthly_growth_percent: format!("{monthly_growth_percent:.1}"),
        period,
    })
}

pub async fn list_logs(db: &PgPool, query: LogsQuery) -> Result<LogsResponse, AppError> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let offset = (page - 1) * limit;

    let (logs, total) = tokio::try_join!(
        repo::list_audit_logs(db, limit, offset),
        repo::count_audit_logs(db),
    )?;

    Ok(LogsResponse {
        logs,
        total,
        total_pages: (total + limit - 1) / limit,
        page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_parsing_accepts_day_suffix() {
        assert_eq!(parse_period("30d").unwrap(), 30);
        assert_eq!(parse_period("7d").unwrap(), 7);
        assert_eq!(parse_period("90").unwrap(), 90);
    }

    #[test]
    fn period_parsing_rejects_garbage() {
        assert!(parse_period("monthly").is_err());
        assert!(parse_period("-5d").is_err());
        assert!(parse_period("0d").is_err());
    }

    #[test]
    fn catalog_matches_the_limits_table() {
        let catalog = plan_catalog();
        assert_eq!(catalog.free.limits.max_rows, 10);
        assert_eq!(catalog.basic.limits.max_custom_columns, 10);
        assert_eq!(catalog.premium.limits.max_rows, -1);
        assert_eq!(catalog.premium.max_sheets, -1);
    }
}
