use sqlx::PgPool;
use uuid::Uuid;

use crate::admin::dto::{AdminUser, AuditLog};
use crate::auth::repo_types::User;

pub async fn list_users(
    db: &PgPool,
    plan: Option<&str>,
    status: Option<&str>,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<AdminUser>> {
    let rows = sqlx::query_as::<_, AdminUser>(
        r#"
        SELECT u.id, u.name, u.email, u.plan_tier, u.status,
               r.name AS role, u.created_at, u.last_login,
               (SELECT count(*) FROM sheets s WHERE s.owner_id = u.id) AS total_sheets
        FROM users u
        LEFT JOIN roles r ON r.id = u.role_id
        WHERE ($1::text IS NULL OR u.plan_tier = $1)
          AND ($2::text IS NULL OR u.status = $2)
          AND ($3::text IS NULL OR u.name ILIKE '%' || $3 || '%' OR u.email ILIKE '%' || $3 || '%')
        ORDER BY u.created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(plan)
    .bind(status)
    .bind(search)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_users(
    db: &PgPool,
    plan: Option<&str>,
    status: Option<&str>,
    search: Option<&str>,
) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT count(*)
        FROM users u
        WHERE ($1::text IS NULL OR u.plan_tier = $1)
          AND ($2::text IS NULL OR u.status = $2)
          AND ($3::text IS NULL OR u.name ILIKE '%' || $3 || '%' OR u.email ILIKE '%' || $3 || '%')
        "#,
    )
    .bind(plan)
    .bind(status)
    .bind(search)
    .fetch_one(db)
    .await?;
    Ok(count)
}

/// Write only the provided fields; absent ones keep their stored value.
pub async fn update_user(
    db: &PgPool,
    id: Uuid,
    name: Option<&str>,
    email: Option<&str>,
    plan: Option<&str>,
    status: Option<&str>,
    role_id: Option<Uuid>,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET name = COALESCE($2, name),
            email = COALESCE($3, email),
            plan_tier = COALESCE($4, plan_tier),
            status = COALESCE($5, status),
            role_id = COALESCE($6, role_id)
        WHERE id = $1
        RETURNING id, name, email, password_hash, oauth_provider, oauth_provider_id,
                  plan_tier, status, role_id, created_at, last_login
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(plan)
    .bind(status)
    .bind(role_id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Accounts are never hard-deleted; this flips status to inactive.
pub async fn deactivate_user(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET status = 'inactive'
        WHERE id = $1
        RETURNING id, name, email, password_hash, oauth_provider, oauth_provider_id,
                  plan_tier, status, role_id, created_at, last_login
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn count_all_users(db: &PgPool) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT count(*) FROM users")
        .fetch_one(db)
        .await?)
}

pub async fn count_active_users(db: &PgPool) -> anyhow::Result<i64> {
    Ok(
        sqlx::query_scalar::<_, i64>("SELECT count(*) FROM users WHERE status = 'active'")
            .fetch_one(db)
            .await?,
    )
}

pub async fn count_new_users(db: &PgPool, window_days: i32) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar::<_, i64>(
        "SELECT count(*) FROM users WHERE created_at >= now() - make_interval(days => $1)",
    )
    .bind(window_days)
    .fetch_one(db)
    .await?)
}

pub async fn count_all_sheets(db: &PgPool) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT count(*) FROM sheets")
        .fetch_one(db)
        .await?)
}

pub async fn count_recent_sheets(db: &PgPool, window_days: i32) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar::<_, i64>(
        "SELECT count(*) FROM sheets WHERE created_at >= now() - make_interval(days => $1)",
    )
    .bind(window_days)
    .fetch_one(db)
    .await?)
}

pub async fn insert_audit_log(
    db: &PgPool,
    action: &str,
    admin_id: Uuid,
    target_id: Option<Uuid>,
    details: Option<&serde_json::Value>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (action, admin_id, target_id, details)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(action)
    .bind(admin_id)
    .bind(target_id)
    .bind(details)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn list_audit_logs(
    db: &PgPool,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<AuditLog>> {
    let rows = sqlx::query_as::<_, AuditLog>(
        r#"
        SELECT id, action, admin_id, target_id, details, created_at
        FROM audit_logs
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_audit_logs(db: &PgPool) -> anyhow::Result<i64> {
    Ok(
        sqlx::query_scalar::<_, i64>("SELECT count(*) FROM audit_logs")
            .fetch_one(db)
            .await?,
    )
}
