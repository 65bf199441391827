use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::permissions::types::{Permission, Role};

/// Permissions granted to a user through its role. Empty when the user has
/// no role (or does not exist).
pub async fn permissions_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Permission>> {
    let rows = sqlx::query_as::<_, Permission>(
        r#"
        SELECT p.id, p.name, p.module, p.action
        FROM permissions p
        JOIN role_permissions rp ON rp.permission_id = p.id
        JOIN users u ON u.role_id = rp.role_id
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_roles(db: &PgPool) -> anyhow::Result<Vec<Role>> {
    let rows = sqlx::query_as::<_, Role>(
        r#"
        SELECT id, name, description, active
        FROM roles
        WHERE active
        ORDER BY name
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn role_permissions(db: &PgPool, role_id: Uuid) -> anyhow::Result<Vec<Permission>> {
    let rows = sqlx::query_as::<_, Permission>(
        r#"
        SELECT p.id, p.name, p.module, p.action
        FROM permissions p
        JOIN role_permissions rp ON rp.permission_id = p.id
        WHERE rp.role_id = $1
        ORDER BY p.module, p.action
        "#,
    )
    .bind(role_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_permissions(db: &PgPool) -> anyhow::Result<Vec<Permission>> {
    let rows = sqlx::query_as::<_, Permission>(
        r#"
        SELECT id, name, module, action
        FROM permissions
        ORDER BY module, action
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Create a role and link its permissions in one transaction.
pub async fn create_role(
    db: &PgPool,
    name: &str,
    description: Option<&str>,
    permission_ids: &[Uuid],
) -> anyhow::Result<Role> {
    let mut tx = db.begin().await?;

    let role = sqlx::query_as::<_, Role>(
        r#"
        INSERT INTO roles (name, description)
        VALUES ($1, $2)
        RETURNING id, name, description, active
        "#,
    )
    .bind(name)
    .bind(description)
    .fetch_one(&mut *tx)
    .await?;

    for permission_id in permission_ids {
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(role.id)
        .bind(permission_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(role)
}

/// Reassign a user's role. Returns the updated user, or None when missing.
pub async fn set_user_role(
    db: &PgPool,
    user_id: Uuid,
    role_id: Uuid,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET role_id = $2
        WHERE id = $1
        RETURNING id, name, email, password_hash, oauth_provider, oauth_provider_id,
                  plan_tier, status, role_id, created_at, last_login
        "#,
    )
    .bind(user_id)
    .bind(role_id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}
