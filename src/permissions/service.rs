use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::error::AppError;
use crate::permissions::cache::PermissionCache;
use crate::permissions::repo;
use crate::permissions::types::{PermissionKey, PermissionSet, Role};

/// Resolve a user's permission set through the cache; on a miss, walk
/// User -> Role -> role_permissions -> Permission and remember the result.
pub async fn get_permissions(
    db: &PgPool,
    cache: &PermissionCache,
    user_id: Uuid,
) -> anyhow::Result<PermissionSet> {
    if let Some(set) = cache.get(user_id) {
        debug!(user_id = %user_id, "permission cache hit");
        return Ok(set);
    }

    let set: PermissionSet = repo::permissions_for_user(db, user_id)
        .await?
        .iter()
        .map(|p| p.key())
        .collect();
    cache.put(user_id, set.clone());
    debug!(user_id = %user_id, count = set.len(), "permissions resolved");
    Ok(set)
}

pub async fn has_permission(
    db: &PgPool,
    cache: &PermissionCache,
    user_id: Uuid,
    module: &str,
    action: &str,
) -> anyhow::Result<bool> {
    let set = get_permissions(db, cache, user_id).await?;
    Ok(set.contains(&PermissionKey::new(module, action)))
}

/// Admin-panel access: any of the administrative permissions grants it.
pub async fn has_admin_access(
    db: &PgPool,
    cache: &PermissionCache,
    user_id: Uuid,
) -> anyhow::Result<bool> {
    let set = get_permissions(db, cache, user_id).await?;
    let admin_keys = [
        PermissionKey::new("system", "read"),
        PermissionKey::new("users", "admin"),
        PermissionKey::new("sheets", "admin"),
    ];
    Ok(admin_keys.iter().any(|key| set.contains(key)))
}

pub async fn require_permission(
    db: &PgPool,
    cache: &PermissionCache,
    user_id: Uuid,
    module: &str,
    action: &str,
) -> Result<(), AppError> {
    if has_permission(db, cache, user_id, module, action).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Missing permission: {module}.{action}"
        )))
    }
}

pub async fn require_admin(
    db: &PgPool,
    cache: &PermissionCache,
    user_id: Uuid,
) -> Result<(), AppError> {
    if has_admin_access(db, cache, user_id).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden("Administrator access required".into()))
    }
}

/// Reassign a user's role and invalidate the stale cache entry right away.
pub async fn assign_role(
    db: &PgPool,
    cache: &PermissionCache,
    user_id: Uuid,
    role_id: Uuid,
) -> Result<User, AppError> {
    let user = repo::set_user_role(db, user_id, role_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    cache.invalidate(user_id);
    info!(user_id = %user_id, role_id = %role_id, "role assigned");
    Ok(user)
}

/// Create a role; the global cache is cleared since role definitions
/// changed.
pub async fn create_role(
    db: &PgPool,
    cache: &PermissionCache,
    name: &str,
    description: Option<&str>,
    permission_ids: &[Uuid],
) -> Result<Role, AppError> {
    let role = repo::create_role(db, name, description, permission_ids).await?;
    cache.invalidate_all();
    info!(role_id = %role.id, name = %role.name, "role created");
    Ok(role)
}
