use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;

const USER_COLUMNS: &str = "id, name, email, password_hash, oauth_provider, oauth_provider_id, \
     plan_tier, status, role_id, created_at, last_login";

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_oauth(
        db: &PgPool,
        provider: &str,
        provider_id: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE oauth_provider = $1 AND oauth_provider_id = $2"
        ))
        .bind(provider)
        .bind(provider_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a local-credential user on the free tier with the given role.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        role_id: Uuid,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, plan_tier, status, role_id) \
             VALUES ($1, $2, $3, 'free', 'active', $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role_id)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// True when the email is taken by a user other than `exclude`.
    pub async fn email_taken(
        db: &PgPool,
        email: &str,
        exclude: Option<Uuid>,
    ) -> anyhow::Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(db)
        .await?;
        Ok(taken)
    }

    /// Write only the provided fields; absent ones keep their stored value.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
        password_hash: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users \
             SET name = COALESCE($2, name), \
                 email = COALESCE($3, email), \
                 password_hash = COALESCE($4, password_hash) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn touch_last_login(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Tier of a user, or None when the id does not resolve.
    pub async fn plan_tier(db: &PgPool, id: Uuid) -> anyhow::Result<Option<String>> {
        let tier = sqlx::query_scalar::<_, String>("SELECT plan_tier FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(tier)
    }
}

/// Id of the role assigned to fresh registrations.
pub async fn default_role_id(db: &PgPool) -> anyhow::Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM roles WHERE name = 'user'")
        .fetch_optional(db)
        .await?;
    id.ok_or_else(|| anyhow::anyhow!("default role missing; run migrations first"))
}
