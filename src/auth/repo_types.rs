use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. Accounts are never hard-deleted; `status`
/// flips to "inactive" instead.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // None for OAuth-only accounts
    pub oauth_provider: Option<String>,
    pub oauth_provider_id: Option<String>,
    pub plan_tier: String,
    pub status: String,
    pub role_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
}
