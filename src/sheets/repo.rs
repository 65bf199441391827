use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::sheets::dto::SheetSummary;
use crate::sheets::model::{BaseData, CustomColumns, Sheet};

pub async fn insert(
    db: &PgPool,
    owner_id: Uuid,
    name: &str,
    base_data: &BaseData,
    custom_columns: &CustomColumns,
) -> anyhow::Result<Sheet> {
    let sheet = sqlx::query_as::<_, Sheet>(
        r#"
        INSERT INTO sheets (owner_id, name, base_data, custom_columns)
        VALUES ($1, $2, $3, $4)
        RETURNING id, owner_id, name, base_data, custom_columns, created_at, updated_at
        "#,
    )
    .bind(owner_id)
    .bind(name)
    .bind(Json(base_data))
    .bind(Json(custom_columns))
    .fetch_one(db)
    .await?;
    Ok(sheet)
}

pub async fn list_summaries(db: &PgPool, owner_id: Uuid) -> anyhow::Result<Vec<SheetSummary>> {
    let rows = sqlx::query_as::<_, SheetSummary>(
        r#"
        SELECT id, name, created_at, updated_at
        FROM sheets
        WHERE owner_id = $1
        ORDER BY updated_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Owner-scoped lookup. A sheet owned by someone else is indistinguishable
/// from a missing one.
pub async fn find_by_owner(
    db: &PgPool,
    sheet_id: Uuid,
    owner_id: Uuid,
) -> anyhow::Result<Option<Sheet>> {
    let sheet = sqlx::query_as::<_, Sheet>(
        r#"
        SELECT id, owner_id, name, base_data, custom_columns, created_at, updated_at
        FROM sheets
        WHERE id = $1 AND owner_id = $2
        "#,
    )
    .bind(sheet_id)
    .bind(owner_id)
    .fetch_optional(db)
    .await?;
    Ok(sheet)
}

/// Write only the provided fields; absent ones keep their stored value.
pub async fn update_partial(
    db: &PgPool,
    sheet_id: Uuid,
    owner_id: Uuid,
    name: Option<&str>,
    base_data: Option<&BaseData>,
    custom_columns: Option<&CustomColumns>,
) -> anyhow::Result<Option<Sheet>> {
    let sheet = sqlx::query_as::<_, Sheet>(
        r#"
        UPDATE sheets
        SET name = COALESCE($3, name),
            base_data = COALESCE($4, base_data),
            custom_columns = COALESCE($5, custom_columns),
            updated_at = now()
        WHERE id = $1 AND owner_id = $2
        RETURNING id, owner_id, name, base_data, custom_columns, created_at, updated_at
        "#,
    )
    .bind(sheet_id)
    .bind(owner_id)
    .bind(name)
    .bind(base_data.map(Json))
    .bind(custom_columns.map(Json))
    .fetch_optional(db)
    .await?;
    Ok(sheet)
}

pub async fn delete(db: &PgPool, sheet_id: Uuid, owner_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM sheets
        WHERE id = $1 AND owner_id = $2
        "#,
    )
    .bind(sheet_id)
    .bind(owner_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
