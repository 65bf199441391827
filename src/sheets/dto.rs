use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::plans::PlanLimits;
use crate::sheets::model::{BaseData, CustomColumns};

/// Request body for sheet creation. Everything is optional; defaults are
/// applied server-side.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSheetRequest {
    pub name: Option<String>,
    pub base_data: Option<BaseData>,
    pub custom_columns: Option<CustomColumns>,
}

/// Partial update: only the provided fields are written.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSheetRequest {
    pub name: Option<String>,
    pub base_data: Option<BaseData>,
    pub custom_columns: Option<CustomColumns>,
}

/// Listing projection.
#[derive(Debug, Serialize, FromRow)]
pub struct SheetSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct PlanLimitsResponse {
    pub tier: String,
    pub limits: PlanLimits,
}
