use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::plans::PlanLimits;

/// Filters for the administrative user listing.
#[derive(Debug, Deserialize)]
pub struct UserFilters {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub plan: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    20
}

/// User projection for the admin panel, with the owned-sheet count joined
/// in.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AdminUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub plan_tier: String,
    pub status: String,
    pub role: Option<String>,
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
    pub total_sheets: i64,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<AdminUser>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub plan: Option<String>,
    pub status: Option<String>,
    pub role_id: Option<Uuid>,
}

/// Global defaults shown in the admin panel. Held in-process; the values
/// seed new sheet configurations on the client side.
// TODO: persist to a settings table instead of process memory
#[derive(Debug, Clone, Serialize)]
pub struct SystemParams {
    pub default_cost_per_kg_filament: f64,
    pub default_cost_per_kwh: f64,
    pub default_printer_wattage: f64,
    pub default_cost_per_hour: f64,
    pub default_profit_margin_percent: f64,
    pub default_marketplace_fee_percent: f64,
    pub system_currency: String,
    pub backup_retention_days: u32,
    pub support_email: String,
    pub system_version: &'static str,
}

impl Default for SystemParams {
    fn default() -> Self {
        Self {
            default_cost_per_kg_filament: 80.0,
            default_cost_per_kwh: 0.65,
            default_printer_wattage: 200.0,
            default_cost_per_hour: 50.0,
            default_profit_margin_percent: 30.0,
            default_marketplace_fee_percent: 15.0,
            system_currency: "BRL".into(),
            backup_retention_days: 30,
            support_email: "support@printfarm.local".into(),
            system_version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Partial parameter update; unknown fields are dropped by deserialization,
/// and the version is not editable.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateParamsRequest {
    pub default_cost_per_kg_filament: Option<f64>,
    pub default_cost_per_kwh: Option<f64>,
    pub default_printer_wattage: Option<f64>,
    pub default_cost_per_hour: Option<f64>,
    pub default_profit_margin_percent: Option<f64>,
    pub default_marketplace_fee_percent: Option<f64>,
    pub system_currency: Option<String>,
    pub backup_retention_days: Option<u32>,
    pub support_email: Option<String>,
}

/// Catalogue entry for one subscription tier.
#[derive(Debug, Clone, Serialize)]
pub struct PlanCatalogEntry {
    pub name: String,
    pub price: f64,
    pub max_sheets: i64,
    #[serde(flatten)]
    pub limits: PlanLimits,
    pub support: bool,
    pub reports: bool,
    pub export: bool,
}

#[derive(Debug, Serialize)]
pub struct PlanCatalog {
    pub free: PlanCatalogEntry,
    pub basic: PlanCatalogEntry,
    pub premium: PlanCatalogEntry,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlanRequest {
    pub name: String,
    pub price: f64,
    pub max_sheets: i64,
    pub max_rows: i64,
    #[serde(default)]
    pub max_custom_columns: Option<i64>,
    #[serde(default)]
    pub support: Option<bool>,
    #[serde(default)]
    pub reports: Option<bool>,
    #[serde(default)]
    pub export: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UpdatePlanResponse {
    pub tier: String,
    pub name: String,
    pub price: f64,
    pub max_sheets: i64,
    pub max_rows: i64,
    pub max_custom_columns: Option<i64>,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    #[serde(default = "default_period")]
    pub period: String,
}

fn default_period() -> String {
    "30d".into()
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub total_users: i64,
    pub active_users: i64,
    pub new_signups: i64,
    pub total_sheets: i64,
    pub recent_sheets: i64,
    pub monthly_growth_percent: String,
    pub period: String,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: Uuid,
    pub action: String,
    pub admin_id: Uuid,
    pub target_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<AuditLog>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permission_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: Uuid,
}
