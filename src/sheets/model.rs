use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// Sheet record in the database. Ownership is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sheet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub base_data: Json<BaseData>,
    pub custom_columns: Json<CustomColumns>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Row payload of a sheet: ordered item rows plus the pricing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseData {
    #[serde(default)]
    pub rows: Vec<SheetRow>,
    #[serde(default)]
    pub config: SheetConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomColumns {
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(default = "default_column_kind")]
    pub kind: String,
}

fn default_column_kind() -> String {
    "text".into()
}

/// Filament material of a printed item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Material {
    #[default]
    Pla,
    Abs,
    Petg,
    Tpu,
}

/// One priced item. The four `*_cost`/`final_price` fields are derived:
/// they are overwritten with evaluator output on every write, never
/// trusted as client input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetRow {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub material: Material,
    #[serde(default)]
    pub weight_grams: f64,
    #[serde(default)]
    pub print_hours: f64,
    #[serde(default)]
    pub additional_items: f64,
    #[serde(default)]
    pub packaging: f64,
    #[serde(default)]
    pub marketplace_fee_percent: f64,
    #[serde(default = "zero_money")]
    pub material_cost: String,
    #[serde(default = "zero_money")]
    pub energy_cost: String,
    #[serde(default = "zero_money")]
    pub labor_cost: String,
    #[serde(default = "zero_money")]
    pub final_price: String,
}

pub(crate) fn zero_money() -> String {
    "0.00".into()
}

/// Per-sheet pricing configuration. The serde defaults mirror the fallbacks
/// applied when a stored config predates a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_profit_margin")]
    pub profit_margin_percent: f64,
    #[serde(default = "default_cost_per_hour")]
    pub cost_per_hour: f64,
    #[serde(default = "default_cost_per_kg_filament")]
    pub cost_per_kg_filament: f64,
    #[serde(default = "default_cost_per_kwh")]
    pub cost_per_kwh: f64,
    #[serde(default = "default_printer_wattage")]
    pub printer_wattage: f64,
}

fn default_currency() -> String {
    "BRL".into()
}
fn default_profit_margin() -> f64 {
    30.0
}
fn default_cost_per_hour() -> f64 {
    50.0
}
fn default_cost_per_kg_filament() -> f64 {
    80.0
}
fn default_cost_per_kwh() -> f64 {
    0.65
}
fn default_printer_wattage() -> f64 {
    200.0
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            profit_margin_percent: default_profit_margin(),
            cost_per_hour: default_cost_per_hour(),
            cost_per_kg_filament: default_cost_per_kg_filament(),
            cost_per_kwh: default_cost_per_kwh(),
            printer_wattage: default_printer_wattage(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_data_tolerates_absent_rows_and_config() {
        let base: BaseData = serde_json::from_str("{}").unwrap();
        assert!(base.rows.is_empty());
        assert_eq!(base.config.currency, "BRL");
        assert_eq!(base.config.profit_margin_percent, 30.0);
    }

    #[test]
    fn partial_config_falls_back_per_field() {
        let base: BaseData =
            serde_json::from_str(r#"{"config":{"currency":"USD","cost_per_hour":40}}"#).unwrap();
        assert_eq!(base.config.currency, "USD");
        assert_eq!(base.config.cost_per_hour, 40.0);
        assert_eq!(base.config.cost_per_kg_filament, 80.0);
        assert_eq!(base.config.printer_wattage, 200.0);
    }

    #[test]
    fn materials_use_uppercase_wire_names() {
        let row: SheetRow = serde_json::from_str(r#"{"material":"PETG"}"#).unwrap();
        assert_eq!(row.material, Material::Petg);
        assert_eq!(row.material_cost, "0.00");
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains(r#""material":"PETG""#));
    }
}
