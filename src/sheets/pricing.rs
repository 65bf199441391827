//! Cost evaluation for sheet rows. Pure; the four formulas are fixed and
//! not user-editable.

use serde::Serialize;

use crate::sheets::model::{SheetConfig, SheetRow};

/// Evaluator output: two-decimal monetary strings, matching the derived
/// fields stored on a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowCosts {
    pub material_cost: String,
    pub energy_cost: String,
    pub labor_cost: String,
    pub final_price: String,
}

impl RowCosts {
    fn zero() -> Self {
        Self {
            material_cost: "0.00".into(),
            energy_cost: "0.00".into(),
            labor_cost: "0.00".into(),
            final_price: "0.00".into(),
        }
    }
}

/// Compute the four cost components for a row.
///
/// material = (weight_g / 1000) * cost_per_kg
/// energy   = hours * cost_per_kwh * (wattage / 1000)
/// labor    = (hours * 0.2) * cost_per_hour
/// final    = (material + energy + labor) * (1 + margin / 100)
///
/// Non-positive weight or print time yields all zeros. The final price is
/// rounded once, from the unrounded subtotal.
pub fn compute_costs(row: &SheetRow, config: &SheetConfig) -> RowCosts {
    if row.weight_grams <= 0.0 || row.print_hours <= 0.0 {
        return RowCosts::zero();
    }

    let material = (row.weight_grams / 1000.0) * config.cost_per_kg_filament;
    let energy = row.print_hours * config.cost_per_kwh * (config.printer_wattage / 1000.0);
    // 20% of print time billed as post-processing labor
    let labor = (row.print_hours * 0.2) * config.cost_per_hour;
    let subtotal = material + energy + labor;
    let final_price = subtotal * (1.0 + config.profit_margin_percent / 100.0);

    RowCosts {
        material_cost: money(material),
        energy_cost: money(energy),
        labor_cost: money(labor),
        final_price: money(final_price),
    }
}

/// Round half-up to two decimals and format as "x.yy".
fn money(value: f64) -> String {
    format!("{:.2}", (value * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(weight_grams: f64, print_hours: f64) -> SheetRow {
        SheetRow {
            item: "bracket".into(),
            weight_grams,
            print_hours,
            ..serde_json::from_str("{}").unwrap()
        }
    }

    fn config() -> SheetConfig {
        SheetConfig {
            cost_per_kg_filament: 80.0,
            cost_per_kwh: 0.65,
            printer_wattage: 200.0,
            cost_per_hour: 50.0,
            profit_margin_percent: 30.0,
            ..SheetConfig::default()
        }
    }

    #[test]
    fn reference_scenario() {
        let costs = compute_costs(&row(15.0, 2.5), &config());
        assert_eq!(costs.material_cost, "1.20");
        // 2.5 * 0.65 * 0.2 = 0.325, rounded half-up
        assert_eq!(costs.energy_cost, "0.33");
        assert_eq!(costs.labor_cost, "25.00");
        // final price is computed from the unrounded subtotal:
        // 26.525 * 1.3 = 34.4825
        assert_eq!(costs.final_price, "34.48");
    }

    #[test]
    fn zero_weight_zeroes_everything() {
        let costs = compute_costs(&row(0.0, 2.5), &config());
        assert_eq!(costs, RowCosts::zero());
    }

    #[test]
    fn zero_print_time_zeroes_everything() {
        let costs = compute_costs(&row(15.0, 0.0), &config());
        assert_eq!(costs, RowCosts::zero());
    }

    #[test]
    fn negative_inputs_hit_the_same_guard() {
        let costs = compute_costs(&row(-20.0, 3.0), &config());
        assert_eq!(costs, RowCosts::zero());
        let costs = compute_costs(&row(20.0, -3.0), &config());
        assert_eq!(costs, RowCosts::zero());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let r = row(120.0, 6.5);
        let c = config();
        assert_eq!(compute_costs(&r, &c), compute_costs(&r, &c));
    }

    #[test]
    fn rounds_half_up() {
        // 1.25 g at 100 per kg -> 0.125, which must round to 0.13
        let mut cfg = config();
        cfg.cost_per_kg_filament = 100.0;
        cfg.cost_per_kwh = 0.0;
        cfg.cost_per_hour = 0.0;
        cfg.profit_margin_percent = 0.0;
        let costs = compute_costs(&row(1.25, 1.0), &cfg);
        assert_eq!(costs.material_cost, "0.13");
        assert_eq!(costs.final_price, "0.13");
    }

    #[test]
    fn margin_applies_to_the_subtotal() {
        let mut cfg = config();
        cfg.cost_per_kwh = 0.0;
        cfg.profit_margin_percent = 100.0;
        // material = 1.00, labor = 10.00, final = 22.00
        let costs = compute_costs(&row(12.5, 1.0), &cfg);
        assert_eq!(costs.material_cost, "1.00");
        assert_eq!(costs.labor_cost, "10.00");
        assert_eq!(costs.final_price, "22.00");
    }
}
