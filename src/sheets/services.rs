use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::error::AppError;
use crate::plans::{PlanTier, UnknownPlanError, UNLIMITED};
use crate::sheets::dto::{CreateSheetRequest, PlanLimitsResponse, SheetSummary, UpdateSheetRequest};
use crate::sheets::model::{BaseData, CustomColumns, Sheet};
use crate::sheets::pricing::compute_costs;
use crate::sheets::repo;

const DEFAULT_SHEET_NAME: &str = "My Spreadsheet";

/// Soft outcome of a quota check. An unknown tier is a hard error instead.
#[derive(Debug, PartialEq, Eq)]
pub enum LimitCheck {
    Ok,
    Exceeded { reason: String },
}

/// Check a candidate sheet body against the tier's quotas. Rows are checked
/// before columns; the first violation wins.
pub fn check_limits(
    tier: &str,
    base_data: &BaseData,
    custom_columns: &CustomColumns,
) -> Result<LimitCheck, UnknownPlanError> {
    let tier: PlanTier = tier.parse()?;
    let limits = tier.limits();

    if limits.max_rows != UNLIMITED && base_data.rows.len() as i64 > limits.max_rows {
        return Ok(LimitCheck::Exceeded {
            reason: format!("{} plan allows at most {} rows", tier, limits.max_rows),
        });
    }

    if limits.max_custom_columns != UNLIMITED
        && custom_columns.columns.len() as i64 > limits.max_custom_columns
    {
        return Ok(LimitCheck::Exceeded {
            reason: format!(
                "{} plan allows at most {} custom columns",
                tier, limits.max_custom_columns
            ),
        });
    }

    Ok(LimitCheck::Ok)
}

/// Overwrite every row's derived fields with evaluator output, so persisted
/// rows always agree with recomputation.
pub fn normalize_rows(base_data: &mut BaseData) {
    let config = base_data.config.clone();
    for row in &mut base_data.rows {
        let costs = compute_costs(row, &config);
        row.material_cost = costs.material_cost;
        row.energy_cost = costs.energy_cost;
        row.labor_cost = costs.labor_cost;
        row.final_price = costs.final_price;
    }
}

async fn owner_tier(db: &PgPool, owner_id: Uuid) -> Result<String, AppError> {
    User::plan_tier(db, owner_id)
        .await?
        .ok_or(AppError::UserNotFound)
}

pub async fn create_sheet(
    db: &PgPool,
    owner_id: Uuid,
    req: CreateSheetRequest,
) -> Result<Sheet, AppError> {
    let tier = owner_tier(db, owner_id).await?;

    let mut base_data = req.base_data.unwrap_or_default();
    let custom_columns = req.custom_columns.unwrap_or_default();

    if let LimitCheck::Exceeded { reason } = check_limits(&tier, &base_data, &custom_columns)? {
        return Err(AppError::Validation(reason));
    }

    normalize_rows(&mut base_data);
    let name = req.name.unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());

    let sheet = repo::insert(db, owner_id, &name, &base_data, &custom_columns).await?;
    info!(sheet_id = %sheet.id, owner_id = %owner_id, "sheet created");
    Ok(sheet)
}

pub async fn list_sheets(db: &PgPool, owner_id: Uuid) -> Result<Vec<SheetSummary>, AppError> {
    Ok(repo::list_summaries(db, owner_id).await?)
}

pub async fn get_sheet(db: &PgPool, sheet_id: Uuid, owner_id: Uuid) -> Result<Sheet, AppError> {
    repo::find_by_owner(db, sheet_id, owner_id)
        .await?
        .ok_or(AppError::NotFound("sheet"))
}

pub async fn update_sheet(
    db: &PgPool,
    sheet_id: Uuid,
    owner_id: Uuid,
    req: UpdateSheetRequest,
) -> Result<Sheet, AppError> {
    let current = repo::find_by_owner(db, sheet_id, owner_id)
        .await?
        .ok_or(AppError::NotFound("sheet"))?;

    // Re-validate whenever either payload changes, merging the incoming side
    // with the stored value of the other.
    if req.base_data.is_some() || req.custom_columns.is_some() {
        let tier = owner_tier(db, owner_id).await?;
        let base_data = req.base_data.as_ref().unwrap_or(&current.base_data.0);
        let custom_columns = req.custom_columns.as_ref().unwrap_or(&current.custom_columns.0);
        if let LimitCheck::Exceeded { reason } = check_limits(&tier, base_data, custom_columns)? {
            return Err(AppError::Validation(reason));
        }
    }

    let base_data = req.base_data.map(|mut b| {
        normalize_rows(&mut b);
        b
    });

    let sheet = repo::update_partial(
        db,
        sheet_id,
        owner_id,
        req.name.as_deref(),
        base_data.as_ref(),
        req.custom_columns.as_ref(),
    )
    .await?
    .ok_or(AppError::NotFound("sheet"))?;

    info!(sheet_id = %sheet.id, owner_id = %owner_id, "sheet updated");
    Ok(sheet)
}

pub async fn delete_sheet(db: &PgPool, sheet_id: Uuid, owner_id: Uuid) -> Result<(), AppError> {
    let deleted = repo::delete(db, sheet_id, owner_id).await?;
    if !deleted {
        return Err(AppError::NotFound("sheet"));
    }
    info!(sheet_id = %sheet_id, owner_id = %owner_id, "sheet deleted");
    Ok(())
}

pub async fn plan_limits(db: &PgPool, owner_id: Uuid) -> Result<PlanLimitsResponse, AppError> {
    let tier = owner_tier(db, owner_id).await?;
    let parsed: PlanTier = tier.parse()?;
    Ok(PlanLimitsResponse {
        tier,
        limits: parsed.limits(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::model::{ColumnDef, SheetRow};

    fn rows(n: usize) -> BaseData {
        let row: SheetRow = serde_json::from_str("{}").unwrap();
        BaseData {
            rows: vec![row; n],
            config: Default::default(),
        }
    }

    fn columns(n: usize) -> CustomColumns {
        CustomColumns {
            columns: vec![
                ColumnDef { name: "finish".into(), kind: "text".into() };
                n
            ],
        }
    }

    #[test]
    fn within_quota_passes() {
        let check = check_limits("free", &rows(10), &columns(3)).unwrap();
        assert_eq!(check, LimitCheck::Ok);
    }

    #[test]
    fn free_tier_rejects_fifteen_rows_citing_the_limit() {
        let check = check_limits("free", &rows(15), &columns(0)).unwrap();
        match check {
            LimitCheck::Exceeded { reason } => {
                assert!(reason.contains("10"), "reason should cite the cap: {reason}");
                assert!(reason.contains("free"));
            }
            LimitCheck::Ok => panic!("expected a row-limit violation"),
        }
    }

    #[test]
    fn column_quota_is_enforced() {
        let check = check_limits("basic", &rows(1), &columns(11)).unwrap();
        match check {
            LimitCheck::Exceeded { reason } => assert!(reason.contains("custom columns")),
            LimitCheck::Ok => panic!("expected a column-limit violation"),
        }
    }

    #[test]
    fn row_violation_is_reported_before_column_violation() {
        let check = check_limits("free", &rows(15), &columns(9)).unwrap();
        match check {
            LimitCheck::Exceeded { reason } => {
                assert!(reason.contains("rows"), "row check short-circuits: {reason}")
            }
            LimitCheck::Ok => panic!("expected a violation"),
        }
    }

    #[test]
    fn premium_is_uncapped() {
        let check = check_limits("premium", &rows(10_000), &columns(500)).unwrap();
        assert_eq!(check, LimitCheck::Ok);
    }

    #[test]
    fn empty_payloads_never_violate() {
        let check = check_limits("free", &BaseData::default(), &CustomColumns::default()).unwrap();
        assert_eq!(check, LimitCheck::Ok);
    }

    #[test]
    fn unknown_tier_is_a_hard_error() {
        let err = check_limits("gold", &rows(0), &columns(0)).unwrap_err();
        assert!(err.to_string().contains("gold"));
    }

    #[test]
    fn normalize_rows_rewrites_derived_fields() {
        let mut base: BaseData = serde_json::from_str(
            r#"{
                "rows": [{
                    "item": "vase",
                    "weight_grams": 15,
                    "print_hours": 2.5,
                    "material_cost": "999.99",
                    "final_price": "999.99"
                }],
                "config": {}
            }"#,
        )
        .unwrap();
        normalize_rows(&mut base);
        let row = &base.rows[0];
        assert_eq!(row.material_cost, "1.20");
        assert_eq!(row.energy_cost, "0.33");
        assert_eq!(row.labor_cost, "25.00");
        assert_eq!(row.final_price, "34.48");
    }

    #[test]
    fn normalize_rows_zeroes_unprintable_rows() {
        let mut base = rows(1);
        base.rows[0].material_cost = "5.00".into();
        normalize_rows(&mut base);
        assert_eq!(base.rows[0].material_cost, "0.00");
        assert_eq!(base.rows[0].final_price, "0.00");
    }
}
