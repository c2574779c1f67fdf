//! Plan command - depreciation schedule for one asset

use crate::cmd::{format_amount, format_percent, read_json, CatalogArgs, SaveArgs};
use crate::core::calendar;
use crate::core::condition::{self, ConditionContext};
use crate::core::{
    build_plan, validate, AssetCategory, CalcResult, CatalogRegistry, DepreciationPlan,
    Incentive, IncentivePolicy, PlanRequest, ScenarioKind,
};
use clap::Args;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct PlanCommand {
    /// Plan request document (JSON). Reads from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,

    /// List the inputs and rules that shaped the schedule
    #[arg(long)]
    explain: bool,

    #[command(flatten)]
    catalog: CatalogArgs,

    #[command(flatten)]
    save: SaveArgs,
}

fn default_regime() -> String {
    "general".to_string()
}

/// Input document for `fincalc plan`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    /// Catalog regime (defaults to general)
    #[serde(default = "default_regime")]
    pub regime: String,
    pub category_id: String,
    #[schemars(with = "f64")]
    pub gross_value: Decimal,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub residual_value: Option<Decimal>,
    /// YYYY-MM-DD
    pub placed_in_service: String,
    #[serde(default)]
    pub is_used_asset: bool,
    #[serde(default)]
    pub incentive: Option<Incentive>,
    /// Percentage of the gross value reported as recoverable tax
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub recoverable_tax_percent: Option<Decimal>,
}

impl PlanDocument {
    pub fn to_request(&self) -> CalcResult<PlanRequest> {
        validate::non_empty("categoryId", &self.category_id)?;
        let placed = calendar::parse_iso_date("placedInService", &self.placed_in_service)?;
        Ok(PlanRequest {
            residual_value: self.residual_value.unwrap_or(Decimal::ZERO),
            is_used_asset: self.is_used_asset,
            incentive: self.incentive,
            recoverable_tax_percent: self.recoverable_tax_percent,
            ..PlanRequest::new(self.gross_value, placed)
        })
    }
}

pub fn evaluate(
    document: &PlanDocument,
    registry: &CatalogRegistry,
    policy: &IncentivePolicy,
) -> anyhow::Result<(AssetCategory, PlanRequest, DepreciationPlan)> {
    let request = document.to_request()?;
    let category = registry.get(&document.regime, &document.category_id)?;
    let plan = build_plan(&category, &request, policy)?;
    Ok((category, request, plan))
}

impl PlanCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let document: PlanDocument = read_json(&self.file)?;
        let registry = self.catalog.registry()?;
        let policy = self.catalog.policy()?;
        let (category, request, plan) = evaluate(&document, &registry, &policy)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            print_plan(&category, &plan);
            if self.explain {
                print_explanation(&ConditionContext {
                    request: &request,
                    category: &category,
                    policy: &policy,
                });
            }
        }

        self.save.save(
            ScenarioKind::Plan,
            serde_json::to_value(&document)?,
            serde_json::json!({
                "categoryId": plan.category_id,
                "effectiveBase": plan.effective_base,
                "rateApplied": plan.rate_applied,
                "years": plan.rows.len(),
                "firstYearAllowance": plan.rows.first().map(|r| r.allowance),
                "totalAllowance": plan.total_allowance(),
                "recoverableTax": plan.recoverable_tax,
                "complete": plan.is_complete(),
            }),
        )
    }
}

#[derive(Debug, Clone, Tabled)]
struct ScheduleRow {
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Opening")]
    opening: String,
    #[tabled(rename = "Allowance")]
    allowance: String,
    #[tabled(rename = "Closing")]
    closing: String,
    #[tabled(rename = "Rule")]
    rule: String,
}

fn print_plan(category: &AssetCategory, plan: &DepreciationPlan) {
    println!();
    println!("DEPRECIATION PLAN: {} ({})", category.name, category.id);
    println!();
    println!("  Depreciable base:  {}", format_amount(plan.effective_base));
    println!("  Total allowance:   {}", format_amount(plan.total_allowance()));
    println!("  Rate applied:      {}", format_percent(plan.rate_applied));
    println!(
        "  Useful life:       {} years (maximum {})",
        plan.estimated_useful_life_years, plan.max_period_years
    );
    if let Some(incentive) = plan.incentive_applied {
        println!("  Incentive:         {}", incentive.display());
    }
    if let Some(tax) = plan.recoverable_tax {
        println!("  Recoverable tax:   {}", format_amount(tax));
    }
    println!();

    if plan.rows.is_empty() {
        println!("  (nothing to depreciate)");
    } else {
        let rows: Vec<ScheduleRow> = plan
            .rows
            .iter()
            .map(|r| ScheduleRow {
                year: r.year_label.clone(),
                opening: format_amount(r.opening_base),
                allowance: format_amount(r.allowance),
                closing: format_amount(r.closing_base),
                rule: r.note.display(),
            })
            .collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
    }

    if !plan.warnings.is_empty() {
        println!();
        for warning in &plan.warnings {
            println!("\u{26A0} {}", warning);
        }
    }
}

fn print_explanation(ctx: &ConditionContext<'_>) {
    let fields = condition::plan_fields();
    let rules = condition::plan_rules();
    let applied = condition::applicable(&rules, ctx);

    println!();
    println!("Inputs used:");
    for key in condition::applicable_fields(ctx.request, ctx.category) {
        let description = fields
            .iter()
            .find(|f| f.key == key)
            .map_or("", |f| f.description);
        println!("  {:24} {}", key, description);
    }
    println!();
    println!("Rules applied:");
    for rule in applied {
        println!("  - {}", rule.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::warnings::PlanWarning;
    use crate::core::{CalcError, CatalogTables};
    use rust_decimal_macros::dec;

    fn builtin() -> CatalogRegistry {
        CatalogRegistry::with_defaults()
    }

    fn document(json: &str) -> PlanDocument {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn vehicle_plan_from_document() {
        let doc = document(
            r#"{"categoryId": "passenger-vehicles", "grossValue": 28000,
                "placedInService": "2025-01-01"}"#,
        );
        let (category, _, plan) = evaluate(&doc, &builtin(), &IncentivePolicy::default()).unwrap();
        assert_eq!(category.max_rate_percent, dec!(16));
        assert_eq!(plan.rows[0].allowance, dec!(4480));
        assert_eq!(plan.total_allowance(), dec!(28000));
    }

    #[test]
    fn free_allocation_from_document() {
        let doc = document(
            r#"{"regime": "simplified", "categoryId": "machinery", "grossValue": 10000,
                "placedInService": "2024-10-10",
                "incentive": {"mode": "freeAllocation", "percent": 60},
                "recoverableTaxPercent": 21}"#,
        );
        let (_, _, plan) = evaluate(&doc, &builtin(), &IncentivePolicy::default()).unwrap();
        assert_eq!(plan.rows[0].allowance, dec!(6000));
        assert_eq!(plan.recoverable_tax, Some(dec!(2100)));
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let doc = document(
            r#"{"categoryId": "machinery", "grossValue": 1000, "placedInService": "2024-02-29"}"#,
        );
        assert_eq!(doc.regime, "general");
        let request = doc.to_request().unwrap();
        assert_eq!(request.residual_value, Decimal::ZERO);
        assert!(!request.is_used_asset);
        assert_eq!(request.incentive, None);
        assert_eq!(request.recoverable_tax_percent, None);
    }

    #[test]
    fn category_comes_from_replaced_tables() {
        let registry = builtin();
        let catalog = r#"{
            "general": [{"id": "drones", "family": "transport", "name": "Drones",
                         "maxRatePercent": 25, "maxPeriodYears": 8, "allowsIncentive": true}],
            "simplified": [{"id": "drones", "family": "transport", "name": "Drones",
                            "maxRatePercent": 26, "maxPeriodYears": 10, "allowsIncentive": false}]
        }"#;
        registry
            .replace_all(CatalogTables::from_json(catalog.as_bytes()).unwrap())
            .unwrap();

        let doc = document(
            r#"{"categoryId": "drones", "grossValue": 4000, "placedInService": "2025-01-01"}"#,
        );
        let (category, _, plan) = evaluate(&doc, &registry, &IncentivePolicy::default()).unwrap();
        assert_eq!(category.name, "Drones");
        assert_eq!(plan.rows[0].allowance, dec!(1000));

        let doc = document(
            r#"{"categoryId": "machinery", "grossValue": 4000, "placedInService": "2025-01-01"}"#,
        );
        assert!(evaluate(&doc, &registry, &IncentivePolicy::default()).is_err());
    }

    #[test]
    fn malformed_date_names_field() {
        let doc = document(
            r#"{"categoryId": "machinery", "grossValue": 1000, "placedInService": "2024-13-01"}"#,
        );
        let err = doc.to_request().unwrap_err();
        assert_eq!(err.field(), Some("placedInService"));
    }

    #[test]
    fn unknown_category_is_reported() {
        let doc = document(
            r#"{"categoryId": "rockets", "grossValue": 1000, "placedInService": "2024-01-01"}"#,
        );
        let err = evaluate(&doc, &builtin(), &IncentivePolicy::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CalcError>(),
            Some(CalcError::NotFound { .. })
        ));
    }

    #[test]
    fn custom_policy_moves_eligibility() {
        let doc = document(
            r#"{"categoryId": "machinery", "grossValue": 1000, "placedInService": "2024-01-01",
                "incentive": {"mode": "accelerated"}}"#,
        );
        let policy: IncentivePolicy =
            serde_json::from_str(r#"{"freeAllocationYears": [], "acceleratedYears": [2024]}"#)
                .unwrap();
        let (_, _, plan) = evaluate(&doc, &builtin(), &policy).unwrap();
        assert_eq!(plan.rate_applied, dec!(24));

        let (_, _, plan) = evaluate(&doc, &builtin(), &IncentivePolicy::default()).unwrap();
        assert_eq!(plan.rate_applied, dec!(12));
        assert!(matches!(
            plan.warnings[0],
            PlanWarning::IncentiveNotEligible { year: 2024, .. }
        ));
    }
}
