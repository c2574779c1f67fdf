//! Typed conditions deciding which request fields and plan rules apply.

use super::catalog::AssetCategory;
use super::depreciation::{IncentiveKind, IncentivePolicy, PlanRequest};
use chrono::Datelike;

/// Boolean facts read straight from a plan request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFlag {
    UsedAsset,
    HasIncentive,
    HasRecoverableTax,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Always,
    Flag { field: PlanFlag, equals: bool },
    CategoryAllowsIncentive,
    IncentiveIs(IncentiveKind),
    /// The placement year is covered by the policy for this incentive.
    IncentiveEligible(IncentiveKind),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

/// Everything a condition may look at.
#[derive(Debug, Clone, Copy)]
pub struct ConditionContext<'a> {
    pub request: &'a PlanRequest,
    pub category: &'a AssetCategory,
    pub policy: &'a IncentivePolicy,
}

impl Condition {
    pub fn evaluate(&self, ctx: &ConditionContext<'_>) -> bool {
        match self {
            Condition::Always => true,
            Condition::Flag { field, equals } => {
                let value = match field {
                    PlanFlag::UsedAsset => ctx.request.is_used_asset,
                    PlanFlag::HasIncentive => ctx.request.incentive.is_some(),
                    PlanFlag::HasRecoverableTax => ctx.request.recoverable_tax_percent.is_some(),
                };
                value == *equals
            }
            Condition::CategoryAllowsIncentive => ctx.category.allows_incentive,
            Condition::IncentiveIs(kind) => {
                ctx.request.incentive.is_some_and(|i| i.kind() == *kind)
            }
            Condition::IncentiveEligible(kind) => ctx
                .policy
                .is_eligible(*kind, ctx.request.placed_in_service.year()),
            Condition::All(conditions) => conditions.iter().all(|c| c.evaluate(ctx)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.evaluate(ctx)),
            Condition::Not(condition) => !condition.evaluate(ctx),
        }
    }

    fn is(field: PlanFlag) -> Condition {
        Condition::Flag {
            field,
            equals: true,
        }
    }

    fn applied(kind: IncentiveKind) -> Condition {
        Condition::All(vec![
            Condition::IncentiveIs(kind),
            Condition::IncentiveEligible(kind),
        ])
    }

    fn rejected(kind: IncentiveKind) -> Condition {
        Condition::All(vec![
            Condition::IncentiveIs(kind),
            Condition::Not(Box::new(Condition::IncentiveEligible(kind))),
        ])
    }
}

/// A named item shown only when its condition holds.
#[derive(Debug, Clone)]
pub struct Guarded {
    pub key: &'static str,
    pub description: &'static str,
    pub condition: Condition,
}

fn guarded(key: &'static str, description: &'static str, condition: Condition) -> Guarded {
    Guarded {
        key,
        description,
        condition,
    }
}

/// Input fields of a depreciation request.
pub fn plan_fields() -> Vec<Guarded> {
    vec![
        guarded("grossValue", "Acquisition value of the asset", Condition::Always),
        guarded("residualValue", "Residual value excluded from the base", Condition::Always),
        guarded("placedInService", "Date the asset entered service", Condition::Always),
        guarded("isUsedAsset", "Second-hand asset (rate doubled)", Condition::Always),
        guarded(
            "incentive",
            "Free allocation or accelerated depreciation",
            Condition::CategoryAllowsIncentive,
        ),
        guarded(
            "incentive.percent",
            "Share of the base written off in the first year",
            Condition::All(vec![
                Condition::CategoryAllowsIncentive,
                Condition::IncentiveIs(IncentiveKind::FreeAllocation),
            ]),
        ),
        guarded(
            "recoverableTaxPercent",
            "Flat tax rate recoverable on the gross value",
            Condition::Always,
        ),
    ]
}

/// Rules that shape a plan, used to explain a schedule.
pub fn plan_rules() -> Vec<Guarded> {
    let free = IncentiveKind::FreeAllocation;
    let accelerated = IncentiveKind::Accelerated;
    vec![
        guarded(
            "usedAsset",
            "Rate doubled for a used asset (capped at 100%)",
            Condition::is(PlanFlag::UsedAsset),
        ),
        guarded(
            "accelerated",
            "Rate doubled by accelerated depreciation (capped at 100%)",
            Condition::applied(accelerated),
        ),
        guarded(
            "freeAllocation",
            "First year written off at the chosen percentage, no pro-rata",
            Condition::applied(free),
        ),
        guarded(
            "proRata",
            "First year pro-rata by days owned",
            Condition::Not(Box::new(Condition::applied(free))),
        ),
        guarded(
            "incentiveNotEligible",
            "Requested incentive does not cover the placement year",
            Condition::All(vec![
                Condition::is(PlanFlag::HasIncentive),
                Condition::Any(vec![Condition::rejected(free), Condition::rejected(accelerated)]),
            ]),
        ),
        guarded(
            "recoverableTax",
            "Recoverable tax computed as a flat share of the gross value",
            Condition::is(PlanFlag::HasRecoverableTax),
        ),
    ]
}

pub fn applicable<'a>(items: &'a [Guarded], ctx: &ConditionContext<'_>) -> Vec<&'a Guarded> {
    items.iter().filter(|g| g.condition.evaluate(ctx)).collect()
}

/// Names of the request fields that apply to `request` for `category`.
pub fn applicable_fields(request: &PlanRequest, category: &AssetCategory) -> Vec<&'static str> {
    // field conditions never consult the policy
    let policy = IncentivePolicy::default();
    let ctx = ConditionContext {
        request,
        category,
        policy: &policy,
    };
    plan_fields()
        .into_iter()
        .filter(|g| g.condition.evaluate(&ctx))
        .map(|g| g.key)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::CatalogTables;
    use crate::core::depreciation::Incentive;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn request(placed: &str) -> PlanRequest {
        PlanRequest::new(
            dec!(10000),
            NaiveDate::parse_from_str(placed, "%Y-%m-%d").unwrap(),
        )
    }

    fn keys(items: &[&Guarded]) -> Vec<&'static str> {
        items.iter().map(|g| g.key).collect()
    }

    #[test]
    fn incentive_fields_hidden_for_excluded_categories() {
        let tables = CatalogTables::builtin();
        let category = tables.get("general", "furniture").unwrap();
        let policy = IncentivePolicy::default();
        let request = request("2024-03-01");
        let ctx = ConditionContext {
            request: &request,
            category,
            policy: &policy,
        };
        let fields = plan_fields();
        let shown = keys(&applicable(&fields, &ctx));
        assert!(!shown.contains(&"incentive"));
        assert!(!shown.contains(&"incentive.percent"));
        assert!(shown.contains(&"grossValue"));
    }

    #[test]
    fn percent_field_only_for_free_allocation() {
        let tables = CatalogTables::builtin();
        let category = tables.get("general", "machinery").unwrap();
        let policy = IncentivePolicy::default();
        let mut request = request("2024-03-01");

        request.incentive = Some(Incentive::Accelerated);
        let ctx = ConditionContext {
            request: &request,
            category,
            policy: &policy,
        };
        let fields = plan_fields();
        assert!(!keys(&applicable(&fields, &ctx)).contains(&"incentive.percent"));

        let mut request = request.clone();
        request.incentive = Some(Incentive::FreeAllocation { percent: dec!(50) });
        let ctx = ConditionContext {
            request: &request,
            category,
            policy: &policy,
        };
        assert!(keys(&applicable(&fields, &ctx)).contains(&"incentive.percent"));
    }

    #[test]
    fn field_names_for_request() {
        let tables = CatalogTables::builtin();
        let mut request = request("2024-03-01");
        request.incentive = Some(Incentive::FreeAllocation { percent: dec!(60) });

        let machinery = tables.get("simplified", "machinery").unwrap();
        let fields = applicable_fields(&request, machinery);
        assert_eq!(fields.len(), 7);
        assert!(fields.contains(&"incentive.percent"));

        let tools = tables.get("simplified", "tools").unwrap();
        assert_eq!(applicable_fields(&request, tools).len(), 5);
    }

    #[test]
    fn rules_follow_eligibility() {
        let tables = CatalogTables::builtin();
        let category = tables.get("general", "machinery").unwrap();
        let policy = IncentivePolicy::default();
        let rules = plan_rules();

        let mut eligible = request("2024-06-01");
        eligible.incentive = Some(Incentive::FreeAllocation { percent: dec!(60) });
        let ctx = ConditionContext {
            request: &eligible,
            category,
            policy: &policy,
        };
        assert_eq!(keys(&applicable(&rules, &ctx)), vec!["freeAllocation"]);

        let mut ineligible = request("2020-06-01");
        ineligible.incentive = Some(Incentive::Accelerated);
        ineligible.is_used_asset = true;
        let ctx = ConditionContext {
            request: &ineligible,
            category,
            policy: &policy,
        };
        assert_eq!(
            keys(&applicable(&rules, &ctx)),
            vec!["usedAsset", "proRata", "incentiveNotEligible"]
        );
    }
}
