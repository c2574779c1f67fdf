//! Multi-year depreciation schedules.
//!
//! A plan runs through a fixed sequence of states:
//! first year (free allocation or pro-rata), then standard years until the
//! depreciable base is exhausted or the row limit is reached.

use super::calendar;
use super::catalog::AssetCategory;
use super::error::{CalcError, CalcResult};
use super::validate::{self, EPSILON, HUNDRED};
use super::warnings::PlanWarning;
use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Maximum number of rows a single plan may produce.
pub const GUARD_CAP: usize = 120;

/// Incentive requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum Incentive {
    /// Write off `percent` of the base in the first year, without pro-rata
    FreeAllocation {
        #[schemars(with = "f64")]
        percent: Decimal,
    },
    /// Double the yearly rate for the whole schedule
    Accelerated,
}

impl Incentive {
    pub fn kind(&self) -> IncentiveKind {
        match self {
            Incentive::FreeAllocation { .. } => IncentiveKind::FreeAllocation,
            Incentive::Accelerated => IncentiveKind::Accelerated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum IncentiveKind {
    FreeAllocation,
    Accelerated,
}

impl IncentiveKind {
    pub fn display(&self) -> &'static str {
        match self {
            IncentiveKind::FreeAllocation => "Free allocation",
            IncentiveKind::Accelerated => "Accelerated depreciation",
        }
    }
}

/// Placement years in which each incentive is available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncentivePolicy {
    pub free_allocation_years: BTreeSet<i32>,
    pub accelerated_years: BTreeSet<i32>,
}

impl Default for IncentivePolicy {
    fn default() -> Self {
        IncentivePolicy {
            free_allocation_years: BTreeSet::from([2023, 2024]),
            accelerated_years: BTreeSet::from([2025]),
        }
    }
}

impl IncentivePolicy {
    /// A year may belong to one incentive only.
    pub fn validate(&self) -> CalcResult<()> {
        if let Some(year) = self
            .free_allocation_years
            .intersection(&self.accelerated_years)
            .next()
        {
            return Err(CalcError::configuration(format!(
                "year {year} is eligible for both free allocation and accelerated depreciation"
            )));
        }
        Ok(())
    }

    pub fn is_eligible(&self, kind: IncentiveKind, year: i32) -> bool {
        match kind {
            IncentiveKind::FreeAllocation => self.free_allocation_years.contains(&year),
            IncentiveKind::Accelerated => self.accelerated_years.contains(&year),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub gross_value: Decimal,
    pub residual_value: Decimal,
    pub placed_in_service: NaiveDate,
    pub is_used_asset: bool,
    pub incentive: Option<Incentive>,
    pub recoverable_tax_percent: Option<Decimal>,
}

impl PlanRequest {
    pub fn new(gross_value: Decimal, placed_in_service: NaiveDate) -> Self {
        PlanRequest {
            gross_value,
            residual_value: Decimal::ZERO,
            placed_in_service,
            is_used_asset: false,
            incentive: None,
            recoverable_tax_percent: None,
        }
    }
}

/// Which rule produced a schedule row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum RowRule {
    FreeAllocation {
        percent: Decimal,
    },
    #[serde(rename_all = "camelCase")]
    ProRata {
        days_owned: u32,
        days_in_year: u32,
    },
    Standard,
}

impl RowRule {
    pub fn display(&self) -> String {
        match self {
            RowRule::FreeAllocation { percent } => format!("Free allocation {percent}%"),
            RowRule::ProRata {
                days_owned,
                days_in_year,
            } => format!("Pro-rata {days_owned}/{days_in_year} days"),
            RowRule::Standard => "Standard".to_string(),
        }
    }
}

impl std::fmt::Display for RowRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// One year of a depreciation schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepreciationState {
    pub year_label: String,
    pub opening_base: Decimal,
    pub allowance: Decimal,
    pub closing_base: Decimal,
    pub note: RowRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Termination {
    Exhausted,
    GuardLimited,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepreciationPlan {
    pub category_id: String,
    pub effective_base: Decimal,
    pub rate_applied: Decimal,
    pub estimated_useful_life_years: u32,
    pub max_period_years: u32,
    pub incentive_applied: Option<IncentiveKind>,
    pub rows: Vec<DepreciationState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recoverable_tax: Option<Decimal>,
    pub termination: Termination,
    pub warnings: Vec<PlanWarning>,
}

impl DepreciationPlan {
    pub fn total_allowance(&self) -> Decimal {
        self.rows.iter().map(|r| r.allowance).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.termination == Termination::Exhausted
    }
}

enum FirstYear {
    FreeAllocation(Decimal),
    ProRata,
}

/// Build a year-by-year schedule for an asset of `category`.
pub fn build_plan(
    category: &AssetCategory,
    request: &PlanRequest,
    policy: &IncentivePolicy,
) -> CalcResult<DepreciationPlan> {
    validate::non_negative("grossValue", request.gross_value)?;
    validate::non_negative("residualValue", request.residual_value)?;
    if let Some(percent) = request.recoverable_tax_percent {
        validate::percent("recoverableTaxPercent", percent)?;
    }
    if category.max_rate_percent <= Decimal::ZERO || category.max_rate_percent > HUNDRED {
        return Err(CalcError::configuration(format!(
            "category '{}' has rate {} outside (0, 100]",
            category.id, category.max_rate_percent
        )));
    }

    let year = request.placed_in_service.year();
    let effective_base = (request.gross_value - request.residual_value).max(Decimal::ZERO);
    let mut rate = if request.is_used_asset {
        (category.max_rate_percent * Decimal::TWO).min(HUNDRED)
    } else {
        category.max_rate_percent
    };

    let mut warnings = Vec::new();
    let mut incentive_applied = None;
    let mut first_year = FirstYear::ProRata;

    if let Some(incentive) = request.incentive {
        if !category.allows_incentive {
            return Err(CalcError::validation(
                "incentive",
                format!("category '{}' does not allow incentives", category.id),
            ));
        }
        if let Incentive::FreeAllocation { percent } = incentive {
            validate::percent("incentive.percent", percent)?;
        }

        let kind = incentive.kind();
        if policy.is_eligible(kind, year) {
            incentive_applied = Some(kind);
            match incentive {
                Incentive::FreeAllocation { percent } => {
                    first_year = FirstYear::FreeAllocation(percent);
                }
                Incentive::Accelerated => rate = (rate * Decimal::TWO).min(HUNDRED),
            }
        } else {
            log::warn!("{} requested for {} but not eligible", kind.display(), year);
            warnings.push(PlanWarning::IncentiveNotEligible {
                incentive: kind,
                year,
            });
        }
    }

    let standard = validate::checked_mul("grossValue", effective_base, rate)? / HUNDRED;
    let mut rows: Vec<DepreciationState> = Vec::new();
    let mut remaining = effective_base;

    while remaining > Decimal::ZERO && rows.len() < GUARD_CAP {
        let (raw, note) = if rows.is_empty() {
            first_year_allowance(&first_year, effective_base, rate, request.placed_in_service)?
        } else {
            (standard, RowRule::Standard)
        };

        let mut allowance = raw.min(remaining);
        if remaining - allowance <= EPSILON {
            allowance = remaining;
        }

        let opening_base = remaining;
        remaining -= allowance;
        log::debug!(
            "{}: opening={}, allowance={}, closing={} ({})",
            year + rows.len() as i32,
            opening_base,
            allowance,
            remaining,
            note
        );
        rows.push(DepreciationState {
            year_label: (year + rows.len() as i32).to_string(),
            opening_base,
            allowance,
            closing_base: remaining,
            note,
        });
    }

    let termination = if remaining > Decimal::ZERO {
        log::warn!(
            "plan for '{}' stopped after {} rows with {} remaining",
            category.id,
            rows.len(),
            remaining
        );
        warnings.push(PlanWarning::Incomplete {
            rows: rows.len(),
            remaining,
        });
        Termination::GuardLimited
    } else {
        Termination::Exhausted
    };

    if rows.len() > category.max_period_years as usize {
        warnings.push(PlanWarning::ExceedsMaxPeriod {
            years: rows.len(),
            max_period_years: category.max_period_years,
        });
    }

    let estimated_useful_life_years = (HUNDRED / rate).ceil().to_u32().unwrap_or(u32::MAX);
    let recoverable_tax = request
        .recoverable_tax_percent
        .map(|percent| validate::checked_mul("grossValue", request.gross_value, percent))
        .transpose()?
        .map(|product| product / HUNDRED);

    Ok(DepreciationPlan {
        category_id: category.id.clone(),
        effective_base,
        rate_applied: rate,
        estimated_useful_life_years,
        max_period_years: category.max_period_years,
        incentive_applied,
        rows,
        recoverable_tax,
        termination,
        warnings,
    })
}

fn first_year_allowance(
    first_year: &FirstYear,
    effective_base: Decimal,
    rate: Decimal,
    placed_in_service: NaiveDate,
) -> CalcResult<(Decimal, RowRule)> {
    match first_year {
        FirstYear::FreeAllocation(percent) => {
            let allowance =
                validate::checked_mul("grossValue", effective_base, *percent)? / HUNDRED;
            Ok((
                allowance.min(effective_base),
                RowRule::FreeAllocation { percent: *percent },
            ))
        }
        FirstYear::ProRata => {
            let days_owned = calendar::days_remaining_in_year(placed_in_service);
            let days_in_year = calendar::days_in_year(placed_in_service.year());
            let annual = validate::checked_mul("grossValue", effective_base, rate)? / HUNDRED;
            let exact = validate::checked_mul("grossValue", annual, Decimal::from(days_owned))?
                / Decimal::from(days_in_year);
            // day fractions do not terminate, so this row is kept to cents
            let rounded = exact.round_dp(2);
            let allowance = if rounded.is_zero() { exact } else { rounded };
            Ok((
                allowance.min(effective_base),
                RowRule::ProRata {
                    days_owned,
                    days_in_year,
                },
            ))
        }
    }
}
