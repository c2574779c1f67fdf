use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::depreciation::IncentiveKind;

/// Non-fatal conditions returned alongside a depreciation plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum PlanWarning {
    /// The row limit was reached before the base was exhausted.
    /// The rows produced so far are still returned.
    Incomplete {
        rows: usize,
        #[schemars(with = "f64")]
        remaining: Decimal,
    },
    /// An incentive was requested for a year it does not cover, so the
    /// standard treatment was used.
    IncentiveNotEligible { incentive: IncentiveKind, year: i32 },
    /// The schedule runs longer than the category's maximum period.
    ExceedsMaxPeriod { years: usize, max_period_years: u32 },
}

impl PlanWarning {
    pub fn message(&self) -> String {
        match self {
            PlanWarning::Incomplete { rows, remaining } => format!(
                "schedule stopped after {rows} rows with {remaining:.2} still to allocate"
            ),
            PlanWarning::IncentiveNotEligible { incentive, year } => {
                format!("{} does not apply to assets placed in {year}", incentive.display())
            }
            PlanWarning::ExceedsMaxPeriod {
                years,
                max_period_years,
            } => format!(
                "schedule spans {years} years, more than the {max_period_years}-year maximum"
            ),
        }
    }
}

impl std::fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}
