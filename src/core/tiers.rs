//! Progressive tiered-rate evaluation (income tax brackets).

use super::error::{CalcError, CalcResult};
use super::validate::{self, HUNDRED};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One marginal segment: everything up to `upper_bound` is taxed at `rate` percent.
/// An absent `upper_bound` means the tier is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BracketTier {
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub upper_bound: Option<Decimal>,
    #[schemars(with = "f64")]
    pub rate: Decimal,
}

impl BracketTier {
    pub fn bounded(upper_bound: Decimal, rate: Decimal) -> Self {
        BracketTier {
            upper_bound: Some(upper_bound),
            rate,
        }
    }

    pub fn unbounded(rate: Decimal) -> Self {
        BracketTier {
            upper_bound: None,
            rate,
        }
    }
}

/// Built-in bracket tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TierPreset {
    /// Savings income: 19% to 6,000, 21% to 50,000, 23% to 200,000, 27% to 300,000, 28% above
    Savings,
    /// General income: 19% to 12,450 rising to 47% above 300,000
    General,
}

impl TierPreset {
    pub fn table(self) -> TierTable {
        match self {
            TierPreset::Savings => TierTable::savings_income(),
            TierPreset::General => TierTable::general_income(),
        }
    }
}

/// An ordered, validated set of tiers with cumulative upper bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BracketTier>", into = "Vec<BracketTier>")]
pub struct TierTable {
    tiers: Vec<BracketTier>,
}

impl TierTable {
    /// Validate a caller-supplied table. Tables are never repaired: an empty
    /// table, non-ascending bounds or a bounded final tier are rejected.
    pub fn new(tiers: Vec<BracketTier>) -> CalcResult<Self> {
        let Some(last) = tiers.last() else {
            return Err(CalcError::configuration("tier table is empty"));
        };
        if last.upper_bound.is_some() {
            return Err(CalcError::configuration("final tier must be unbounded"));
        }

        let mut previous = Decimal::ZERO;
        for (i, tier) in tiers.iter().enumerate() {
            if tier.rate < Decimal::ZERO || tier.rate > HUNDRED {
                return Err(CalcError::configuration(format!(
                    "tier {i}: rate {} outside 0-100",
                    tier.rate
                )));
            }
            let is_last = i + 1 == tiers.len();
            match tier.upper_bound {
                None if !is_last => {
                    return Err(CalcError::configuration(format!(
                        "tier {i}: only the final tier may be unbounded"
                    )));
                }
                Some(upper) if upper <= previous => {
                    return Err(CalcError::configuration(format!(
                        "tier {i}: upper bound {upper} must be greater than {previous}"
                    )));
                }
                Some(upper) => previous = upper,
                None => {}
            }
        }

        Ok(TierTable { tiers })
    }

    pub fn savings_income() -> Self {
        TierTable {
            tiers: vec![
                BracketTier::bounded(dec!(6000), dec!(19)),
                BracketTier::bounded(dec!(50000), dec!(21)),
                BracketTier::bounded(dec!(200000), dec!(23)),
                BracketTier::bounded(dec!(300000), dec!(27)),
                BracketTier::unbounded(dec!(28)),
            ],
        }
    }

    pub fn general_income() -> Self {
        TierTable {
            tiers: vec![
                BracketTier::bounded(dec!(12450), dec!(19)),
                BracketTier::bounded(dec!(20200), dec!(24)),
                BracketTier::bounded(dec!(35200), dec!(30)),
                BracketTier::bounded(dec!(60000), dec!(37)),
                BracketTier::bounded(dec!(300000), dec!(45)),
                BracketTier::unbounded(dec!(47)),
            ],
        }
    }

    pub fn tiers(&self) -> &[BracketTier] {
        &self.tiers
    }

    pub fn max_rate(&self) -> Decimal {
        self.tiers
            .iter()
            .map(|t| t.rate)
            .max()
            .unwrap_or(Decimal::ZERO)
    }
}

impl TryFrom<Vec<BracketTier>> for TierTable {
    type Error = CalcError;

    fn try_from(tiers: Vec<BracketTier>) -> CalcResult<Self> {
        TierTable::new(tiers)
    }
}

impl JsonSchema for TierTable {
    fn schema_name() -> String {
        "TierTable".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        <Vec<BracketTier>>::json_schema(gen)
    }
}

impl From<TierTable> for Vec<BracketTier> {
    fn from(table: TierTable) -> Self {
        table.tiers
    }
}

/// The part of the base that fell into one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierSlice {
    pub lower: Decimal,
    pub upper: Option<Decimal>,
    pub taxable: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
}

fn slices(base: Decimal, table: &TierTable) -> CalcResult<Vec<TierSlice>> {
    let mut slices = Vec::new();
    let mut lower = Decimal::ZERO;
    for tier in &table.tiers {
        if base <= lower {
            break;
        }
        let top = tier.upper_bound.map_or(base, |upper| upper.min(base));
        let taxable = (top - lower).max(Decimal::ZERO);
        slices.push(TierSlice {
            lower,
            upper: tier.upper_bound,
            taxable,
            rate: tier.rate,
            amount: validate::checked_mul("base", taxable, tier.rate)? / HUNDRED,
        });
        lower = tier.upper_bound.unwrap_or(Decimal::MAX);
    }
    Ok(slices)
}

/// Accumulated amount due on `base` across all tiers.
pub fn compute_tiered(base: Decimal, table: &TierTable) -> CalcResult<Decimal> {
    validate::non_negative("base", base)?;
    slices(base, table)?
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, slice| {
            log::debug!(
                "tier {}..{:?} @ {}%: taxable={}, amount={}",
                slice.lower,
                slice.upper,
                slice.rate,
                slice.taxable,
                slice.amount
            );
            validate::checked_add("base", acc, slice.amount)
        })
}

/// Per-tier breakdown whose amounts sum to [`compute_tiered`].
pub fn breakdown(base: Decimal, table: &TierTable) -> CalcResult<Vec<TierSlice>> {
    validate::non_negative("base", base)?;
    slices(base, table)
}

/// Total as a percentage of the base, 0 for a zero base.
pub fn effective_rate(base: Decimal, table: &TierTable) -> CalcResult<Decimal> {
    let total = compute_tiered(base, table)?;
    if base.is_zero() {
        return Ok(Decimal::ZERO);
    }
    Ok((total / base * HUNDRED).round_dp(4))
}
