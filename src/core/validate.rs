//! Field-level range checks shared by the calculators.

use super::error::{CalcError, CalcResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Tolerance used when comparing quantities that should be exhausted.
pub const EPSILON: Decimal = dec!(0.000000001);

pub const HUNDRED: Decimal = dec!(100);

pub fn non_negative(field: &str, value: Decimal) -> CalcResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(CalcError::validation(
            field,
            format!("must not be negative, got {value}"),
        ));
    }
    Ok(value)
}

pub fn positive(field: &str, value: Decimal) -> CalcResult<Decimal> {
    if value <= Decimal::ZERO {
        return Err(CalcError::validation(
            field,
            format!("must be greater than zero, got {value}"),
        ));
    }
    Ok(value)
}

/// Percentages are on a 0-100 scale.
pub fn percent(field: &str, value: Decimal) -> CalcResult<Decimal> {
    if value < Decimal::ZERO || value > HUNDRED {
        return Err(CalcError::validation(
            field,
            format!("must be between 0 and 100, got {value}"),
        ));
    }
    Ok(value)
}

pub fn non_empty<'a>(field: &str, value: &'a str) -> CalcResult<&'a str> {
    if value.trim().is_empty() {
        return Err(CalcError::validation(field, "must not be empty"));
    }
    Ok(value)
}

/// `a * b`, or a validation error on `field` when the product does not fit.
pub fn checked_mul(field: &str, a: Decimal, b: Decimal) -> CalcResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| too_large(field))
}

pub fn checked_add(field: &str, a: Decimal, b: Decimal) -> CalcResult<Decimal> {
    a.checked_add(b).ok_or_else(|| too_large(field))
}

fn too_large(field: &str) -> CalcError {
    CalcError::validation(field, "amount is too large to calculate with")
}
