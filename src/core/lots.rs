//! FIFO cost basis allocation over acquisition lots.

use super::error::{CalcError, CalcResult};
use super::validate::{self, EPSILON};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A holding acquired in one purchase, in the order it was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcquisitionLot {
    #[schemars(with = "f64")]
    pub quantity: Decimal,
    #[schemars(with = "f64")]
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisposalRequest {
    #[schemars(with = "f64")]
    pub quantity: Decimal,
    /// Zero is accepted and yields zero proceeds
    #[schemars(with = "f64")]
    pub unit_price: Decimal,
}

/// How much of one lot a disposal consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotConsumption {
    pub lot_index: usize,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub cost_basis: Decimal,
    pub consumed: Vec<LotConsumption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GainReport {
    pub quantity: Decimal,
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    pub gain: Decimal,
    pub consumed: Vec<LotConsumption>,
}

fn validate_lots(lots: &[AcquisitionLot]) -> CalcResult<Decimal> {
    lots.iter().enumerate().try_fold(Decimal::ZERO, |total, (i, lot)| {
        let field = format!("lots[{i}].quantity");
        validate::positive(&field, lot.quantity)?;
        validate::non_negative(&format!("lots[{i}].unitCost"), lot.unit_cost)?;
        validate::checked_add(&field, total, lot.quantity)
    })
}

/// Consume `lots` earliest first until `disposal_quantity` is covered.
///
/// Either the whole quantity is allocated or an `InsufficientQuantity` error
/// is returned; a partial allocation is never produced.
pub fn allocate_fifo(
    lots: &[AcquisitionLot],
    disposal_quantity: Decimal,
) -> CalcResult<Allocation> {
    validate::positive("disposal.quantity", disposal_quantity)?;
    let available = validate_lots(lots)?;
    if available < disposal_quantity - EPSILON {
        return Err(CalcError::InsufficientQuantity {
            available,
            required: disposal_quantity,
        });
    }

    let mut remaining = disposal_quantity;
    let mut cost_basis = Decimal::ZERO;
    let mut consumed = Vec::new();

    for (lot_index, lot) in lots.iter().enumerate() {
        if remaining <= EPSILON {
            break;
        }
        let quantity = remaining.min(lot.quantity);
        let field = format!("lots[{lot_index}].unitCost");
        let cost = validate::checked_mul(&field, quantity, lot.unit_cost)?;
        cost_basis = validate::checked_add(&field, cost_basis, cost)?;
        remaining -= quantity;
        log::debug!(
            "lot #{}: consumed {} of {} at {}, cost={}, remaining={}",
            lot_index,
            quantity,
            lot.quantity,
            lot.unit_cost,
            cost,
            remaining
        );
        consumed.push(LotConsumption {
            lot_index,
            quantity,
            unit_cost: lot.unit_cost,
            cost,
        });
    }

    Ok(Allocation {
        cost_basis,
        consumed,
    })
}

/// Proceeds, FIFO cost basis and gain (negative for a loss) of a disposal.
pub fn realise_gain(lots: &[AcquisitionLot], disposal: &DisposalRequest) -> CalcResult<GainReport> {
    validate::non_negative("disposal.unitPrice", disposal.unit_price)?;
    let allocation = allocate_fifo(lots, disposal.quantity)?;
    let proceeds =
        validate::checked_mul("disposal.unitPrice", disposal.quantity, disposal.unit_price)?;
    Ok(GainReport {
        quantity: disposal.quantity,
        proceeds,
        cost_basis: allocation.cost_basis,
        gain: proceeds - allocation.cost_basis,
        consumed: allocation.consumed,
    })
}
