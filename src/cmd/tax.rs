//! Tax command - progressive bracket calculation

use crate::cmd::{format_amount, format_percent, read_json, SaveArgs};
use crate::core::{
    breakdown, compute_tiered, effective_rate, CalcError, ScenarioKind, TierPreset, TierTable,
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
pub struct TaxCommand {
    /// Tax request document (JSON). Reads from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    save: SaveArgs,
}

/// Input document for `fincalc tax`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaxRequest {
    /// Taxable base
    #[schemars(with = "f64")]
    pub base: Decimal,
    /// Built-in bracket table (defaults to savings)
    #[serde(default)]
    pub table: Option<TierPreset>,
    /// Custom brackets with cumulative upper bounds; the last has no bound
    #[serde(default)]
    pub tiers: Option<TierTable>,
}

impl TaxRequest {
    pub fn table(&self) -> Result<TierTable, CalcError> {
        match (&self.tiers, self.table) {
            (Some(_), Some(_)) => Err(CalcError::validation(
                "tiers",
                "give either a built-in table or custom tiers, not both",
            )),
            (Some(tiers), None) => Ok(tiers.clone()),
            (None, preset) => Ok(preset.unwrap_or(TierPreset::Savings).table()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSummary {
    pub base: Decimal,
    pub total: Decimal,
    pub effective_rate: Decimal,
    pub tiers: Vec<crate::core::tiers::TierSlice>,
}

pub fn evaluate(request: &TaxRequest) -> Result<TaxSummary, CalcError> {
    let table = request.table()?;
    Ok(TaxSummary {
        base: request.base,
        total: compute_tiered(request.base, &table)?,
        effective_rate: effective_rate(request.base, &table)?,
        tiers: breakdown(request.base, &table)?,
    })
}

impl TaxCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let request: TaxRequest = read_json(&self.file)?;
        let summary = evaluate(&request)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }

        self.save.save(
            ScenarioKind::Tax,
            serde_json::to_value(&request)?,
            serde_json::json!({
                "total": summary.total,
                "effectiveRate": summary.effective_rate,
            }),
        )
    }
}

#[derive(Debug, Clone, Tabled)]
struct TierRow {
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Taxable")]
    taxable: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

fn print_summary(summary: &TaxSummary) {
    let rows: Vec<TierRow> = summary
        .tiers
        .iter()
        .map(|slice| TierRow {
            from: format_amount(slice.lower),
            to: slice.upper.map_or("-".to_string(), format_amount),
            rate: format_percent(slice.rate),
            taxable: format_amount(slice.taxable),
            amount: format_amount(slice.amount),
        })
        .collect();

    println!();
    println!("TIERED TAX");
    println!();
    if rows.is_empty() {
        println!("  (nothing to tax)");
    } else {
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
    }
    println!();
    println!("  Base:            {}", format_amount(summary.base));
    println!("  Total:           {}", format_amount(summary.total));
    println!("  Effective rate:  {}", format_percent(summary.effective_rate));
}
