//! Gains command - FIFO cost basis and tax on a disposal

use crate::cmd::{format_amount, format_quantity, read_json, SaveArgs};
use crate::core::{
    compute_tiered, realise_gain, AcquisitionLot, CalcError, DisposalRequest, GainReport,
    ScenarioKind, TierPreset,
};
use anyhow::Context;
use clap::Args;
use fincalc_derive::CsvSchema;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct GainsCommand {
    /// Gains request document (JSON). Reads from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    /// CSV file of acquisition lots, replacing any lots in the request
    #[arg(short, long)]
    lots: Option<PathBuf>,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    save: SaveArgs,
}

/// Input document for `fincalc gains`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GainsRequest {
    /// Acquisition lots, earliest first
    #[serde(default)]
    pub lots: Vec<AcquisitionLot>,
    pub disposal: DisposalRequest,
    /// Bracket table applied to a positive gain (defaults to savings)
    #[serde(default)]
    pub tax_table: Option<TierPreset>,
}

/// CSV row describing one acquisition lot
#[derive(Debug, Clone, Deserialize, CsvSchema)]
pub struct LotRecord {
    /// Acquisition date (YYYY-MM-DD), informational only
    #[serde(rename = "date")]
    #[csv(example = "2024-01-15")]
    pub acquired: Option<String>,
    /// Quantity acquired, greater than zero
    #[csv(example = "0.5")]
    pub quantity: Decimal,
    /// Cost per unit, zero or more
    #[csv(example = "30000")]
    pub unit_cost: Decimal,
    /// Free text note
    pub description: Option<String>,
}

/// Read lots from CSV in file order
pub fn read_lots_csv<R: Read>(reader: R) -> anyhow::Result<Vec<AcquisitionLot>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut lots = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        let record: LotRecord = result.with_context(|| format!("lot row {}", i + 1))?;
        log::debug!(
            "lot row {}: {} @ {} {} {}",
            i + 1,
            record.quantity,
            record.unit_cost,
            record.acquired.as_deref().unwrap_or(""),
            record.description.as_deref().unwrap_or("")
        );
        lots.push(AcquisitionLot {
            quantity: record.quantity,
            unit_cost: record.unit_cost,
        });
    }
    Ok(lots)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GainsSummary {
    #[serde(flatten)]
    pub report: GainReport,
    pub tax: Decimal,
}

pub fn evaluate(request: &GainsRequest) -> Result<GainsSummary, CalcError> {
    let report = realise_gain(&request.lots, &request.disposal)?;
    let table = request.tax_table.unwrap_or(TierPreset::Savings).table();
    let tax = compute_tiered(report.gain.max(Decimal::ZERO), &table)?;
    Ok(GainsSummary { report, tax })
}

impl GainsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let mut request: GainsRequest = read_json(&self.file)?;
        if let Some(path) = &self.lots {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            request.lots = read_lots_csv(BufReader::new(file))?;
        }

        let summary = evaluate(&request)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }

        self.save.save(
            ScenarioKind::Gains,
            serde_json::to_value(&request)?,
            serde_json::json!({
                "proceeds": summary.report.proceeds,
                "costBasis": summary.report.cost_basis,
                "gain": summary.report.gain,
                "tax": summary.tax,
            }),
        )
    }
}

#[derive(Debug, Clone, Tabled)]
struct LotRow {
    #[tabled(rename = "Lot")]
    lot: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Unit Cost")]
    unit_cost: String,
    #[tabled(rename = "Cost")]
    cost: String,
}

fn print_summary(summary: &GainsSummary) {
    let report = &summary.report;
    let rows: Vec<LotRow> = report
        .consumed
        .iter()
        .map(|c| LotRow {
            lot: format!("#{}", c.lot_index + 1),
            quantity: format_quantity(c.quantity),
            unit_cost: format_amount(c.unit_cost),
            cost: format_amount(c.cost),
        })
        .collect();

    println!();
    println!("FIFO COST BASIS");
    println!();
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
    println!();
    println!("  Disposed:    {}", format_quantity(report.quantity));
    println!("  Proceeds:    {}", format_amount(report.proceeds));
    println!("  Cost basis:  {}", format_amount(report.cost_basis));
    println!("  Gain/Loss:   {}", format_amount(report.gain));
    println!("  Tax:         {}", format_amount(summary.tax));
}
