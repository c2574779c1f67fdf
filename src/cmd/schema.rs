//! Schema command - print expected input formats

use crate::cmd::gains::{GainsRequest, LotRecord};
use crate::cmd::plan::PlanDocument;
use crate::cmd::tax::TaxRequest;
use crate::core::{CatalogTables, IncentivePolicy, ScenarioStore};
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Which input to describe
    #[arg(value_enum)]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for `tax` requests
    Tax,
    /// JSON Schema for `gains` requests
    Gains,
    /// JSON Schema for `plan` requests
    Plan,
    /// JSON Schema for `--catalog` import documents
    Catalog,
    /// JSON Schema for `--policy` documents
    Policy,
    /// JSON Schema for the scenario log file
    Scenarios,
    /// CSV header row for `gains --lots`
    LotsHeader,
    /// CSV column descriptions for `gains --lots`
    LotsFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let schema = match self.format {
            SchemaFormat::Tax => schema_for!(TaxRequest),
            SchemaFormat::Gains => schema_for!(GainsRequest),
            SchemaFormat::Plan => schema_for!(PlanDocument),
            SchemaFormat::Catalog => schema_for!(CatalogTables),
            SchemaFormat::Policy => schema_for!(IncentivePolicy),
            SchemaFormat::Scenarios => schema_for!(ScenarioStore),
            SchemaFormat::LotsHeader => return print_lots_header(),
            SchemaFormat::LotsFields => return print_lots_fields(),
        };
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}

fn print_lots_header() -> anyhow::Result<()> {
    let names: Vec<_> = LotRecord::csv_columns().iter().map(|c| c.name).collect();
    println!("{}", names.join(","));
    Ok(())
}

fn print_lots_fields() -> anyhow::Result<()> {
    println!("Lots CSV Format");
    println!("===============");
    println!();
    for column in LotRecord::csv_columns() {
        let req = if column.required { "required" } else { "optional" };
        if column.example.is_empty() {
            println!("{:12} ({:8})  {}", column.name, req, column.description);
        } else {
            println!(
                "{:12} ({:8})  {} (e.g. {})",
                column.name, req, column.description, column.example
            );
        }
    }
    println!();
    println!("Rows are consumed in file order: list the earliest lot first.");
    Ok(())
}
