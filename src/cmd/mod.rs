pub mod catalog;
pub mod gains;
pub mod plan;
pub mod scenario;
pub mod schema;
pub mod tax;

use crate::core::{CatalogRegistry, CatalogTables, IncentivePolicy, NewScenario, ScenarioStore};
use anyhow::Context;
use clap::Args;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

/// Column description generated by `#[derive(CsvSchema)]`.
#[derive(Debug, Clone, Copy)]
pub struct CsvColumn {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
    pub example: &'static str,
}

/// Read a JSON request document from a file (or stdin with "-")
pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    if path.as_os_str() == "-" {
        let mut buffer = Vec::new();
        io::stdin().lock().read_to_end(&mut buffer)?;
        if buffer.is_empty() {
            anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
        }
        return Ok(serde_json::from_slice(&buffer)?);
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

/// Catalog and incentive policy overrides shared by commands that plan.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Catalog import document replacing the built-in category tables
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Incentive policy document listing eligible placement years
    #[arg(long)]
    policy: Option<PathBuf>,
}

impl CatalogArgs {
    pub fn registry(&self) -> anyhow::Result<CatalogRegistry> {
        let registry = CatalogRegistry::with_defaults();
        if let Some(path) = &self.catalog {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            let tables = CatalogTables::from_json(BufReader::new(file))
                .with_context(|| format!("importing catalog {}", path.display()))?;
            registry.replace_all(tables)?;
        }
        Ok(registry)
    }

    pub fn policy(&self) -> anyhow::Result<IncentivePolicy> {
        let policy = match &self.policy {
            Some(path) => read_json::<IncentivePolicy>(path)?,
            None => IncentivePolicy::default(),
        };
        policy.validate()?;
        Ok(policy)
    }
}

/// Options for keeping a calculation in the scenario log.
#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Save this calculation to the scenario log under the given label
    #[arg(long)]
    save_as: Option<String>,

    /// Scenario log file
    #[arg(long, default_value = "scenarios.json")]
    store: PathBuf,
}

impl SaveArgs {
    pub fn save(
        &self,
        kind: crate::core::ScenarioKind,
        inputs: serde_json::Value,
        computed_summary: serde_json::Value,
    ) -> anyhow::Result<()> {
        let Some(label) = &self.save_as else {
            return Ok(());
        };
        let mut store = load_store(&self.store)?;
        let id = store.save(
            NewScenario {
                label: label.clone(),
                kind,
                inputs,
                computed_summary,
            },
            chrono::Utc::now(),
        );
        write_store(&self.store, &store)?;
        log::info!("saved scenario {} as {}", label, id);
        eprintln!("Saved scenario {id}");
        Ok(())
    }
}

pub fn load_store(path: &Path) -> anyhow::Result<ScenarioStore> {
    if !path.exists() {
        return Ok(ScenarioStore::default());
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    ScenarioStore::read_json(BufReader::new(file))
        .with_context(|| format!("reading scenario log {}", path.display()))
}

pub fn write_store(path: &Path, store: &ScenarioStore) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("writing {}", path.display()))?;
    store.write_json(BufWriter::new(file))
}

pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

pub fn format_percent(rate: Decimal) -> String {
    format!("{}%", rate.normalize())
}

pub fn format_quantity(qty: Decimal) -> String {
    // Use reasonable precision, removing trailing zeros
    let s = format!("{:.8}", qty);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}
