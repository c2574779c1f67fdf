//! Scenario command - inspect the saved calculation log

use crate::cmd::{load_store, write_store};
use crate::core::ScenarioStore;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

#[derive(Args, Debug)]
pub struct ScenarioCommand {
    /// Scenario log file
    #[arg(long, default_value = "scenarios.json", global = true)]
    store: PathBuf,

    #[command(subcommand)]
    action: ScenarioAction,
}

#[derive(Subcommand, Debug)]
pub enum ScenarioAction {
    /// List saved scenarios, newest first
    List {
        /// Output as JSON instead of formatted table
        #[arg(long)]
        json: bool,
    },
    /// Print one scenario's inputs and summary
    Show { id: String },
    /// Delete one scenario
    Remove { id: String },
}

impl ScenarioCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let mut store = load_store(&self.store)?;
        match &self.action {
            ScenarioAction::List { json } => {
                if *json {
                    let scenarios: Vec<_> = store.list().collect();
                    println!("{}", serde_json::to_string_pretty(&scenarios)?);
                } else {
                    print_list(&store);
                }
            }
            ScenarioAction::Show { id } => {
                let scenario = store
                    .get(id)
                    .ok_or_else(|| anyhow::anyhow!("No scenario with id {}", id))?;
                println!("{}", serde_json::to_string_pretty(scenario)?);
            }
            ScenarioAction::Remove { id } => {
                let removed = store
                    .remove(id)
                    .ok_or_else(|| anyhow::anyhow!("No scenario with id {}", id))?;
                write_store(&self.store, &store)?;
                println!("Removed {} ({})", removed.id, removed.label);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Tabled)]
struct ScenarioRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Saved")]
    saved: String,
}

fn print_list(store: &ScenarioStore) {
    if store.is_empty() {
        println!("No saved scenarios");
        return;
    }
    let rows: Vec<ScenarioRow> = store
        .list()
        .map(|s| ScenarioRow {
            id: s.id.clone(),
            kind: s.kind.display().to_string(),
            label: s.label.clone(),
            saved: s.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    println!("{} of {} slots used", store.len(), store.capacity());
}
