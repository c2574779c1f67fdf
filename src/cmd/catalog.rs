//! Catalog command - list depreciation categories

use crate::cmd::{format_percent, CatalogArgs};
use crate::core::{AssetCategory, CatalogTables};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct CatalogCommand {
    /// Only list this regime (e.g. general, simplified)
    #[arg(short, long)]
    regime: Option<String>,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    catalog: CatalogArgs,
}

/// Categories grouped by regime, optionally narrowed to one regime.
pub fn select<'a>(
    tables: &'a CatalogTables,
    regime: Option<&'a str>,
) -> anyhow::Result<BTreeMap<&'a str, &'a [AssetCategory]>> {
    let Some(name) = regime else {
        return Ok(tables.regimes().collect());
    };
    match tables.categories(name) {
        Some(categories) => Ok(BTreeMap::from([(name, categories)])),
        None => {
            let known: Vec<_> = tables.regimes().map(|(r, _)| r).collect();
            anyhow::bail!("Unknown regime '{}'. Known: {}", name, known.join(", "))
        }
    }
}

impl CatalogCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let registry = self.catalog.registry()?;
        let tables = registry.snapshot();
        let selected = select(&tables, self.regime.as_deref())?;

        if self.json {
            #[derive(Serialize)]
            struct Listing<'a> {
                regimes: BTreeMap<&'a str, &'a [AssetCategory]>,
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&Listing { regimes: selected })?
            );
            return Ok(());
        }

        for (regime, categories) in selected {
            print_regime(regime, categories);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Tabled)]
struct CategoryRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Family")]
    family: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Max Rate")]
    rate: String,
    #[tabled(rename = "Max Years")]
    years: u32,
    #[tabled(rename = "Incentive")]
    incentive: String,
}

fn print_regime(regime: &str, categories: &[AssetCategory]) {
    let rows: Vec<CategoryRow> = categories
        .iter()
        .map(|c| CategoryRow {
            id: c.id.clone(),
            family: c.family.clone(),
            name: c.name.clone(),
            rate: format_percent(c.max_rate_percent),
            years: c.max_period_years,
            incentive: if c.allows_incentive { "yes" } else { "-" }.to_string(),
        })
        .collect();

    println!();
    println!("{} ({} categories)", regime.to_uppercase(), categories.len());
    println!();
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_regime_by_default() {
        let tables = CatalogTables::builtin();
        let selected = select(&tables, None).unwrap();
        let names: Vec<_> = selected.keys().copied().collect();
        assert_eq!(names, ["general", "simplified"]);
        assert_eq!(selected["general"].len(), 12);
    }

    #[test]
    fn filters_to_one_regime() {
        let tables = CatalogTables::builtin();
        let selected = select(&tables, Some("simplified")).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected["simplified"].len(), 8);
    }

    #[test]
    fn unknown_regime_lists_known_ones() {
        let tables = CatalogTables::builtin();
        let err = select(&tables, Some("flat")).unwrap_err();
        assert!(err.to_string().contains("general, simplified"));
    }
}
