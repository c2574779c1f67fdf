use clap::{Parser, Subcommand};

mod cmd;
mod core;

#[derive(Parser, Debug)]
#[command(name = "fincalc", version, about = "Tiered tax, FIFO gains and depreciation planning")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tax a base amount over progressive brackets
    Tax(cmd::tax::TaxCommand),
    /// Cost basis and gain of a disposal against FIFO lots
    Gains(cmd::gains::GainsCommand),
    /// Year-by-year depreciation schedule for an asset
    Plan(cmd::plan::PlanCommand),
    /// List depreciation categories
    Catalog(cmd::catalog::CatalogCommand),
    /// Inspect saved scenarios
    Scenario(cmd::scenario::ScenarioCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Tax(cmd) => cmd.exec(),
        Command::Gains(cmd) => cmd.exec(),
        Command::Plan(cmd) => cmd.exec(),
        Command::Catalog(cmd) => cmd.exec(),
        Command::Scenario(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
    }
}
