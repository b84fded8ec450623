mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::regimes::{QuickArgs, ScenarioArgs, SensitivityArgs};
use commands::tables::TablesArgs;

/// Brazilian corporate tax regime comparison
#[derive(Parser)]
#[command(
    name = "tributo",
    version,
    about = "Compare Simples Nacional, Lucro Presumido and Lucro Real",
    long_about = "A CLI for estimating a Brazilian company's annual tax burden under \
                  Simples Nacional, Lucro Presumido and Lucro Real with decimal \
                  precision, and picking the cheapest regime. Supports quick \
                  single-activity simulations and revenue sensitivity sweeps."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare all three regimes for a revenue/expense scenario
    Compare(ScenarioArgs),
    /// Single-activity simulation from revenue, total expense and purchases
    Quick(QuickArgs),
    /// Rerun the comparison with revenue and expenses scaled by each factor
    Sensitivity(SensitivityArgs),
    /// Simples Nacional only
    Simples(ScenarioArgs),
    /// Lucro Presumido only
    Presumido(ScenarioArgs),
    /// Lucro Real only
    Real(ScenarioArgs),
    /// Print (or validate) the rate tables in effect
    Tables(TablesArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Compare(args) => commands::regimes::run_compare(args),
        Commands::Quick(args) => commands::regimes::run_quick(args),
        Commands::Sensitivity(args) => commands::regimes::run_sensitivity(args),
        Commands::Simples(args) => commands::regimes::run_simples(args),
        Commands::Presumido(args) => commands::regimes::run_presumido(args),
        Commands::Real(args) => commands::regimes::run_real(args),
        Commands::Tables(args) => commands::tables::run_tables(args),
        Commands::Version => {
            println!("tributo {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
