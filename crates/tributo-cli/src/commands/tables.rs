use clap::Args;
use serde_json::{json, Value};

use tributo_core::regimes::{default_tables, TaxTables};

use crate::input;

/// Arguments for printing the rate tables
#[derive(Args)]
pub struct TablesArgs {
    /// Path to a JSON rate tables file to validate and print instead of the defaults
    #[arg(long)]
    pub tables: Option<String>,
}

pub fn run_tables(args: TablesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (tables, source) = match args.tables {
        Some(ref path) => (input::file::read_json::<TaxTables>(path)?, path.as_str()),
        None => (default_tables().clone(), "built-in"),
    };
    tables.validate()?;

    let mut warnings = Vec::new();
    if !tables.has_catch_all() {
        warnings.push(
            "Simples Nacional table has no unbounded bracket; revenue above the last bound \
             falls back to it"
                .to_string(),
        );
    }

    Ok(json!({
        "result": tables,
        "methodology": format!("Rate tables ({source})"),
        "warnings": warnings,
    }))
}
