use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use tributo_core::regimes::categories::{CategoryKey, ExpenseCategory, RevenueCategory};
use tributo_core::regimes::presumido::calculate_lucro_presumido;
use tributo_core::regimes::quick::{quick_simulation_with_tables, QuickSimulationInput};
use tributo_core::regimes::real::calculate_lucro_real;
use tributo_core::regimes::sensitivity::{
    revenue_sensitivity_with_tables, RevenueSensitivityInput, DEFAULT_FACTORS,
};
use tributo_core::regimes::simples::calculate_simples_nacional;
use tributo_core::regimes::{default_tables, RegimeInput, TaxTables};
use tributo_core::compare_regimes_with_tables;

use crate::input;

/// Per-category amounts, used when no JSON input is given
#[derive(Args, Default)]
pub struct CategoryFlags {
    /// Commerce (resale) revenue
    #[arg(long)]
    pub commerce: Option<Decimal>,

    /// Industrial revenue
    #[arg(long)]
    pub industry: Option<Decimal>,

    /// Generic services revenue
    #[arg(long)]
    pub services: Option<Decimal>,

    /// Services revenue under Simples Nacional annex III
    #[arg(long)]
    pub services_annex_iii: Option<Decimal>,

    /// Services revenue under Simples Nacional annex IV
    #[arg(long)]
    pub services_annex_iv: Option<Decimal>,

    /// Services revenue under Simples Nacional annex V
    #[arg(long)]
    pub services_annex_v: Option<Decimal>,

    /// Freight and passenger transport revenue
    #[arg(long)]
    pub transport: Option<Decimal>,

    /// Regulated professional services revenue
    #[arg(long)]
    pub professional_services: Option<Decimal>,

    /// Purchases of goods for resale or inputs (creditable)
    #[arg(long)]
    pub purchases: Option<Decimal>,

    /// Energy, rent and freight (creditable)
    #[arg(long)]
    pub energy_rent_freight: Option<Decimal>,

    /// Depreciation
    #[arg(long)]
    pub depreciation: Option<Decimal>,

    /// Salaries and payroll charges
    #[arg(long)]
    pub salaries: Option<Decimal>,

    /// Any other operating expense
    #[arg(long)]
    pub other_expenses: Option<Decimal>,
}

impl CategoryFlags {
    fn is_empty(&self) -> bool {
        self.revenue_pairs().iter().all(|(_, v)| v.is_none())
            && self.expense_pairs().iter().all(|(_, v)| v.is_none())
    }

    fn revenue_pairs(&self) -> [(RevenueCategory, Option<Decimal>); 8] {
        [
            (RevenueCategory::Commerce, self.commerce),
            (RevenueCategory::Industry, self.industry),
            (RevenueCategory::Services, self.services),
            (RevenueCategory::ServicesAnnexIII, self.services_annex_iii),
            (RevenueCategory::ServicesAnnexIV, self.services_annex_iv),
            (RevenueCategory::ServicesAnnexV, self.services_annex_v),
            (RevenueCategory::Transport, self.transport),
            (RevenueCategory::ProfessionalServices, self.professional_services),
        ]
    }

    fn expense_pairs(&self) -> [(ExpenseCategory, Option<Decimal>); 5] {
        [
            (ExpenseCategory::Purchases, self.purchases),
            (ExpenseCategory::EnergyRentFreight, self.energy_rent_freight),
            (ExpenseCategory::Depreciation, self.depreciation),
            (ExpenseCategory::Salaries, self.salaries),
            (ExpenseCategory::Other, self.other_expenses),
        ]
    }

    fn to_input(&self) -> RegimeInput {
        let mut input = RegimeInput::default();
        for (category, amount) in self.revenue_pairs() {
            if let Some(amount) = amount {
                input.revenue.insert(category.key().to_string(), amount);
            }
        }
        for (category, amount) in self.expense_pairs() {
            if let Some(amount) = amount {
                input.expenses.insert(category.key().to_string(), amount);
            }
        }
        input
    }
}

/// Arguments for a revenue/expense scenario
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScenarioArgs {
    /// Path to JSON input file with `revenue` and `expenses` maps (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a JSON rate tables file replacing the built-in defaults
    #[arg(long)]
    pub tables: Option<String>,

    #[command(flatten)]
    pub amounts: CategoryFlags,
}

/// Arguments for the single-activity quick simulation
#[derive(Args)]
pub struct QuickArgs {
    /// Path to JSON input file with quick simulation parameters
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a JSON rate tables file replacing the built-in defaults
    #[arg(long)]
    pub tables: Option<String>,

    /// Annual gross revenue
    #[arg(long)]
    pub revenue: Option<Decimal>,

    /// Activity key (e.g. commerce, industry, services_annex_iii, comercio)
    #[arg(long)]
    pub activity: Option<String>,

    /// Total annual expense
    #[arg(long)]
    pub total_expense: Option<Decimal>,

    /// Portion of the total expense spent on purchases
    #[arg(long, default_value = "0")]
    pub purchases: Decimal,
}

/// Arguments for revenue sensitivity
#[derive(Args)]
pub struct SensitivityArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Comma-separated revenue multipliers (e.g. "0.5,1,2")
    #[arg(long, value_delimiter = ',')]
    pub factors: Option<Vec<Decimal>>,
}

/// Load the rate tables from `--tables`, or fall back to the defaults.
fn load_tables(path: Option<&str>) -> Result<TaxTables, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let tables: TaxTables = input::file::read_json(path)?;
            tables.validate()?;
            Ok(tables)
        }
        None => Ok(default_tables().clone()),
    }
}

fn read_scenario(args: &ScenarioArgs) -> Result<RegimeInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        input::file::read_json(path)
    } else if let Some(scenario) = input::stdin::read_stdin(input::stdin::SCENARIO_SHAPE)? {
        Ok(scenario)
    } else if args.amounts.is_empty() {
        Err("at least one revenue or expense flag is required (or provide --input)".into())
    } else {
        Ok(args.amounts.to_input())
    }
}

pub fn run_compare(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario = read_scenario(&args)?;
    let tables = load_tables(args.tables.as_deref())?;
    let result = compare_regimes_with_tables(&scenario, &tables)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_simples(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario = read_scenario(&args)?;
    let tables = load_tables(args.tables.as_deref())?;
    let result = calculate_simples_nacional(&scenario, &tables)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_presumido(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario = read_scenario(&args)?;
    let tables = load_tables(args.tables.as_deref())?;
    let result = calculate_lucro_presumido(&scenario, &tables)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_real(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario = read_scenario(&args)?;
    let tables = load_tables(args.tables.as_deref())?;
    let result = calculate_lucro_real(&scenario, &tables)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_quick(args: QuickArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let quick_input: QuickSimulationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(piped) = input::stdin::read_stdin(input::stdin::QUICK_SHAPE)? {
        piped
    } else {
        let activity = args
            .activity
            .as_deref()
            .ok_or("--activity is required (or provide --input)")?;
        QuickSimulationInput {
            annual_revenue: args
                .revenue
                .ok_or("--revenue is required (or provide --input)")?,
            activity: RevenueCategory::from_key(activity)
                .ok_or_else(|| format!("unknown activity '{activity}'"))?,
            total_expense: args
                .total_expense
                .ok_or("--total-expense is required (or provide --input)")?,
            purchases: args.purchases,
        }
    };

    let tables = load_tables(args.tables.as_deref())?;
    let result = quick_simulation_with_tables(&quick_input, &tables)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut sens_input: RevenueSensitivityInput = if let Some(ref path) = args.scenario.input {
        input::file::read_json(path)?
    } else if let Some(piped) = input::stdin::read_stdin(input::stdin::SENSITIVITY_SHAPE)? {
        piped
    } else if args.scenario.amounts.is_empty() {
        return Err("at least one revenue or expense flag is required (or provide --input)".into());
    } else {
        RevenueSensitivityInput {
            base: args.scenario.amounts.to_input(),
            factors: DEFAULT_FACTORS.to_vec(),
        }
    };

    // Flag wins over factors in the JSON input
    if let Some(factors) = args.factors {
        sens_input.factors = factors;
    }

    let tables = load_tables(args.scenario.tables.as_deref())?;
    let result = revenue_sensitivity_with_tables(&sens_input, &tables)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_to_canonical_keys() {
        let flags = CategoryFlags {
            commerce: Some(Decimal::from(1_000_000)),
            services_annex_iii: Some(Decimal::from(200_000)),
            purchases: Some(Decimal::from(300_000)),
            other_expenses: Some(Decimal::from(50_000)),
            ..CategoryFlags::default()
        };
        let input = flags.to_input();
        assert_eq!(input.revenue.len(), 2);
        assert_eq!(input.revenue["services_annex_iii"], Decimal::from(200_000));
        assert_eq!(input.expenses["other"], Decimal::from(50_000));
        assert!(!flags.is_empty());
    }

    #[test]
    fn test_no_flags_is_empty() {
        assert!(CategoryFlags::default().is_empty());
    }

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("tributo-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    const TWO_BRACKETS: &str = r#"{
        "simples": [
            {"upper_bound": "180000", "rate": "0.04", "deduction": "0"},
            {"upper_bound": "360000", "rate": "0.073", "deduction": "5940"}
        ]
    }"#;

    #[test]
    fn test_load_tables_fills_missing_sections() {
        let path = write_temp("partial-tables.json", TWO_BRACKETS);
        let tables = load_tables(path.to_str()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(tables.simples.len(), 2);
        assert!(!tables.has_catch_all());
        assert_eq!(tables.real, default_tables().real);
        assert_eq!(load_tables(None).unwrap(), *default_tables());
    }

    #[test]
    fn test_load_tables_rejects_unordered_bounds() {
        let path = write_temp(
            "unordered-tables.json",
            r#"{"simples": [
                {"upper_bound": "360000", "rate": "0.073", "deduction": "0"},
                {"upper_bound": "180000", "rate": "0.04", "deduction": "0"}
            ]}"#,
        );
        let err = load_tables(path.to_str()).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(err.to_string().contains("upper_bound"));
    }

    #[test]
    fn test_compare_with_edited_tables_flags_fallback() {
        let tables = write_temp("fallback-tables.json", TWO_BRACKETS);
        let scenario = write_temp(
            "fallback-scenario.json",
            r#"{"revenue": {"commerce": "500000"}}"#,
        );
        let value = run_compare(ScenarioArgs {
            input: scenario.to_str().map(String::from),
            tables: tables.to_str().map(String::from),
            amounts: CategoryFlags::default(),
        })
        .unwrap();
        std::fs::remove_file(&tables).unwrap();
        std::fs::remove_file(&scenario).unwrap();

        let result = &value["result"];
        assert_eq!(result["simples_nacional"]["bracket"]["fallback_used"], true);
        // 500,000 × 7.3% − 5,940 under the last configured bracket
        let tax: Decimal = result["simples_nacional"]["total_tax"].as_str().unwrap().parse().unwrap();
        assert_eq!(tax, Decimal::from(30_560));
        let warnings = value["warnings"].as_array().unwrap();
        assert!(warnings
            .iter()
            .any(|w| w.as_str().unwrap().contains("Configuration integrity")));
    }
}
