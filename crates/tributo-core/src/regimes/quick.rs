use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::categories::{ExpenseBreakdown, ExpenseCategory, RevenueBreakdown, RevenueCategory};
use super::comparison::{compare_breakdowns, comparison_warnings, RegimeComparison};
use super::tables::{default_tables, TaxTables};
use crate::error::TributoError;
use crate::types::*;
use crate::TributoResult;

/// Shares of the non-purchase expenses assigned to each category.
const ENERGY_RENT_FREIGHT_SHARE: Rate = dec!(0.3);
const DEPRECIATION_SHARE: Rate = dec!(0.1);
const OTHER_SHARE: Rate = dec!(0.6);

/// A single-activity business described by totals only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickSimulationInput {
    pub annual_revenue: Money,
    pub activity: RevenueCategory,
    pub total_expense: Money,
    /// Portion of `total_expense` spent on purchases.
    #[serde(default)]
    pub purchases: Money,
}

impl QuickSimulationInput {
    fn validate(&self) -> TributoResult<()> {
        for (field, value) in [
            ("annual_revenue", self.annual_revenue),
            ("total_expense", self.total_expense),
            ("purchases", self.purchases),
        ] {
            if value < Decimal::ZERO {
                return Err(TributoError::InvalidInput {
                    field: field.into(),
                    reason: format!("Must be non-negative, got {value}"),
                });
            }
        }
        if self.purchases > self.total_expense {
            return Err(TributoError::InvalidInput {
                field: "purchases".into(),
                reason: format!(
                    "Purchases ({}) cannot exceed total expense ({})",
                    self.purchases, self.total_expense
                ),
            });
        }
        Ok(())
    }

    /// Expand the totals into category breakdowns. Expenses other than
    /// purchases are split 30% energy/rent/freight, 10% depreciation and
    /// 60% other.
    pub fn breakdowns(&self) -> TributoResult<(RevenueBreakdown, ExpenseBreakdown)> {
        self.validate()?;

        let revenue = RevenueBreakdown::new().with(self.activity, self.annual_revenue)?;

        let remainder = self.total_expense - self.purchases;
        let expenses = ExpenseBreakdown::new()
            .with(ExpenseCategory::Purchases, self.purchases)?
            .with(
                ExpenseCategory::EnergyRentFreight,
                remainder * ENERGY_RENT_FREIGHT_SHARE,
            )?
            .with(ExpenseCategory::Depreciation, remainder * DEPRECIATION_SHARE)?
            .with(ExpenseCategory::Other, remainder * OTHER_SHARE)?;

        Ok((revenue, expenses))
    }
}

/// Quick comparison from totals using the built-in rate tables.
pub fn quick_simulation(
    input: &QuickSimulationInput,
) -> TributoResult<ComputationOutput<RegimeComparison>> {
    quick_simulation_with_tables(input, default_tables())
}

#[tracing::instrument(skip_all, fields(activity = %input.activity))]
pub fn quick_simulation_with_tables(
    input: &QuickSimulationInput,
    tables: &TaxTables,
) -> TributoResult<ComputationOutput<RegimeComparison>> {
    let start = Instant::now();
    tables.validate()?;

    let (revenue, expenses) = input.breakdowns()?;
    let result = compare_breakdowns(&revenue, &expenses, tables)?;
    let warnings = comparison_warnings(&result);

    let assumptions = serde_json::json!({
        "activity": input.activity,
        "annual_revenue": input.annual_revenue.to_string(),
        "total_expense": input.total_expense.to_string(),
        "purchases": input.purchases.to_string(),
        "expense_split": {
            "energy_rent_freight": ENERGY_RENT_FREIGHT_SHARE.to_string(),
            "depreciation": DEPRECIATION_SHARE.to_string(),
            "other": OTHER_SHARE.to_string(),
        },
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Quick regime comparison from revenue and expense totals with a fixed expense split",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regimes::comparison::Regime;

    fn sample() -> QuickSimulationInput {
        QuickSimulationInput {
            annual_revenue: dec!(1_000_000),
            activity: RevenueCategory::Commerce,
            total_expense: dec!(500_000),
            purchases: dec!(300_000),
        }
    }

    #[test]
    fn test_expense_split() {
        let (revenue, expenses) = sample().breakdowns().unwrap();
        assert_eq!(revenue.amount(RevenueCategory::Commerce), dec!(1_000_000));
        assert_eq!(expenses.amount(ExpenseCategory::Purchases), dec!(300_000));
        assert_eq!(expenses.amount(ExpenseCategory::EnergyRentFreight), dec!(60_000));
        assert_eq!(expenses.amount(ExpenseCategory::Depreciation), dec!(20_000));
        assert_eq!(expenses.amount(ExpenseCategory::Other), dec!(120_000));
        assert_eq!(expenses.total(), dec!(500_000));
        assert_eq!(expenses.credit_base(), dec!(360_000));
    }

    #[test]
    fn test_quick_simulation_totals() {
        let out = quick_simulation(&sample()).unwrap();
        let r = &out.result;
        assert_eq!(r.simples_nacional.total_tax, dec!(84_500));
        assert_eq!(r.lucro_presumido.total_tax, dec!(279_300));
        // PIS 16,500 − 5,940; COFINS 76,000 − 27,360; profit 500,000
        assert_eq!(r.lucro_real.breakdown.pis, dec!(10_560));
        assert_eq!(r.lucro_real.breakdown.cofins, dec!(48_640));
        assert_eq!(r.lucro_real.total_tax, dec!(425_200));
        assert_eq!(r.best.regime, Regime::SimplesNacional);
    }

    #[test]
    fn test_purchases_above_total_rejected() {
        let input = QuickSimulationInput {
            purchases: dec!(600_000),
            ..sample()
        };
        match quick_simulation(&input).unwrap_err() {
            TributoError::InvalidInput { field, .. } => assert_eq!(field, "purchases"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_deserialise_with_portuguese_activity() {
        let input: QuickSimulationInput = serde_json::from_str(
            r#"{"annual_revenue": 500000, "activity": "servicos_anexo_iii", "total_expense": 100000}"#,
        )
        .unwrap();
        assert_eq!(input.activity, RevenueCategory::ServicesAnnexIII);
        assert_eq!(input.purchases, dec!(0));
    }
}
