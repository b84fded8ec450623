use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::breakdown::{activity_taxes, income_tax_surtax, TaxBreakdown};
use super::categories::{ExpenseBreakdown, RevenueBreakdown};
use super::input::RegimeInput;
use super::tables::{RegimeRates, TaxTables};
use crate::types::*;
use crate::TributoResult;

/// Lucro Real assessment: credit base, accounting profit and itemised tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LucroRealResult {
    pub total_revenue: Money,
    pub total_expense: Money,
    /// Expenses generating PIS/COFINS input credit.
    pub credit_base: Money,
    /// Revenue minus expenses. May be negative.
    pub accounting_profit: Money,
    pub breakdown: TaxBreakdown,
}

/// Lucro Real over actual profit with non-cumulative PIS/COFINS.
///
/// Credits on purchases and energy/rent/freight offset PIS and COFINS, each
/// floored at zero. IRPJ, its surtax and CSLL apply only to a positive
/// profit; losses are not carried forward.
pub fn lucro_real(
    revenue: &RevenueBreakdown,
    expenses: &ExpenseBreakdown,
    rates: &RegimeRates,
) -> LucroRealResult {
    let total_revenue = revenue.total();
    let total_expense = expenses.total();
    let credit_base = expenses.credit_base();

    let pis = (total_revenue * rates.pis - credit_base * rates.pis).max(Decimal::ZERO);
    let cofins = (total_revenue * rates.cofins - credit_base * rates.cofins).max(Decimal::ZERO);

    let accounting_profit = total_revenue - total_expense;
    let (income_tax, surtax, social_contribution) = if accounting_profit > Decimal::ZERO {
        (
            accounting_profit * rates.income_tax,
            income_tax_surtax(accounting_profit, rates),
            accounting_profit * rates.social_contribution,
        )
    } else {
        (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    };

    let activity = activity_taxes(revenue, rates);

    let breakdown = TaxBreakdown {
        pis,
        cofins,
        income_tax,
        income_tax_surtax: surtax,
        social_contribution,
        excise: activity.excise,
        state_goods: activity.state_goods,
        municipal_services: activity.municipal_services,
        // No payroll base is modelled.
        workplace_accident: Decimal::ZERO,
        total: Decimal::ZERO,
    }
    .totalled();

    tracing::debug!(%total_revenue, %accounting_profit, %credit_base, total = %breakdown.total, "lucro real assessed");

    LucroRealResult {
        total_revenue,
        total_expense,
        credit_base,
        accounting_profit,
        breakdown,
    }
}

/// Lucro Real from a string-keyed input.
pub fn calculate_lucro_real(
    input: &RegimeInput,
    tables: &TaxTables,
) -> TributoResult<ComputationOutput<LucroRealResult>> {
    let start = Instant::now();
    tables.validate()?;
    let parsed = input.parse()?;
    let mut warnings = parsed.warnings();

    let result = lucro_real(&parsed.revenue, &parsed.expenses, &tables.real);
    if result.accounting_profit < Decimal::ZERO {
        warnings.push(format!(
            "Accounting loss of {}; no loss carryforward is modelled",
            -result.accounting_profit
        ));
    }

    let assumptions = serde_json::json!({
        "revenue": parsed.revenue,
        "expenses": parsed.expenses,
        "rates": tables.real,
        "creditable_expenses": ["purchases", "energy_rent_freight"],
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Lucro Real: IRPJ/CSLL on accounting profit, non-cumulative PIS/COFINS net of \
         input credits, IPI/ICMS/ISS gated by activity",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
