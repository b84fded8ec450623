use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use super::breakdown::{TaxBreakdown, TaxComponent};
use super::categories::{ExpenseBreakdown, RevenueBreakdown};
use super::input::RegimeInput;
use super::presumido::lucro_presumido;
use super::real::lucro_real;
use super::simples::{simples_nacional, SimplesNacionalResult};
use super::tables::{default_tables, TaxTables};
use crate::types::*;
use crate::TributoResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    SimplesNacional,
    LucroPresumido,
    LucroReal,
}

impl Regime {
    /// Evaluation order; earlier regimes win ties.
    pub const EVALUATION_ORDER: [Regime; 3] = [
        Regime::SimplesNacional,
        Regime::LucroPresumido,
        Regime::LucroReal,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Regime::SimplesNacional => "Simples Nacional",
            Regime::LucroPresumido => "Lucro Presumido",
            Regime::LucroReal => "Lucro Real",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplesSummary {
    pub total_tax: Money,
    pub effective_rate: Rate,
    pub net_profit: Money,
    pub bracket: SimplesNacionalResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemisedSummary {
    pub total_tax: Money,
    pub effective_rate: Rate,
    pub net_profit: Money,
    pub breakdown: TaxBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestRegime {
    pub regime: Regime,
    pub total_tax: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeComparison {
    pub total_revenue: Money,
    pub total_expense: Money,
    pub gross_profit: Money,
    pub simples_nacional: SimplesSummary,
    pub lucro_presumido: ItemisedSummary,
    pub lucro_real: ItemisedSummary,
    pub best: BestRegime,
    /// Highest total minus the best total.
    pub savings_vs_worst: Money,
    /// Positive components of the best regime, largest first.
    pub best_composition: Vec<TaxComponent>,
}

impl RegimeComparison {
    pub fn total_tax(&self, regime: Regime) -> Money {
        match regime {
            Regime::SimplesNacional => self.simples_nacional.total_tax,
            Regime::LucroPresumido => self.lucro_presumido.total_tax,
            Regime::LucroReal => self.lucro_real.total_tax,
        }
    }

    pub fn effective_rate(&self, regime: Regime) -> Rate {
        match regime {
            Regime::SimplesNacional => self.simples_nacional.effective_rate,
            Regime::LucroPresumido => self.lucro_presumido.effective_rate,
            Regime::LucroReal => self.lucro_real.effective_rate,
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Stable linear scan for the minimum; a later regime replaces the current
/// best only when strictly cheaper.
pub fn select_best(totals: [(Regime, Money); 3]) -> BestRegime {
    let [first, rest @ ..] = totals;
    let (regime, total_tax) = rest.into_iter().fold(first, |best, candidate| {
        if candidate.1 < best.1 {
            candidate
        } else {
            best
        }
    });
    BestRegime { regime, total_tax }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compare the three regimes using the built-in rate tables.
pub fn compare_regimes(input: &RegimeInput) -> TributoResult<ComputationOutput<RegimeComparison>> {
    compare_regimes_with_tables(input, default_tables())
}

/// Compare the three regimes using caller-supplied rate tables.
#[tracing::instrument(skip_all, fields(revenue_keys = input.revenue.len(), expense_keys = input.expenses.len()))]
pub fn compare_regimes_with_tables(
    input: &RegimeInput,
    tables: &TaxTables,
) -> TributoResult<ComputationOutput<RegimeComparison>> {
    let start = Instant::now();

    tables.validate()?;
    let parsed = input.parse()?;
    let mut warnings = parsed.warnings();

    let result = compare_breakdowns(&parsed.revenue, &parsed.expenses, tables)?;
    warnings.extend(comparison_warnings(&result));

    let assumptions = serde_json::json!({
        "revenue": parsed.revenue,
        "expenses": parsed.expenses,
        "surtax_threshold": tables.real.surtax_threshold.to_string(),
        "simples_brackets": tables.simples.len(),
        "tie_break_order": Regime::EVALUATION_ORDER,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annual tax comparison: Simples Nacional bracket lookup, Lucro Presumido on presumed \
         profit with cumulative PIS/COFINS, Lucro Real on accounting profit with \
         non-cumulative PIS/COFINS credits",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

/// Core comparison over typed breakdowns. Tables are assumed validated.
pub fn compare_breakdowns(
    revenue: &RevenueBreakdown,
    expenses: &ExpenseBreakdown,
    tables: &TaxTables,
) -> TributoResult<RegimeComparison> {
    let total_revenue = revenue.total();
    let total_expense = expenses.total();
    let gross_profit = total_revenue - total_expense;

    let simples = simples_nacional(total_revenue, &tables.simples)?;
    let presumido = lucro_presumido(revenue, &tables.presumido, &tables.presumption);
    let real = lucro_real(revenue, expenses, &tables.real);

    let simples_nacional = SimplesSummary {
        total_tax: simples.tax,
        effective_rate: ratio_or_zero(simples.tax, total_revenue),
        net_profit: gross_profit - simples.tax,
        bracket: simples,
    };
    let lucro_presumido = itemised(presumido.breakdown, total_revenue, gross_profit);
    let lucro_real = itemised(real.breakdown, total_revenue, gross_profit);

    let totals = [
        (Regime::SimplesNacional, simples_nacional.total_tax),
        (Regime::LucroPresumido, lucro_presumido.total_tax),
        (Regime::LucroReal, lucro_real.total_tax),
    ];
    let best = select_best(totals);
    let worst = totals
        .iter()
        .map(|(_, total)| *total)
        .max()
        .unwrap_or(Decimal::ZERO);

    let best_composition = match best.regime {
        Regime::SimplesNacional if best.total_tax > Decimal::ZERO => vec![TaxComponent {
            name: Regime::SimplesNacional.display_name().to_string(),
            amount: best.total_tax,
            share_of_total: Decimal::ONE,
        }],
        Regime::SimplesNacional => Vec::new(),
        Regime::LucroPresumido => lucro_presumido.breakdown.composition(),
        Regime::LucroReal => lucro_real.breakdown.composition(),
    };

    tracing::debug!(best = %best.regime, total = %best.total_tax, "regime selected");

    Ok(RegimeComparison {
        total_revenue,
        total_expense,
        gross_profit,
        simples_nacional,
        lucro_presumido,
        lucro_real,
        best,
        savings_vs_worst: worst - best.total_tax,
        best_composition,
    })
}

fn itemised(breakdown: TaxBreakdown, total_revenue: Money, gross_profit: Money) -> ItemisedSummary {
    ItemisedSummary {
        total_tax: breakdown.total,
        effective_rate: ratio_or_zero(breakdown.total, total_revenue),
        net_profit: gross_profit - breakdown.total,
        breakdown,
    }
}

pub(crate) fn comparison_warnings(result: &RegimeComparison) -> Vec<String> {
    let mut warnings = Vec::new();
    if result.total_revenue.is_zero() {
        warnings.push("Total revenue is zero; every regime yields zero tax".to_string());
    }
    if result.simples_nacional.bracket.fallback_used {
        warnings.push(format!(
            "Configuration integrity: revenue {} exceeds every Simples Nacional bracket; \
             the last bracket was applied. The table should end with an unbounded bracket.",
            result.total_revenue
        ));
    }
    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
