use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::comparison::{compare_breakdowns, Regime};
use super::input::RegimeInput;
use super::tables::{default_tables, TaxTables};
use crate::error::TributoError;
use crate::types::*;
use crate::TributoResult;

/// Revenue multipliers swept when none are supplied.
pub const DEFAULT_FACTORS: [Rate; 6] = [
    dec!(0.5),
    dec!(0.75),
    dec!(1.0),
    dec!(1.25),
    dec!(1.5),
    dec!(2.0),
];

fn default_factors() -> Vec<Rate> {
    DEFAULT_FACTORS.to_vec()
}

/// Base scenario plus the multipliers applied to every revenue and expense
/// amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSensitivityInput {
    #[serde(flatten)]
    pub base: RegimeInput,
    #[serde(default = "default_factors")]
    pub factors: Vec<Rate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub factor: Rate,
    pub total_revenue: Money,
    pub total_expense: Money,
    pub simples_nacional: Money,
    pub lucro_presumido: Money,
    pub lucro_real: Money,
    pub best: Regime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSensitivityOutput {
    pub points: Vec<SensitivityPoint>,
    /// Factors at which the best regime differs from the previous point.
    pub regime_changes: Vec<Rate>,
}

pub fn revenue_sensitivity(
    input: &RevenueSensitivityInput,
) -> TributoResult<ComputationOutput<RevenueSensitivityOutput>> {
    revenue_sensitivity_with_tables(input, default_tables())
}

/// Rerun the comparison with revenue and expenses scaled together by each
/// factor, keeping the expense-to-revenue proportion fixed.
#[tracing::instrument(skip_all, fields(points = input.factors.len()))]
pub fn revenue_sensitivity_with_tables(
    input: &RevenueSensitivityInput,
    tables: &TaxTables,
) -> TributoResult<ComputationOutput<RevenueSensitivityOutput>> {
    let start = Instant::now();

    if input.factors.is_empty() {
        return Err(TributoError::InsufficientData(
            "At least one revenue factor is required".into(),
        ));
    }
    if let Some(bad) = input.factors.iter().find(|f| **f <= Decimal::ZERO) {
        return Err(TributoError::InvalidInput {
            field: "factors".into(),
            reason: format!("Factors must be positive, got {bad}"),
        });
    }

    tables.validate()?;
    let parsed = input.base.parse()?;
    let mut warnings = parsed.warnings();

    let mut points = Vec::with_capacity(input.factors.len());
    for &factor in &input.factors {
        let revenue = parsed.revenue.scaled(factor)?;
        let expenses = parsed.expenses.scaled(factor)?;
        let comparison = compare_breakdowns(&revenue, &expenses, tables)?;
        if comparison.simples_nacional.bracket.fallback_used {
            warnings.push(format!(
                "Configuration integrity: factor {factor} exceeds every Simples Nacional bracket"
            ));
        }
        points.push(SensitivityPoint {
            factor,
            total_revenue: comparison.total_revenue,
            total_expense: comparison.total_expense,
            simples_nacional: comparison.simples_nacional.total_tax,
            lucro_presumido: comparison.lucro_presumido.total_tax,
            lucro_real: comparison.lucro_real.total_tax,
            best: comparison.best.regime,
        });
    }

    let regime_changes = points
        .windows(2)
        .filter(|pair| pair[0].best != pair[1].best)
        .map(|pair| pair[1].factor)
        .collect();

    let assumptions = serde_json::json!({
        "factors": input.factors.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
        "base_revenue": parsed.revenue.total().to_string(),
        "base_expense": parsed.expenses.total().to_string(),
        "expenses_scale_with_revenue": true,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Revenue sensitivity: regime comparison repeated with revenue and expenses scaled proportionally",
        &assumptions,
        warnings,
        elapsed,
        RevenueSensitivityOutput {
            points,
            regime_changes,
        },
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn commerce_input(factors: Vec<Rate>) -> RevenueSensitivityInput {
        let mut base = RegimeInput::default();
        base.revenue.insert("commerce".into(), dec!(1_000_000));
        base.expenses.insert("purchases".into(), dec!(300_000));
        RevenueSensitivityInput { base, factors }
    }

    #[test]
    fn test_default_factors_from_json() {
        let input: RevenueSensitivityInput =
            serde_json::from_str(r#"{"revenue": {"commerce": 1000000}}"#).unwrap();
        assert_eq!(input.factors.len(), 6);
        assert_eq!(input.base.revenue.len(), 1);
    }

    #[test]
    fn test_points_scale_revenue_and_expenses() {
        let out = revenue_sensitivity(&commerce_input(default_factors())).unwrap();
        let points = &out.result.points;
        assert_eq!(points.len(), 6);
        assert_eq!(points[0].total_revenue, dec!(500_000));
        assert_eq!(points[0].total_expense, dec!(150_000));
        assert_eq!(points[5].total_revenue, dec!(2_000_000));
        // Base point matches a direct comparison
        assert_eq!(points[2].simples_nacional, dec!(84_500));
        assert_eq!(points[2].lucro_presumido, dec!(279_300));
    }

    #[test]
    fn test_regime_change_detected() {
        // Industry with heavy purchases: Simples wins at 1M but loses to Lucro
        // Real once 5M lands in the 19% bracket.
        let mut base = RegimeInput::default();
        base.revenue.insert("industry".into(), dec!(1_000_000));
        base.expenses.insert("purchases".into(), dec!(960_000));
        let out = revenue_sensitivity(&RevenueSensitivityInput {
            base,
            factors: vec![dec!(1), dec!(5)],
        })
        .unwrap();
        let points = &out.result.points;
        assert_eq!(points[0].best, Regime::SimplesNacional);
        assert_eq!(points[1].best, Regime::LucroReal);
        assert_eq!(out.result.regime_changes, vec![dec!(5)]);
    }

    #[test]
    fn test_empty_factors_rejected() {
        let err = revenue_sensitivity(&commerce_input(vec![])).unwrap_err();
        assert!(matches!(err, TributoError::InsufficientData(_)));
    }

    #[test]
    fn test_non_positive_factor_rejected() {
        let err = revenue_sensitivity(&commerce_input(vec![dec!(1), dec!(0)])).unwrap_err();
        assert!(matches!(err, TributoError::InvalidInput { .. }));
    }
}
