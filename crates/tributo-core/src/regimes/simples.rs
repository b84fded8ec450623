use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::input::RegimeInput;
use super::tables::{SimplesBracket, TaxTables};
use crate::error::TributoError;
use crate::types::*;
use crate::TributoResult;

/// Simples Nacional tax and the bracket it was assessed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplesNacionalResult {
    pub tax: Money,
    /// Zero-based position in the bracket table.
    pub bracket_index: usize,
    pub upper_bound: Option<Money>,
    pub nominal_rate: Rate,
    pub deduction: Money,
    /// Revenue exceeded every bound and the last bracket was used instead.
    pub fallback_used: bool,
}

/// Annual Simples Nacional tax for `revenue`.
///
/// The first bracket whose upper bound is at least `revenue` applies. When
/// none does (a table without an unbounded final bracket) the last bracket is
/// used and `fallback_used` is set. The result is clamped at zero.
pub fn simples_nacional(
    revenue: Money,
    brackets: &[SimplesBracket],
) -> TributoResult<SimplesNacionalResult> {
    if revenue < Decimal::ZERO {
        return Err(TributoError::InvalidInput {
            field: "total_revenue".into(),
            reason: format!("Revenue must be non-negative, got {revenue}"),
        });
    }

    let last_index = brackets.len().checked_sub(1).ok_or_else(|| {
        TributoError::InvalidConfiguration("Simples Nacional bracket table is empty".into())
    })?;

    let (bracket_index, fallback_used) = match brackets.iter().position(|b| b.covers(revenue)) {
        Some(i) => (i, false),
        None => {
            tracing::warn!(
                %revenue,
                "revenue exceeds every Simples Nacional bracket; using the last bracket"
            );
            (last_index, true)
        }
    };

    let bracket = &brackets[bracket_index];
    let tax = (revenue * bracket.rate - bracket.deduction).max(Decimal::ZERO);
    tracing::debug!(%revenue, bracket_index, %tax, "simples nacional assessed");

    Ok(SimplesNacionalResult {
        tax,
        bracket_index,
        upper_bound: bracket.upper_bound,
        nominal_rate: bracket.rate,
        deduction: bracket.deduction,
        fallback_used,
    })
}

/// Simples Nacional over the total of a string-keyed revenue map.
pub fn calculate_simples_nacional(
    input: &RegimeInput,
    tables: &TaxTables,
) -> TributoResult<ComputationOutput<SimplesNacionalResult>> {
    let start = Instant::now();
    tables.validate()?;
    let parsed = input.parse()?;
    let mut warnings = parsed.warnings();

    let revenue = parsed.revenue.total();
    let result = simples_nacional(revenue, &tables.simples)?;
    if result.fallback_used {
        warnings.push(format!(
            "Configuration integrity: revenue {revenue} exceeds every Simples Nacional bracket"
        ));
    }

    let assumptions = serde_json::json!({
        "total_revenue": revenue.to_string(),
        "brackets": tables.simples,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Simples Nacional: first bracket whose upper bound covers annual revenue, \
         revenue × rate − deduction, floored at zero",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
