use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::categories::{ExpenseBreakdown, RevenueBreakdown};
use crate::types::*;
use crate::TributoResult;

/// String-keyed revenue and expense maps, as received from a caller.
///
/// Keys are category names (canonical or Portuguese alias). Unknown keys are
/// ignored; negative amounts are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegimeInput {
    #[serde(default)]
    pub revenue: BTreeMap<String, Money>,
    #[serde(default)]
    pub expenses: BTreeMap<String, Money>,
}

/// Typed form of a [`RegimeInput`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedInput {
    pub revenue: RevenueBreakdown,
    pub expenses: ExpenseBreakdown,
    /// Keys that matched no category, prefixed with their group.
    pub ignored_keys: Vec<String>,
}

impl RegimeInput {
    pub fn parse(&self) -> TributoResult<ParsedInput> {
        let (revenue, mut ignored_keys) = RevenueBreakdown::from_keyed(&self.revenue)?;
        let (expenses, ignored_expenses) = ExpenseBreakdown::from_keyed(&self.expenses)?;
        ignored_keys.extend(ignored_expenses);

        for key in &ignored_keys {
            tracing::warn!(key = key.as_str(), "ignoring unknown category");
        }

        Ok(ParsedInput {
            revenue,
            expenses,
            ignored_keys,
        })
    }
}

impl ParsedInput {
    pub(crate) fn warnings(&self) -> Vec<String> {
        self.ignored_keys
            .iter()
            .map(|key| format!("Unknown category '{key}' ignored"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regimes::categories::{ExpenseCategory, RevenueCategory};
    use crate::TributoError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_json_with_numbers_and_strings() {
        let input: RegimeInput = serde_json::from_str(
            r#"{
                "revenue": {"comercio": 1000000, "services_annex_v": "250000.50"},
                "expenses": {"compras": 300000}
            }"#,
        )
        .unwrap();
        let parsed = input.parse().unwrap();
        assert_eq!(parsed.revenue.amount(RevenueCategory::Commerce), dec!(1_000_000));
        assert_eq!(
            parsed.revenue.amount(RevenueCategory::ServicesAnnexV),
            dec!(250_000.50)
        );
        assert_eq!(parsed.expenses.amount(ExpenseCategory::Purchases), dec!(300_000));
        assert!(parsed.ignored_keys.is_empty());
    }

    #[test]
    fn test_missing_expenses_default_to_empty() {
        let input: RegimeInput = serde_json::from_str(r#"{"revenue": {"industry": 10}}"#).unwrap();
        assert!(input.expenses.is_empty());
        assert_eq!(input.parse().unwrap().expenses.total(), dec!(0));
    }

    #[test]
    fn test_unknown_keys_become_warnings() {
        let mut input = RegimeInput::default();
        input.revenue.insert("mining".into(), dec!(5));
        input.expenses.insert("marketing".into(), dec!(5));
        let parsed = input.parse().unwrap();
        assert_eq!(parsed.ignored_keys, vec!["revenue.mining", "expenses.marketing"]);
        assert_eq!(parsed.warnings().len(), 2);
    }

    #[test]
    fn test_negative_expense_names_field() {
        let mut input = RegimeInput::default();
        input.expenses.insert("compras".into(), dec!(-10));
        match input.parse().unwrap_err() {
            TributoError::InvalidInput { field, .. } => assert_eq!(field, "expenses.compras"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }
}
