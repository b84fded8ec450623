use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::breakdown::{activity_taxes, income_tax_surtax, TaxBreakdown};
use super::categories::RevenueBreakdown;
use super::input::RegimeInput;
use super::tables::{PresumptionTable, RegimeRates, TaxTables};
use crate::types::*;
use crate::TributoResult;

/// Lucro Presumido assessment: presumed bases plus the itemised tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LucroPresumidoResult {
    pub total_revenue: Money,
    /// Presumed profit for IRPJ.
    pub income_tax_base: Money,
    /// Presumed profit for CSLL.
    pub social_contribution_base: Money,
    pub breakdown: TaxBreakdown,
}

/// Lucro Presumido over gross revenue.
///
/// Profit is presumed as a fixed fraction of each category's revenue, so
/// expenses play no part; the function does not accept them.
pub fn lucro_presumido(
    revenue: &RevenueBreakdown,
    rates: &RegimeRates,
    presumption: &PresumptionTable,
) -> LucroPresumidoResult {
    let total_revenue = revenue.total();

    let mut income_tax_base = Decimal::ZERO;
    let mut social_contribution_base = Decimal::ZERO;
    for (category, amount) in revenue.present() {
        let presumed = presumption.rates_for(category.profile().presumption);
        income_tax_base += amount * presumed.income_tax;
        social_contribution_base += amount * presumed.social_contribution;
    }

    let activity = activity_taxes(revenue, rates);

    let breakdown = TaxBreakdown {
        pis: total_revenue * rates.pis,
        cofins: total_revenue * rates.cofins,
        income_tax: income_tax_base * rates.income_tax,
        income_tax_surtax: income_tax_surtax(income_tax_base, rates),
        social_contribution: social_contribution_base * rates.social_contribution,
        excise: activity.excise,
        state_goods: activity.state_goods,
        municipal_services: activity.municipal_services,
        // No payroll base is modelled.
        workplace_accident: Decimal::ZERO,
        total: Decimal::ZERO,
    }
    .totalled();

    tracing::debug!(%total_revenue, %income_tax_base, total = %breakdown.total, "lucro presumido assessed");

    LucroPresumidoResult {
        total_revenue,
        income_tax_base,
        social_contribution_base,
        breakdown,
    }
}

/// Lucro Presumido from a string-keyed input. Expense entries are parsed
/// for validation only.
pub fn calculate_lucro_presumido(
    input: &RegimeInput,
    tables: &TaxTables,
) -> TributoResult<ComputationOutput<LucroPresumidoResult>> {
    let start = Instant::now();
    tables.validate()?;
    let parsed = input.parse()?;
    let warnings = parsed.warnings();

    let result = lucro_presumido(&parsed.revenue, &tables.presumido, &tables.presumption);

    let assumptions = serde_json::json!({
        "revenue": parsed.revenue,
        "rates": tables.presumido,
        "presumption": tables.presumption,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Lucro Presumido: IRPJ/CSLL on presumed profit by activity, cumulative PIS/COFINS \
         on gross revenue, IPI/ICMS/ISS gated by activity",
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
    use crate::regimes::categories::RevenueCategory;
    use crate::regimes::tables::TaxTables;
    use rust_decimal_macros::dec;

    fn assess(revenue: &RevenueBreakdown) -> LucroPresumidoResult {
        let tables = TaxTables::default();
        lucro_presumido(revenue, &tables.presumido, &tables.presumption)
    }

    fn single(category: RevenueCategory, amount: Money) -> RevenueBreakdown {
        RevenueBreakdown::new().with(category, amount).unwrap()
    }

    #[test]
    fn test_commerce_million() {
        let r = assess(&single(RevenueCategory::Commerce, dec!(1_000_000)));
        let b = &r.breakdown;
        assert_eq!(r.income_tax_base, dec!(80_000));
        assert_eq!(r.social_contribution_base, dec!(120_000));
        assert_eq!(b.pis, dec!(6_500));
        assert_eq!(b.cofins, dec!(30_000));
        assert_eq!(b.income_tax, dec!(12_000));
        assert_eq!(b.income_tax_surtax, dec!(0));
        assert_eq!(b.social_contribution, dec!(10_800));
        assert_eq!(b.state_goods, dec!(220_000));
        assert_eq!(b.excise, dec!(0));
        assert_eq!(b.municipal_services, dec!(0));
        assert_eq!(b.total, dec!(279_300));
    }

    #[test]
    fn test_industry_pays_excise() {
        let r = assess(&single(RevenueCategory::Industry, dec!(1_000_000)));
        assert_eq!(r.breakdown.excise, dec!(100_000));
        assert_eq!(r.breakdown.state_goods, dec!(0));
        assert_eq!(r.social_contribution_base, dec!(120_000));
    }

    #[test]
    fn test_services_surtax_above_threshold() {
        // IRPJ base 32% of 1,000,000 = 320,000; surtax on 80,000
        let r = assess(&single(RevenueCategory::ServicesAnnexIII, dec!(1_000_000)));
        let b = &r.breakdown;
        assert_eq!(r.income_tax_base, dec!(320_000));
        assert_eq!(b.income_tax, dec!(48_000));
        assert_eq!(b.income_tax_surtax, dec!(8_000));
        assert_eq!(b.social_contribution, dec!(28_800));
        assert_eq!(b.municipal_services, dec!(37_500));
        // 6,500 + 30,000 + 48,000 + 8,000 + 28,800 + 37,500
        assert_eq!(b.total, dec!(158_800));
    }

    #[test]
    fn test_transport_presumption() {
        let r = assess(&single(RevenueCategory::Transport, dec!(500_000)));
        assert_eq!(r.income_tax_base, dec!(80_000));
        assert_eq!(r.social_contribution_base, dec!(60_000));
        assert_eq!(r.breakdown.municipal_services, dec!(0));
    }

    #[test]
    fn test_mixed_categories_accumulate() {
        let revenue = RevenueBreakdown::new()
            .with(RevenueCategory::Commerce, dec!(400_000))
            .unwrap()
            .with(RevenueCategory::ServicesAnnexIV, dec!(100_000))
            .unwrap();
        let r = assess(&revenue);
        // 400,000 × 8% + 100,000 × 32%
        assert_eq!(r.income_tax_base, dec!(64_000));
        // 400,000 × 12% + 100,000 × 32%
        assert_eq!(r.social_contribution_base, dec!(80_000));
        assert_eq!(r.breakdown.state_goods, dec!(88_000));
        assert_eq!(r.breakdown.municipal_services, dec!(3_750));
    }

    #[test]
    fn test_empty_revenue_is_zero() {
        let r = assess(&RevenueBreakdown::new());
        assert_eq!(r.breakdown, TaxBreakdown::default());
    }

    #[test]
    fn test_total_equals_component_sum() {
        let r = assess(&single(RevenueCategory::Services, dec!(2_345_678.90)));
        let sum: Money = r.breakdown.components().iter().map(|(_, v)| *v).sum();
        assert_eq!(r.breakdown.total, sum);
        assert_eq!(r.breakdown.workplace_accident, dec!(0));
    }
}
