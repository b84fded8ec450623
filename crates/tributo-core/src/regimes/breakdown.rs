use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::categories::RevenueBreakdown;
use super::tables::RegimeRates;
use crate::types::*;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The nine levies itemised under Lucro Presumido and Lucro Real.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxKind {
    Pis,
    Cofins,
    IncomeTax,
    IncomeTaxSurtax,
    SocialContribution,
    Excise,
    StateGoods,
    MunicipalServices,
    WorkplaceAccident,
}

impl TaxKind {
    /// Brazilian acronym.
    pub fn acronym(self) -> &'static str {
        match self {
            TaxKind::Pis => "PIS",
            TaxKind::Cofins => "COFINS",
            TaxKind::IncomeTax => "IRPJ",
            TaxKind::IncomeTaxSurtax => "Adicional IRPJ",
            TaxKind::SocialContribution => "CSLL",
            TaxKind::Excise => "IPI",
            TaxKind::StateGoods => "ICMS",
            TaxKind::MunicipalServices => "ISS",
            TaxKind::WorkplaceAccident => "RAT",
        }
    }
}

impl fmt::Display for TaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.acronym())
    }
}

/// Itemised tax of one regime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub pis: Money,
    pub cofins: Money,
    pub income_tax: Money,
    pub income_tax_surtax: Money,
    pub social_contribution: Money,
    pub excise: Money,
    pub state_goods: Money,
    pub municipal_services: Money,
    pub workplace_accident: Money,
    /// Sum of the nine components.
    pub total: Money,
}

/// A single named amount, used for composition listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxComponent {
    pub name: String,
    pub amount: Money,
    pub share_of_total: Rate,
}

impl TaxBreakdown {
    pub fn components(&self) -> [(TaxKind, Money); 9] {
        [
            (TaxKind::Pis, self.pis),
            (TaxKind::Cofins, self.cofins),
            (TaxKind::IncomeTax, self.income_tax),
            (TaxKind::IncomeTaxSurtax, self.income_tax_surtax),
            (TaxKind::SocialContribution, self.social_contribution),
            (TaxKind::Excise, self.excise),
            (TaxKind::StateGoods, self.state_goods),
            (TaxKind::MunicipalServices, self.municipal_services),
            (TaxKind::WorkplaceAccident, self.workplace_accident),
        ]
    }

    pub fn get(&self, kind: TaxKind) -> Money {
        self.components()
            .into_iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, amount)| amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// Recompute `total` from the components. Any previous total is discarded.
    pub fn totalled(mut self) -> Self {
        self.total = self.components().iter().map(|(_, amount)| *amount).sum();
        self
    }

    /// Positive components, largest first.
    pub fn composition(&self) -> Vec<TaxComponent> {
        let mut parts: Vec<TaxComponent> = self
            .components()
            .into_iter()
            .filter(|(_, amount)| *amount > Decimal::ZERO)
            .map(|(kind, amount)| TaxComponent {
                name: kind.acronym().to_string(),
                amount,
                share_of_total: ratio_or_zero(amount, self.total),
            })
            .collect();
        parts.sort_by(|a, b| b.amount.cmp(&a.amount));
        parts
    }
}

// ---------------------------------------------------------------------------
// Levies shared by the profit-based regimes
// ---------------------------------------------------------------------------

/// IPI, ICMS and ISS, each gated on the presence of a qualifying category.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActivityTaxes {
    pub excise: Money,
    pub state_goods: Money,
    pub municipal_services: Money,
}

pub fn activity_taxes(revenue: &RevenueBreakdown, rates: &RegimeRates) -> ActivityTaxes {
    let mut excise_base = Decimal::ZERO;
    let mut goods_base = Decimal::ZERO;
    let mut services_base = Decimal::ZERO;

    for (category, amount) in revenue.present() {
        let profile = category.profile();
        if profile.excise {
            excise_base += amount;
        }
        if profile.state_goods {
            goods_base += amount;
        }
        if profile.municipal_services {
            services_base += amount;
        }
    }

    ActivityTaxes {
        excise: excise_base * rates.excise,
        state_goods: goods_base * rates.state_goods,
        municipal_services: services_base * rates.municipal_services,
    }
}

/// Adicional de IRPJ: applied once to the annual base above the threshold.
pub fn income_tax_surtax(base: Money, rates: &RegimeRates) -> Money {
    (base - rates.surtax_threshold).max(Decimal::ZERO) * rates.income_tax_surtax
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regimes::categories::RevenueCategory;
    use rust_decimal_macros::dec;

    #[test]
    fn test_totalled_sums_once() {
        let b = TaxBreakdown {
            pis: dec!(10),
            cofins: dec!(20),
            state_goods: dec!(70),
            total: dec!(999),
            ..Default::default()
        }
        .totalled();
        assert_eq!(b.total, dec!(100));
        assert_eq!(b.clone().totalled().total, dec!(100));
    }

    #[test]
    fn test_composition_sorted_and_positive_only() {
        let b = TaxBreakdown {
            pis: dec!(10),
            cofins: dec!(30),
            state_goods: dec!(60),
            ..Default::default()
        }
        .totalled();
        let parts = b.composition();
        let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["ICMS", "COFINS", "PIS"]);
        assert_eq!(parts[0].share_of_total, dec!(0.6));
    }

    #[test]
    fn test_surtax_threshold() {
        let rates = RegimeRates::cumulative();
        assert_eq!(income_tax_surtax(dec!(240_000), &rates), dec!(0));
        assert_eq!(income_tax_surtax(dec!(100_000), &rates), dec!(0));
        assert_eq!(income_tax_surtax(dec!(340_000), &rates), dec!(10_000));
    }

    #[test]
    fn test_activity_taxes_sum_every_service_variant() {
        let revenue = RevenueBreakdown::new()
            .with(RevenueCategory::Services, dec!(100_000))
            .unwrap()
            .with(RevenueCategory::ServicesAnnexIII, dec!(100_000))
            .unwrap()
            .with(RevenueCategory::ServicesAnnexIV, dec!(100_000))
            .unwrap()
            .with(RevenueCategory::ServicesAnnexV, dec!(100_000))
            .unwrap();
        let taxes = activity_taxes(&revenue, &RegimeRates::cumulative());
        assert_eq!(taxes.municipal_services, dec!(15_000));
        assert_eq!(taxes.excise, dec!(0));
        assert_eq!(taxes.state_goods, dec!(0));
    }

    #[test]
    fn test_activity_taxes_gated_by_category() {
        let revenue = RevenueBreakdown::new()
            .with(RevenueCategory::Industry, dec!(500_000))
            .unwrap()
            .with(RevenueCategory::Transport, dec!(500_000))
            .unwrap();
        let taxes = activity_taxes(&revenue, &RegimeRates::non_cumulative());
        assert_eq!(taxes.excise, dec!(50_000));
        assert_eq!(taxes.state_goods, dec!(0));
        assert_eq!(taxes.municipal_services, dec!(0));
    }
}
