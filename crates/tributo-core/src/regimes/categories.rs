use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::TributoError;
use crate::types::*;
use crate::TributoResult;

// ---------------------------------------------------------------------------
// Category keys
// ---------------------------------------------------------------------------

/// A closed set of categories addressable by a string key.
pub trait CategoryKey: Copy + Ord + fmt::Debug + 'static {
    /// Prefix used in validation error fields (`revenue.commerce`).
    const GROUP: &'static str;

    /// Every variant, in declaration order.
    fn all() -> &'static [Self];

    /// Canonical snake_case key.
    fn key(self) -> &'static str;

    /// Portuguese key accepted as an alias of the canonical one.
    fn alias(self) -> &'static str;

    /// Resolve a canonical key or alias. Unknown keys yield `None`.
    fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.key().eq_ignore_ascii_case(key) || c.alias().eq_ignore_ascii_case(key))
    }
}

/// Activity that generated a slice of revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RevenueCategory {
    #[serde(rename = "commerce", alias = "comercio")]
    Commerce,
    #[serde(rename = "industry", alias = "industria")]
    Industry,
    #[serde(rename = "services_annex_iii", alias = "servicos_anexo_iii")]
    ServicesAnnexIII,
    #[serde(rename = "services_annex_iv", alias = "servicos_anexo_iv")]
    ServicesAnnexIV,
    #[serde(rename = "services_annex_v", alias = "servicos_anexo_v")]
    ServicesAnnexV,
    #[serde(rename = "services", alias = "servicos")]
    Services,
    #[serde(rename = "transport", alias = "transporte")]
    Transport,
    #[serde(rename = "professional_services", alias = "servicos_profissionais")]
    ProfessionalServices,
}

/// Presumed-profit class a revenue category is assessed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresumptionClass {
    Commerce,
    Industry,
    Services,
    Transport,
    ProfessionalServices,
}

/// Static tax profile of a revenue category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryProfile {
    pub presumption: PresumptionClass,
    /// Subject to IPI.
    pub excise: bool,
    /// Subject to ICMS.
    pub state_goods: bool,
    /// Subject to ISS.
    pub municipal_services: bool,
}

impl CategoryProfile {
    const fn new(
        presumption: PresumptionClass,
        excise: bool,
        state_goods: bool,
        municipal_services: bool,
    ) -> Self {
        Self {
            presumption,
            excise,
            state_goods,
            municipal_services,
        }
    }
}

impl RevenueCategory {
    pub const ALL: [RevenueCategory; 8] = [
        RevenueCategory::Commerce,
        RevenueCategory::Industry,
        RevenueCategory::ServicesAnnexIII,
        RevenueCategory::ServicesAnnexIV,
        RevenueCategory::ServicesAnnexV,
        RevenueCategory::Services,
        RevenueCategory::Transport,
        RevenueCategory::ProfessionalServices,
    ];

    pub const fn profile(self) -> CategoryProfile {
        use PresumptionClass as P;
        match self {
            RevenueCategory::Commerce => CategoryProfile::new(P::Commerce, false, true, false),
            RevenueCategory::Industry => CategoryProfile::new(P::Industry, true, false, false),
            RevenueCategory::Services => CategoryProfile::new(P::Services, false, false, true),
            RevenueCategory::ServicesAnnexIII => {
                CategoryProfile::new(P::Services, false, false, true)
            }
            RevenueCategory::ServicesAnnexIV => {
                CategoryProfile::new(P::ProfessionalServices, false, false, true)
            }
            RevenueCategory::ServicesAnnexV => {
                CategoryProfile::new(P::Services, false, false, true)
            }
            RevenueCategory::Transport => CategoryProfile::new(P::Transport, false, false, false),
            RevenueCategory::ProfessionalServices => {
                CategoryProfile::new(P::ProfessionalServices, false, false, false)
            }
        }
    }
}

impl CategoryKey for RevenueCategory {
    const GROUP: &'static str = "revenue";

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn key(self) -> &'static str {
        match self {
            RevenueCategory::Commerce => "commerce",
            RevenueCategory::Industry => "industry",
            RevenueCategory::ServicesAnnexIII => "services_annex_iii",
            RevenueCategory::ServicesAnnexIV => "services_annex_iv",
            RevenueCategory::ServicesAnnexV => "services_annex_v",
            RevenueCategory::Services => "services",
            RevenueCategory::Transport => "transport",
            RevenueCategory::ProfessionalServices => "professional_services",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            RevenueCategory::Commerce => "comercio",
            RevenueCategory::Industry => "industria",
            RevenueCategory::ServicesAnnexIII => "servicos_anexo_iii",
            RevenueCategory::ServicesAnnexIV => "servicos_anexo_iv",
            RevenueCategory::ServicesAnnexV => "servicos_anexo_v",
            RevenueCategory::Services => "servicos",
            RevenueCategory::Transport => "transporte",
            RevenueCategory::ProfessionalServices => "servicos_profissionais",
        }
    }
}

/// Kind of operating expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    #[serde(rename = "purchases", alias = "compras")]
    Purchases,
    #[serde(rename = "energy_rent_freight", alias = "energia_aluguel_frete")]
    EnergyRentFreight,
    #[serde(rename = "depreciation", alias = "depreciacao")]
    Depreciation,
    #[serde(rename = "salaries", alias = "salarios")]
    Salaries,
    #[serde(rename = "other", alias = "demais_despesas")]
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::Purchases,
        ExpenseCategory::EnergyRentFreight,
        ExpenseCategory::Depreciation,
        ExpenseCategory::Salaries,
        ExpenseCategory::Other,
    ];

    /// Whether the expense generates non-cumulative PIS/COFINS input credit.
    pub const fn is_creditable(self) -> bool {
        matches!(
            self,
            ExpenseCategory::Purchases | ExpenseCategory::EnergyRentFreight
        )
    }
}

impl CategoryKey for ExpenseCategory {
    const GROUP: &'static str = "expenses";

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn key(self) -> &'static str {
        match self {
            ExpenseCategory::Purchases => "purchases",
            ExpenseCategory::EnergyRentFreight => "energy_rent_freight",
            ExpenseCategory::Depreciation => "depreciation",
            ExpenseCategory::Salaries => "salaries",
            ExpenseCategory::Other => "other",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            ExpenseCategory::Purchases => "compras",
            ExpenseCategory::EnergyRentFreight => "energia_aluguel_frete",
            ExpenseCategory::Depreciation => "depreciacao",
            ExpenseCategory::Salaries => "salarios",
            ExpenseCategory::Other => "demais_despesas",
        }
    }
}

// ---------------------------------------------------------------------------
// Breakdowns
// ---------------------------------------------------------------------------

/// Largest amount a single category may hold (one quadrillion BRL). With at
/// most eight categories every total and every rate product stays well inside
/// `Decimal` range.
pub const MAX_AMOUNT: Money = dec!(1_000_000_000_000_000);

/// Non-negative amounts per category. Absent and zero entries are equivalent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Breakdown<C: CategoryKey + Serialize> {
    amounts: BTreeMap<C, Money>,
}

pub type RevenueBreakdown = Breakdown<RevenueCategory>;
pub type ExpenseBreakdown = Breakdown<ExpenseCategory>;

impl<C: CategoryKey + Serialize> Default for Breakdown<C> {
    fn default() -> Self {
        Self {
            amounts: BTreeMap::new(),
        }
    }
}

impl<C: CategoryKey + Serialize> Breakdown<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `category`, rejecting negative values and any
    /// category total above [`MAX_AMOUNT`].
    pub fn add(&mut self, category: C, amount: Money) -> TributoResult<()> {
        let field = || format!("{}.{}", C::GROUP, category.key());
        if amount < Decimal::ZERO {
            return Err(TributoError::InvalidInput {
                field: field(),
                reason: format!("Amount must be non-negative, got {amount}"),
            });
        }
        let entry = self.amounts.entry(category).or_insert(Decimal::ZERO);
        match entry.checked_add(amount) {
            Some(sum) if sum <= MAX_AMOUNT => {
                *entry = sum;
                Ok(())
            }
            _ => Err(TributoError::InvalidInput {
                field: field(),
                reason: format!("Amount exceeds the supported ceiling of {MAX_AMOUNT}"),
            }),
        }
    }

    /// Builder form of [`Breakdown::add`].
    pub fn with(mut self, category: C, amount: Money) -> TributoResult<Self> {
        self.add(category, amount)?;
        Ok(self)
    }

    /// Build from a string-keyed map. Canonical keys and aliases pointing at
    /// the same category are summed; unrecognised keys are returned instead of
    /// being treated as errors.
    pub fn from_keyed(map: &BTreeMap<String, Money>) -> TributoResult<(Self, Vec<String>)> {
        let mut breakdown = Self::new();
        let mut ignored = Vec::new();
        for (key, amount) in map {
            match C::from_key(key) {
                Some(category) => {
                    if *amount < Decimal::ZERO {
                        return Err(TributoError::InvalidInput {
                            field: format!("{}.{}", C::GROUP, key),
                            reason: format!("Amount must be non-negative, got {amount}"),
                        });
                    }
                    breakdown.add(category, *amount)?;
                }
                None => ignored.push(format!("{}.{}", C::GROUP, key)),
            }
        }
        Ok((breakdown, ignored))
    }

    pub fn amount(&self, category: C) -> Money {
        self.amounts.get(&category).copied().unwrap_or(Decimal::ZERO)
    }

    /// Categories with a strictly positive amount, in declaration order.
    pub fn present(&self) -> impl Iterator<Item = (C, Money)> + '_ {
        self.amounts
            .iter()
            .filter(|(_, amount)| **amount > Decimal::ZERO)
            .map(|(category, amount)| (*category, *amount))
    }

    pub fn total(&self) -> Money {
        self.amounts.values().copied().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }

    /// Every amount multiplied by `factor`. Results are subject to the same
    /// limits as [`Breakdown::add`].
    pub fn scaled(&self, factor: Rate) -> TributoResult<Self> {
        let mut out = Self::new();
        for (category, amount) in &self.amounts {
            let product = amount.checked_mul(factor).ok_or_else(|| TributoError::InvalidInput {
                field: format!("{}.{}", C::GROUP, category.key()),
                reason: format!("Amount scaled by {factor} exceeds the supported ceiling of {MAX_AMOUNT}"),
            })?;
            out.add(*category, product)?;
        }
        Ok(out)
    }
}

impl ExpenseBreakdown {
    /// Sum of the expenses that generate PIS/COFINS input credit.
    pub fn credit_base(&self) -> Money {
        self.present()
            .filter(|(category, _)| category.is_creditable())
            .map(|(_, amount)| amount)
            .sum()
    }
}

impl fmt::Display for RevenueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
