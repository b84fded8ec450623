use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::categories::PresumptionClass;
use crate::error::TributoError;
use crate::types::*;
use crate::TributoResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One row of the Simples Nacional table: `revenue × rate − deduction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplesBracket {
    /// Inclusive upper bound of annual revenue. `None` is the catch-all.
    pub upper_bound: Option<Money>,
    pub rate: Rate,
    pub deduction: Money,
}

impl SimplesBracket {
    pub fn new(upper_bound: Option<Money>, rate: Rate, deduction: Money) -> Self {
        Self {
            upper_bound,
            rate,
            deduction,
        }
    }

    pub fn covers(&self, revenue: Money) -> bool {
        self.upper_bound.map_or(true, |bound| revenue <= bound)
    }
}

/// Statutory rates of one regime (Lucro Presumido or Lucro Real).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeRates {
    pub pis: Rate,
    pub cofins: Rate,
    /// IRPJ
    pub income_tax: Rate,
    /// Adicional de IRPJ
    pub income_tax_surtax: Rate,
    /// Annual base above which the surtax applies (20,000 × 12).
    pub surtax_threshold: Money,
    /// CSLL
    pub social_contribution: Rate,
    /// IPI
    pub excise: Rate,
    /// ICMS
    pub state_goods: Rate,
    /// ISS
    pub municipal_services: Rate,
    /// RAT
    pub workplace_accident: Rate,
}

impl RegimeRates {
    /// Lucro Presumido: cumulative PIS/COFINS.
    pub fn cumulative() -> Self {
        Self {
            pis: dec!(0.0065),
            cofins: dec!(0.03),
            ..Self::common()
        }
    }

    /// Lucro Real: non-cumulative PIS/COFINS.
    pub fn non_cumulative() -> Self {
        Self {
            pis: dec!(0.0165),
            cofins: dec!(0.076),
            ..Self::common()
        }
    }

    fn common() -> Self {
        Self {
            pis: Decimal::ZERO,
            cofins: Decimal::ZERO,
            income_tax: dec!(0.15),
            income_tax_surtax: dec!(0.10),
            surtax_threshold: dec!(240_000),
            social_contribution: dec!(0.09),
            excise: dec!(0.10),
            state_goods: dec!(0.22),
            municipal_services: dec!(0.0375),
            workplace_accident: dec!(0.01),
        }
    }

    fn named_rates(&self) -> [(&'static str, Rate); 9] {
        [
            ("pis", self.pis),
            ("cofins", self.cofins),
            ("income_tax", self.income_tax),
            ("income_tax_surtax", self.income_tax_surtax),
            ("social_contribution", self.social_contribution),
            ("excise", self.excise),
            ("state_goods", self.state_goods),
            ("municipal_services", self.municipal_services),
            ("workplace_accident", self.workplace_accident),
        ]
    }

    fn validate(&self, regime: &str) -> TributoResult<()> {
        for (name, rate) in self.named_rates() {
            check_rate(&format!("{regime}.{name}"), rate)?;
        }
        if self.surtax_threshold < Decimal::ZERO {
            return Err(TributoError::InvalidConfiguration(format!(
                "{regime}.surtax_threshold must be non-negative"
            )));
        }
        Ok(())
    }
}

/// Fractions of gross revenue presumed to be profit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresumptionRates {
    /// IRPJ base fraction
    pub income_tax: Rate,
    /// CSLL base fraction
    pub social_contribution: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresumptionTable {
    pub commerce: PresumptionRates,
    pub industry: PresumptionRates,
    pub services: PresumptionRates,
    pub transport: PresumptionRates,
    pub professional_services: PresumptionRates,
}

impl PresumptionTable {
    pub fn rates_for(&self, class: PresumptionClass) -> PresumptionRates {
        match class {
            PresumptionClass::Commerce => self.commerce,
            PresumptionClass::Industry => self.industry,
            PresumptionClass::Services => self.services,
            PresumptionClass::Transport => self.transport,
            PresumptionClass::ProfessionalServices => self.professional_services,
        }
    }
}

impl Default for PresumptionTable {
    fn default() -> Self {
        let goods = PresumptionRates {
            income_tax: dec!(0.08),
            social_contribution: dec!(0.12),
        };
        let services = PresumptionRates {
            income_tax: dec!(0.32),
            social_contribution: dec!(0.32),
        };
        Self {
            commerce: goods,
            industry: goods,
            services,
            transport: PresumptionRates {
                income_tax: dec!(0.16),
                social_contribution: dec!(0.12),
            },
            professional_services: services,
        }
    }
}

/// Complete rate configuration. Missing sections fall back to the defaults
/// when deserialised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxTables {
    pub simples: Vec<SimplesBracket>,
    pub presumido: RegimeRates,
    pub real: RegimeRates,
    pub presumption: PresumptionTable,
}

impl Default for TaxTables {
    fn default() -> Self {
        Self {
            simples: vec![
                SimplesBracket::new(Some(dec!(180_000)), dec!(0.04), dec!(0)),
                SimplesBracket::new(Some(dec!(360_000)), dec!(0.073), dec!(5_940)),
                SimplesBracket::new(Some(dec!(720_000)), dec!(0.095), dec!(13_860)),
                SimplesBracket::new(Some(dec!(1_800_000)), dec!(0.107), dec!(22_500)),
                SimplesBracket::new(Some(dec!(3_600_000)), dec!(0.143), dec!(87_300)),
                SimplesBracket::new(None, dec!(0.19), dec!(378_000)),
            ],
            presumido: RegimeRates::cumulative(),
            real: RegimeRates::non_cumulative(),
            presumption: PresumptionTable::default(),
        }
    }
}

impl TaxTables {
    /// Structural checks. A table without a catch-all bracket passes; the
    /// fallback is flagged when it is actually used.
    pub fn validate(&self) -> TributoResult<()> {
        if self.simples.is_empty() {
            return Err(TributoError::InvalidConfiguration(
                "Simples Nacional bracket table is empty".into(),
            ));
        }

        let last = self.simples.len() - 1;
        let mut previous: Option<Money> = None;
        for (i, bracket) in self.simples.iter().enumerate() {
            check_rate(&format!("simples[{i}].rate"), bracket.rate)?;
            if bracket.deduction < Decimal::ZERO {
                return Err(TributoError::InvalidConfiguration(format!(
                    "simples[{i}].deduction must be non-negative"
                )));
            }
            match bracket.upper_bound {
                None if i != last => {
                    return Err(TributoError::InvalidConfiguration(format!(
                        "simples[{i}] is unbounded but is not the last bracket"
                    )));
                }
                None => {}
                Some(bound) => {
                    if let Some(prev) = previous {
                        if bound <= prev {
                            return Err(TributoError::InvalidConfiguration(format!(
                                "simples[{i}].upper_bound ({bound}) must exceed the previous bound ({prev})"
                            )));
                        }
                    }
                    previous = Some(bound);
                }
            }
        }

        self.presumido.validate("presumido")?;
        self.real.validate("real")?;

        let p = &self.presumption;
        for (name, rates) in [
            ("commerce", p.commerce),
            ("industry", p.industry),
            ("services", p.services),
            ("transport", p.transport),
            ("professional_services", p.professional_services),
        ] {
            check_rate(&format!("presumption.{name}.income_tax"), rates.income_tax)?;
            check_rate(
                &format!("presumption.{name}.social_contribution"),
                rates.social_contribution,
            )?;
        }
        Ok(())
    }

    pub fn has_catch_all(&self) -> bool {
        self.simples
            .last()
            .is_some_and(|bracket| bracket.upper_bound.is_none())
    }
}

fn check_rate(name: &str, rate: Rate) -> TributoResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(TributoError::InvalidConfiguration(format!(
            "{name} must be between 0 and 1, got {rate}"
        )));
    }
    Ok(())
}

static DEFAULT_TABLES: LazyLock<TaxTables> = LazyLock::new(TaxTables::default);

/// Process-wide default tables, built on first use and never mutated.
pub fn default_tables() -> &'static TaxTables {
    &DEFAULT_TABLES
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_validate() {
        let tables = TaxTables::default();
        assert!(tables.validate().is_ok());
        assert!(tables.has_catch_all());
        assert_eq!(default_tables(), &tables);
    }

    #[test]
    fn test_regime_tables_differ_only_in_pis_cofins() {
        let lp = RegimeRates::cumulative();
        let lr = RegimeRates::non_cumulative();
        assert_eq!(lp.pis, dec!(0.0065));
        assert_eq!(lr.cofins, dec!(0.076));
        assert_eq!(
            RegimeRates {
                pis: lr.pis,
                cofins: lr.cofins,
                ..lp
            },
            lr
        );
    }

    #[test]
    fn test_presumption_percentages() {
        let p = PresumptionTable::default();
        assert_eq!(p.rates_for(PresumptionClass::Commerce).income_tax, dec!(0.08));
        assert_eq!(
            p.rates_for(PresumptionClass::Industry).social_contribution,
            dec!(0.12)
        );
        assert_eq!(p.rates_for(PresumptionClass::Transport).income_tax, dec!(0.16));
        assert_eq!(
            p.rates_for(PresumptionClass::ProfessionalServices)
                .social_contribution,
            dec!(0.32)
        );
    }

    #[test]
    fn test_empty_bracket_table_rejected() {
        let tables = TaxTables {
            simples: vec![],
            ..TaxTables::default()
        };
        assert!(matches!(
            tables.validate(),
            Err(TributoError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_non_increasing_bounds_rejected() {
        let tables = TaxTables {
            simples: vec![
                SimplesBracket::new(Some(dec!(360_000)), dec!(0.04), dec!(0)),
                SimplesBracket::new(Some(dec!(180_000)), dec!(0.073), dec!(5_940)),
            ],
            ..TaxTables::default()
        };
        assert!(tables.validate().is_err());
    }

    #[test]
    fn test_misplaced_catch_all_rejected() {
        let tables = TaxTables {
            simples: vec![
                SimplesBracket::new(None, dec!(0.04), dec!(0)),
                SimplesBracket::new(Some(dec!(180_000)), dec!(0.073), dec!(5_940)),
            ],
            ..TaxTables::default()
        };
        assert!(tables.validate().is_err());
    }

    #[test]
    fn test_missing_catch_all_tolerated() {
        let mut tables = TaxTables::default();
        tables.simples.pop();
        assert!(tables.validate().is_ok());
        assert!(!tables.has_catch_all());
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        let mut tables = TaxTables::default();
        tables.real.cofins = dec!(7.6);
        let err = tables.validate().unwrap_err();
        assert!(err.to_string().contains("real.cofins"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tables: TaxTables = serde_json::from_str(
            r#"{"simples":[{"upper_bound":null,"rate":"0.05","deduction":"0"}]}"#,
        )
        .unwrap();
        assert_eq!(tables.simples.len(), 1);
        assert_eq!(tables.real, RegimeRates::non_cumulative());
    }
}
