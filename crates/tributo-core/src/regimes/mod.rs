pub mod breakdown;
pub mod categories;
pub mod comparison;
pub mod input;
pub mod presumido;
pub mod quick;
pub mod real;
pub mod sensitivity;
pub mod simples;
pub mod tables;

pub use breakdown::{TaxBreakdown, TaxComponent, TaxKind};
pub use categories::{
    CategoryKey, ExpenseBreakdown, ExpenseCategory, RevenueBreakdown, RevenueCategory,
};
pub use comparison::{BestRegime, Regime, RegimeComparison};
pub use input::RegimeInput;
pub use tables::{default_tables, TaxTables};
