//! Brazilian corporate tax regime comparison.
//!
//! Computes annual tax liability under Simples Nacional, Lucro Presumido and
//! Lucro Real from categorised revenue and expenses, and selects the regime
//! with the lowest total.

pub mod error;
pub mod regimes;
pub mod types;

pub use error::TributoError;
pub use regimes::comparison::{compare_regimes, compare_regimes_with_tables};
pub use types::*;

/// Standard result type for all tributo operations
pub type TributoResult<T> = Result<T, TributoError>;
