pub mod regimes;
pub mod tables;
