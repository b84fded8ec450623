use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;

use tributo_core::regimes::quick::{self, QuickSimulationInput};
use tributo_core::regimes::sensitivity::{self, RevenueSensitivityInput};
use tributo_core::regimes::{default_tables, presumido, real, simples, RegimeInput, TaxTables};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<T: DeserializeOwned>(json: &str) -> NapiResult<T> {
    serde_json::from_str(json).map_err(to_napi_error)
}

/// Caller-supplied rate tables, or the built-in defaults when absent.
fn tables_or_default(tables_json: Option<String>) -> NapiResult<TaxTables> {
    match tables_json {
        Some(json) => {
            let tables: TaxTables = parse(&json)?;
            tables.validate().map_err(to_napi_error)?;
            Ok(tables)
        }
        None => Ok(default_tables().clone()),
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_regimes(input_json: String, tables_json: Option<String>) -> NapiResult<String> {
    let input: RegimeInput = parse(&input_json)?;
    let tables = tables_or_default(tables_json)?;
    let output =
        tributo_core::compare_regimes_with_tables(&input, &tables).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn quick_simulation(input_json: String, tables_json: Option<String>) -> NapiResult<String> {
    let input: QuickSimulationInput = parse(&input_json)?;
    let tables = tables_or_default(tables_json)?;
    let output = quick::quick_simulation_with_tables(&input, &tables).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn revenue_sensitivity(input_json: String, tables_json: Option<String>) -> NapiResult<String> {
    let input: RevenueSensitivityInput = parse(&input_json)?;
    let tables = tables_or_default(tables_json)?;
    let output = sensitivity::revenue_sensitivity_with_tables(&input, &tables)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Single regimes
// ---------------------------------------------------------------------------

#[napi]
pub fn simples_nacional(input_json: String, tables_json: Option<String>) -> NapiResult<String> {
    let input: RegimeInput = parse(&input_json)?;
    let tables = tables_or_default(tables_json)?;
    let output = simples::calculate_simples_nacional(&input, &tables).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn lucro_presumido(input_json: String, tables_json: Option<String>) -> NapiResult<String> {
    let input: RegimeInput = parse(&input_json)?;
    let tables = tables_or_default(tables_json)?;
    let output = presumido::calculate_lucro_presumido(&input, &tables).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn lucro_real(input_json: String, tables_json: Option<String>) -> NapiResult<String> {
    let input: RegimeInput = parse(&input_json)?;
    let tables = tables_or_default(tables_json)?;
    let output = real::calculate_lucro_real(&input, &tables).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[napi(js_name = "defaultTables")]
pub fn default_tables_json() -> NapiResult<String> {
    serde_json::to_string(default_tables()).map_err(to_napi_error)
}
