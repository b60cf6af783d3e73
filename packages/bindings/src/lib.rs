use napi::Result as NapiResult;
use napi_derive::napi;
use property_finance_core::analysis::{comparison, sell_vs_hold, sensitivity, summary};
use property_finance_core::financing::amortization;
use property_finance_core::projection::{parameters::PropertyInput, yearly};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

#[napi]
pub fn amortize(input_json: String) -> NapiResult<String> {
    let input: amortization::AmortizationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::amortize(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[napi]
pub fn build_projection(input_json: String) -> NapiResult<String> {
    let input: PropertyInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = yearly::build_projection(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_investment(input_json: String) -> NapiResult<String> {
    let input: PropertyInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = summary::analyze_investment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct CompareInput {
    initial_investment: Decimal,
    yearly_cash_flows: Vec<Decimal>,
    re_profit: Decimal,
    benchmark_rate: Decimal,
    holding_years: u32,
}

#[napi]
pub fn compare_to_benchmark(input_json: String) -> NapiResult<String> {
    let input: CompareInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = comparison::compare(
        input.initial_investment,
        &input.yearly_cash_flows,
        input.re_profit,
        input.benchmark_rate,
        input.holding_years,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_sell_vs_hold(input_json: String) -> NapiResult<String> {
    let input: sell_vs_hold::SellVsHoldInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sell_vs_hold::analyze_sell_vs_hold(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn run_sensitivity(input_json: String) -> NapiResult<String> {
    let input: sensitivity::SensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sensitivity::run_sensitivity(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
