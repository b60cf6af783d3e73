use clap::Args;
use property_finance_core::analysis::comparison;
use property_finance_core::analysis::sell_vs_hold::{self, SellVsHoldInput};
use property_finance_core::analysis::sensitivity::{self, SensitivityInput};
use property_finance_core::analysis::summary;
use property_finance_core::projection::parameters::PropertyInput;
use rust_decimal::Decimal;
use serde_json::Value;

use super::load_input;
use super::projection::yearly_rows;

/// Arguments for the full investment analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON/YAML property input
    #[arg(long)]
    pub input: Option<String>,

    /// Replace the per-year detail with compact rows
    #[arg(long)]
    pub yearly: bool,
}

/// Arguments for the benchmark comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Initial cash invested
    #[arg(long)]
    pub initial: Decimal,

    /// Comma-separated yearly net cash flows (year 1 first)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Vec<Decimal>,

    /// Property profit if sold at the end of the horizon
    #[arg(long, allow_hyphen_values = true)]
    pub profit: Decimal,

    /// Benchmark annual return
    #[arg(long, default_value = "0.10")]
    pub rate: Decimal,

    /// Horizon in years (defaults to the number of cash flows)
    #[arg(long)]
    pub years: Option<u32>,
}

/// Arguments for sell-now vs hold
#[derive(Args)]
pub struct SellVsHoldArgs {
    /// Path to JSON/YAML sell-vs-hold input
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the tornado sensitivity sweep
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON/YAML sensitivity input
    #[arg(long)]
    pub input: Option<String>,

    /// Run scenarios on the calling thread only
    #[arg(long)]
    pub sequential: bool,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let property: PropertyInput = load_input(args.input.as_deref(), "analyze")?;
    let output = summary::analyze_investment(&property)?;
    let mut value = serde_json::to_value(&output)?;
    if args.yearly {
        value["result"]["years"] = yearly_rows(&output.result.years);
    }
    Ok(value)
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let years = match args.years {
        Some(y) => y,
        None => u32::try_from(args.cash_flows.len())?,
    };
    if years == 0 {
        return Err("--years or at least one --cash-flows value is required".into());
    }
    if args.cash_flows.len() > years as usize {
        return Err(format!(
            "{} cash flows supplied for a {}-year horizon",
            args.cash_flows.len(),
            years
        )
        .into());
    }

    let result = comparison::compare(args.initial, &args.cash_flows, args.profit, args.rate, years);
    Ok(serde_json::to_value(result)?)
}

pub fn run_sell_vs_hold(args: SellVsHoldArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let svh: SellVsHoldInput = load_input(args.input.as_deref(), "sell-vs-hold")?;
    let result = sell_vs_hold::analyze_sell_vs_hold(&svh)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut sens: SensitivityInput = load_input(args.input.as_deref(), "sensitivity")?;
    if args.sequential {
        sens.parallel = false;
    }
    let result = sensitivity::run_sensitivity(&sens)?;
    Ok(serde_json::to_value(result)?)
}
