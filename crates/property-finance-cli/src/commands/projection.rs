use clap::Args;
use property_finance_core::projection::parameters::PropertyInput;
use property_finance_core::projection::yearly::{self, YearlyProjection};
use serde_json::{json, Value};

use super::load_input;

/// Arguments for the yearly projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON/YAML property input
    #[arg(long)]
    pub input: Option<String>,

    /// Override the holding period
    #[arg(long)]
    pub years: Option<u32>,

    /// Emit one compact row per year instead of the full projection
    #[arg(long)]
    pub yearly: bool,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut property: PropertyInput = load_input(args.input.as_deref(), "project")?;
    if let Some(years) = args.years {
        property.holding_period_years = years;
    }

    let output = yearly::build_projection(&property)?;
    let mut value = serde_json::to_value(&output)?;
    if args.yearly {
        value["result"] = yearly_rows(&output.result.years);
    }
    Ok(value)
}

/// The columns that fit on one terminal line per year.
pub(crate) fn yearly_rows(years: &[YearlyProjection]) -> Value {
    Value::Array(
        years
            .iter()
            .map(|y| {
                json!({
                    "year": y.year,
                    "property_value": y.property_value.round_dp(0),
                    "loan_balance": y.loan_balance.round_dp(0),
                    "equity": y.equity.round_dp(0),
                    "net_rental_income": y.net_rental_income.round_dp(0),
                    "operating_costs": y.operating_costs.total.round_dp(0),
                    "mortgage_payment": y.mortgage_payment.round_dp(0),
                    "tax_benefit": y.total_tax_benefit.round_dp(0),
                    "net_cash_flow": y.net_cash_flow.round_dp(0),
                    "cumulative_cash_flow": y.cumulative_cash_flow.round_dp(0),
                    "profit_if_sold": y.total_profit_if_sold.round_dp(0),
                    "after_tax_profit": y.after_tax_profit_if_sold.round_dp(0),
                })
            })
            .collect(),
    )
}
