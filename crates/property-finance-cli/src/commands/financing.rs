use clap::Args;
use property_finance_core::financing::amortization::{
    self, AmortizationInput, EscrowItems, LoanTerms, PaymentFrequency, PMI_LTV_THRESHOLD,
};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::input;

/// Arguments for a loan amortisation schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON/YAML input file (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate (0.065 = 6.5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortisation term in years
    #[arg(long, default_value = "30")]
    pub term_years: u32,

    /// Payment frequency: monthly, bi-weekly or weekly
    #[arg(long, default_value = "monthly")]
    pub frequency: String,

    /// Property value for LTV and PMI cancellation
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// Extra principal paid every period
    #[arg(long)]
    pub extra: Option<Decimal>,

    /// Annual PMI premium as a fraction of the balance
    #[arg(long)]
    pub pmi_rate: Option<Decimal>,

    /// Annual property tax collected in escrow
    #[arg(long)]
    pub property_tax: Option<Decimal>,

    /// Annual insurance collected in escrow
    #[arg(long)]
    pub insurance: Option<Decimal>,

    /// Number of periods to report (defaults to the full term)
    #[arg(long)]
    pub periods: Option<u32>,

    /// Print only the summary, without the period rows
    #[arg(long)]
    pub summary_only: bool,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let amort_input: AmortizationInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let principal = args
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let pmi_rate = args.pmi_rate.unwrap_or(Decimal::ZERO);
        let property_value = match args.property_value {
            Some(v) => v,
            None if pmi_rate > Decimal::ZERO => {
                return Err("--property-value is required when --pmi-rate is set".into())
            }
            None => principal,
        };
        AmortizationInput {
            loan: LoanTerms {
                principal,
                annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
                term_years: args.term_years,
                frequency: parse_frequency(&args.frequency)?,
                extra_payment: args.extra.unwrap_or(Decimal::ZERO),
                pmi_rate,
                pmi_ltv_threshold: PMI_LTV_THRESHOLD,
                property_value,
            },
            escrow: EscrowItems {
                annual_property_tax: args.property_tax.unwrap_or(Decimal::ZERO),
                annual_insurance: args.insurance.unwrap_or(Decimal::ZERO),
                annual_hoa: Decimal::ZERO,
            },
            analysis_periods: args.periods,
        }
    };

    let result = amortization::amortize(&amort_input)?;
    let mut value = serde_json::to_value(result)?;
    if args.summary_only {
        if let Some(summary) = value.pointer("/result/summary").cloned() {
            value["result"] = summary;
        }
    }
    Ok(value)
}

fn parse_frequency(s: &str) -> Result<PaymentFrequency, Box<dyn std::error::Error>> {
    match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
        "monthly" => Ok(PaymentFrequency::Monthly),
        "biweekly" => Ok(PaymentFrequency::BiWeekly),
        "weekly" => Ok(PaymentFrequency::Weekly),
        other => Err(format!("unknown payment frequency '{}'", other).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frequency_aliases() {
        assert_eq!(parse_frequency("Bi-Weekly").unwrap(), PaymentFrequency::BiWeekly);
        assert_eq!(parse_frequency("bi_weekly").unwrap(), PaymentFrequency::BiWeekly);
        assert_eq!(parse_frequency("monthly").unwrap(), PaymentFrequency::Monthly);
        assert!(parse_frequency("quarterly").is_err());
    }
}
