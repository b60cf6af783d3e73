use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::comparison::{compare, AlternativeComparison};
use super::metrics::{
    annualized_roi, average_cash_on_cash, equity_multiple, grade, irr_cash_flows,
    irr_with_warning, total_roi, InvestmentGrade,
};
use crate::projection::parameters::{validate_input, PropertyInput};
use crate::projection::yearly::{project, ProjectionOutput, YearlyProjection};
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate, Year};
use crate::PropertyFinanceResult;

/// The full projection reduced to headline metrics and a grade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentSummary {
    pub property_name: String,
    pub holding_period_years: u32,
    pub total_initial_investment: Money,
    pub loan_amount: Money,
    pub payment_per_period: Money,
    pub irr: Rate,
    /// Profit if sold at the end of the holding period
    pub total_profit: Money,
    pub after_tax_total_profit: Money,
    pub total_roi: Rate,
    pub annualized_roi: Rate,
    pub equity_multiple: Multiple,
    pub year_one_cash_on_cash: Rate,
    pub average_cash_on_cash: Rate,
    pub final_equity: Money,
    pub pmi_removal_year: Option<Year>,
    pub loan_payoff_year: Option<Year>,
    /// First year a sale would return the initial investment
    pub break_even_year: Option<Year>,
    pub comparison: AlternativeComparison,
    pub grade: InvestmentGrade,
    pub years: Vec<YearlyProjection>,
}

/// Validate, project and summarise a property investment.
pub fn analyze_investment(
    input: &PropertyInput,
) -> PropertyFinanceResult<ComputationOutput<InvestmentSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input, &mut warnings)?;
    let projection = project(input);
    let summary = summarize(input, projection, &mut warnings);

    if summary.comparison.outperformance < Decimal::ZERO {
        warnings.push(format!(
            "Property trails a {:.1}% benchmark by ${:.0}",
            input.alternative_return * dec!(100),
            summary.comparison.outperformance.abs()
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Yearly projection reduced to IRR, ROI, equity multiple and a 100-point grade vs a benchmark",
        input,
        warnings,
        elapsed,
        summary,
    ))
}

/// Reduce an already built projection to the summary metrics.
pub fn summarize(
    input: &PropertyInput,
    projection: ProjectionOutput,
    warnings: &mut Vec<String>,
) -> InvestmentSummary {
    let ctx = &projection.context;
    let initial = ctx.total_initial_investment;
    let years = input.holding_period_years;

    let (total_profit, after_tax_total_profit, final_equity) = projection
        .final_year()
        .map(|y| (y.total_profit_if_sold, y.after_tax_profit_if_sold, y.equity))
        .unwrap_or_default();

    let flows = irr_cash_flows(initial, &projection.years);
    let irr = irr_with_warning(&flows, warnings);

    let roi = total_roi(total_profit, initial);
    let annualized = annualized_roi(roi, years, initial);
    let multiple = equity_multiple(total_profit, initial);

    let comparison = compare(
        initial,
        &projection.net_cash_flows(),
        total_profit,
        input.alternative_return,
        years,
    );
    let grade = grade(irr, multiple, comparison.outperformance, input.alternative_return);

    let break_even_year = projection
        .years
        .iter()
        .find(|y| y.total_profit_if_sold >= Decimal::ZERO)
        .map(|y| y.year);

    InvestmentSummary {
        property_name: input.property_name.clone(),
        holding_period_years: years,
        total_initial_investment: initial,
        loan_amount: ctx.loan_amount,
        payment_per_period: ctx.payment_per_period,
        irr,
        total_profit,
        after_tax_total_profit,
        total_roi: roi,
        annualized_roi: annualized,
        equity_multiple: multiple,
        year_one_cash_on_cash: projection
            .years
            .first()
            .map(|y| y.cash_on_cash)
            .unwrap_or_default(),
        average_cash_on_cash: average_cash_on_cash(&projection.years, initial),
        final_equity,
        pmi_removal_year: ctx.pmi_removal_year,
        loan_payoff_year: ctx.loan_payoff_year,
        break_even_year,
        comparison,
        grade,
        years: projection.years,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financing::amortization::PaymentFrequency;
    use crate::income::appreciation::AppreciationPolicy;
    use crate::income::rental::RentalAssumptions;
    use crate::operating_costs::cost_growth::{BaseCosts, CostGrowthPolicy};
    use crate::projection::parameters::FinancingTerms;
    use crate::tax::TaxTreatment;

    fn sample_input() -> PropertyInput {
        PropertyInput {
            property_name: "Sample".into(),
            purchase_price: dec!(400000),
            property_value: None,
            down_payment: dec!(80000),
            closing_costs: Decimal::ZERO,
            financing: FinancingTerms {
                loan_amount: None,
                annual_rate: dec!(0.065),
                term_years: 30,
                frequency: PaymentFrequency::Monthly,
                extra_payment: Decimal::ZERO,
                pmi_rate: Decimal::ZERO,
            },
            base_costs: BaseCosts {
                property_tax: dec!(4000),
                insurance: dec!(1200),
                maintenance: dec!(2000),
                ..Default::default()
            },
            cost_growth: CostGrowthPolicy::with_inflation(dec!(0.03), dec!(0.01)),
            rental: RentalAssumptions {
                monthly_rent: dec!(2500),
                annual_rent_growth: dec!(0.03),
                vacancy_rate: dec!(0.05),
                management_rate: Decimal::ZERO,
            },
            appreciation: AppreciationPolicy::Fixed { rate: dec!(0.03) },
            renovation: None,
            tax: TaxTreatment::default(),
            holding_period_years: 10,
            selling_cost_pct: dec!(0.06),
            alternative_return: dec!(0.10),
        }
    }

    #[test]
    fn test_summary_ties_to_final_year() {
        let out = analyze_investment(&sample_input()).unwrap();
        let s = &out.result;
        let last = s.years.last().unwrap();
        assert_eq!(s.total_profit, last.total_profit_if_sold);
        assert_eq!(s.final_equity, last.equity);
        assert_eq!(s.total_roi, s.total_profit / dec!(80000));
        assert_eq!(s.equity_multiple, (dec!(80000) + s.total_profit) / dec!(80000));
        assert_eq!(s.comparison.outperformance, s.total_profit - s.comparison.simple_profit);
        assert_eq!(s.grade.outperformance_points > 0, s.comparison.outperformance >= dec!(-5000));
    }

    #[test]
    fn test_irr_within_bounds() {
        let out = analyze_investment(&sample_input()).unwrap();
        assert!(out.result.irr > Decimal::ZERO);
        assert!(out.result.irr < dec!(0.20));
    }

    #[test]
    fn test_break_even_year() {
        let out = analyze_investment(&sample_input()).unwrap();
        let s = &out.result;
        if let Some(year) = s.break_even_year {
            assert!(s.years[(year - 1) as usize].total_profit_if_sold >= Decimal::ZERO);
            for y in s.years.iter().take((year - 1) as usize) {
                assert!(y.total_profit_if_sold < Decimal::ZERO);
            }
        }
    }

    #[test]
    fn test_warns_when_trailing_benchmark() {
        let mut input = sample_input();
        input.alternative_return = dec!(0.50);
        let out = analyze_investment(&input).unwrap();
        assert!(out.result.comparison.outperformance < Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.starts_with("Property trails a 50.0% benchmark")));
    }

    #[test]
    fn test_zero_investment_ratios() {
        let mut input = sample_input();
        input.down_payment = Decimal::ZERO;
        let out = analyze_investment(&input).unwrap();
        let s = &out.result;
        assert_eq!(s.total_initial_investment, Decimal::ZERO);
        assert_eq!(s.total_roi, Decimal::ZERO);
        assert_eq!(s.annualized_roi, Decimal::ZERO);
        assert_eq!(s.equity_multiple, Decimal::ZERO);
        assert_eq!(s.year_one_cash_on_cash, Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("initial investment is zero")));
    }
}
