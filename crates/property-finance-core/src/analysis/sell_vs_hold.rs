use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PropertyFinanceError;
use crate::projection::parameters::{
    check_annual_rate, validate_input, PropertyInput, MAX_HOLDING_YEARS,
};
use crate::projection::yearly::{project_with_carryover, DepreciationCarryover, YearlyProjection};
use crate::tax::deductions::{building_value, depreciation_through};
use crate::tax::sale::{estimate_sale_tax, SaleEvent, SaleTaxEstimate};
use crate::tax::{TaxTreatment, DEFAULT_RECAPTURE_RATE};
use crate::time_value::future_value;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Year};
use crate::PropertyFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_recapture_rate() -> Rate {
    DEFAULT_RECAPTURE_RATE
}

/// An owned property and the two paths forward from today.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellVsHoldInput {
    /// Market value less outstanding loan today
    pub current_equity: Money,
    pub current_value: Money,
    pub years_owned: u32,
    /// Original purchase price
    pub original_basis: Money,
    #[serde(default)]
    pub capital_improvements: Money,
    /// Rented out so far; depreciation has been taken and is recaptured on sale
    #[serde(default)]
    pub was_rental: bool,
    /// Depreciation claimed to date; derived from the basis and years owned when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciation_taken: Option<Money>,
    pub capital_gains_rate: Rate,
    #[serde(default = "default_recapture_rate")]
    pub depreciation_recapture_rate: Rate,
    pub selling_cost_pct: Rate,
    /// Return earned on the proceeds if sold now
    pub benchmark_rate: Rate,
    pub horizon_years: u32,
    /// The hold scenario projected from today (loan = today's balance)
    pub hold: PropertyInput,
}

/// Proceeds from selling today.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellNowPosition {
    pub selling_costs: Money,
    /// Equity less selling costs
    pub net_equity: Money,
    pub sale_tax: SaleTaxEstimate,
    /// Cash left to invest after tax
    pub after_tax_balance: Money,
}

/// One year of the sell-now vs hold comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellVsHoldYear {
    pub year: Year,
    /// Sale proceeds invested at the benchmark, before tax on the gains
    pub sell_value: Money,
    pub sell_after_tax_value: Money,
    /// Net sale proceeds plus cumulative cash flow if held to this year
    pub hold_value: Money,
    pub hold_after_tax_value: Money,
    pub hold_sale_tax: Money,
    /// Depreciation claimed from the original purchase through this year
    pub hold_depreciation_taken: Money,
    /// hold - sell, before tax
    pub pre_tax_difference: Money,
    /// hold - sell, after tax
    pub difference: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Hold,
    Sell,
    Indifferent,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Recommendation::Hold => "hold",
            Recommendation::Sell => "sell",
            Recommendation::Indifferent => "indifferent",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellVsHoldOutput {
    pub sell_now: SellNowPosition,
    pub years: Vec<SellVsHoldYear>,
    /// First year the after-tax leader changes; `None` when it never does
    pub crossover_year: Option<Year>,
    pub final_difference: Money,
    pub recommendation: Recommendation,
    pub rationale: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compare selling today and investing the after-tax proceeds at the
/// benchmark against holding the property for the horizon.
pub fn analyze_sell_vs_hold(
    input: &SellVsHoldInput,
) -> PropertyFinanceResult<ComputationOutput<SellVsHoldOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_sell_vs_hold(input)?;

    let mut hold = input.hold.clone();
    hold.holding_period_years = input.horizon_years;
    // A rental keeps depreciating while it is held
    if input.was_rental {
        hold.tax.depreciation_enabled = true;
    }
    validate_input(&hold, &mut warnings)?;

    let treatment = sale_treatment(input);
    let prior_depreciation = prior_depreciation(input, &treatment);

    // --- Sell now ---
    let sell_now = sell_now_position(input, &treatment, prior_depreciation);
    if input.current_equity < Decimal::ZERO {
        warnings.push(format!(
            "Property is under water today: equity ${:.0}",
            input.current_equity
        ));
    }
    if sell_now.after_tax_balance < Decimal::ZERO {
        warnings.push(
            "Selling now leaves a cash shortfall after selling costs and tax".into(),
        );
    }

    // --- Hold ---
    // Depreciation continues on the original basis, net of what was claimed.
    let carryover = DepreciationCarryover {
        building_value: building_value(
            input.original_basis,
            input.capital_improvements + hold.capital_improvements(),
            &treatment,
        ),
        already_taken: prior_depreciation,
    };
    let projection = project_with_carryover(&hold, carryover);
    let years: Vec<SellVsHoldYear> = projection
        .years
        .iter()
        .map(|row| {
            compare_year(
                input,
                &treatment,
                sell_now.after_tax_balance,
                hold.capital_improvements(),
                row,
            )
        })
        .collect();

    let crossover_year = find_crossover(&years);
    let final_difference = years.last().map(|y| y.difference).unwrap_or(Decimal::ZERO);
    let recommendation = recommend(final_difference);
    let rationale = rationale(recommendation, final_difference, input.horizon_years, crossover_year);

    let output = SellVsHoldOutput {
        sell_now,
        years,
        crossover_year,
        final_difference,
        recommendation,
        rationale,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Sell now and invest at the benchmark vs hold, after selling costs, capital gains and depreciation recapture",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// First year whose after-tax leader differs from the prior year's.
pub fn find_crossover(years: &[SellVsHoldYear]) -> Option<Year> {
    years
        .windows(2)
        .find(|w| (w[0].difference > Decimal::ZERO) != (w[1].difference > Decimal::ZERO))
        .map(|w| w[1].year)
}

/// Recommendation from the sign of the final-year after-tax difference.
pub fn recommend(final_difference: Money) -> Recommendation {
    if final_difference > Decimal::ZERO {
        Recommendation::Hold
    } else if final_difference < Decimal::ZERO {
        Recommendation::Sell
    } else {
        Recommendation::Indifferent
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_sell_vs_hold(input: &SellVsHoldInput) -> PropertyFinanceResult<()> {
    if input.horizon_years < 1 || input.horizon_years > MAX_HOLDING_YEARS {
        return Err(PropertyFinanceError::InvalidInput {
            field: "horizon_years".into(),
            reason: format!("Horizon must be between 1 and {MAX_HOLDING_YEARS} years"),
        });
    }
    if input.current_value < Decimal::ZERO {
        return Err(PropertyFinanceError::InvalidInput {
            field: "current_value".into(),
            reason: "Current value cannot be negative".into(),
        });
    }
    if input.current_equity > input.current_value {
        return Err(PropertyFinanceError::InvalidInput {
            field: "current_equity".into(),
            reason: "Equity cannot exceed the current value".into(),
        });
    }
    if input.selling_cost_pct < Decimal::ZERO || input.selling_cost_pct >= Decimal::ONE {
        return Err(PropertyFinanceError::InvalidInput {
            field: "selling_cost_pct".into(),
            reason: "Selling cost must be between 0 and 1 (exclusive upper)".into(),
        });
    }
    check_annual_rate("benchmark_rate", input.benchmark_rate)?;
    if input.capital_gains_rate < Decimal::ZERO || input.capital_gains_rate > Decimal::ONE {
        return Err(PropertyFinanceError::InvalidInput {
            field: "capital_gains_rate".into(),
            reason: "Capital gains rate must be between 0 and 1".into(),
        });
    }
    Ok(())
}

fn sale_treatment(input: &SellVsHoldInput) -> TaxTreatment {
    TaxTreatment {
        capital_gains_rate: input.capital_gains_rate,
        depreciation_recapture_rate: input.depreciation_recapture_rate,
        ..input.hold.tax.clone()
    }
}

fn prior_depreciation(input: &SellVsHoldInput, treatment: &TaxTreatment) -> Money {
    if !input.was_rental {
        return Decimal::ZERO;
    }
    input.depreciation_taken.unwrap_or_else(|| {
        let basis = building_value(input.original_basis, input.capital_improvements, treatment);
        depreciation_through(basis, input.years_owned)
    })
}

fn sell_now_position(
    input: &SellVsHoldInput,
    treatment: &TaxTreatment,
    prior_depreciation: Money,
) -> SellNowPosition {
    let selling_costs = input.current_value * input.selling_cost_pct;
    let net_equity = input.current_equity - selling_costs;
    let sale_tax = estimate_sale_tax(
        &SaleEvent {
            sale_price: input.current_value,
            selling_costs,
            loan_payoff: input.current_value - input.current_equity,
            purchase_price: input.original_basis,
            capital_improvements: input.capital_improvements,
            depreciation_taken: prior_depreciation,
            years_owned: input.years_owned,
        },
        treatment,
    );
    SellNowPosition {
        selling_costs,
        net_equity,
        after_tax_balance: net_equity - sale_tax.total_tax,
        sale_tax,
    }
}

fn compare_year(
    input: &SellVsHoldInput,
    treatment: &TaxTreatment,
    sell_start: Money,
    hold_improvements: Money,
    row: &YearlyProjection,
) -> SellVsHoldYear {
    // Sell path: proceeds compound at the benchmark; only the gain above the
    // after-tax starting balance is taxed again.
    let sell_value = future_value(sell_start, input.benchmark_rate, row.year);
    let investment_gain = (sell_value - sell_start).max(Decimal::ZERO);
    let sell_after_tax_value = sell_value - investment_gain * input.capital_gains_rate;

    // Hold path: sale at year end with the full ownership history. The
    // projection's cumulative depreciation already includes the carryover.
    let depreciation_taken = row.cumulative_depreciation;
    let hold_tax = estimate_sale_tax(
        &SaleEvent {
            sale_price: row.sale_price,
            selling_costs: row.selling_costs,
            loan_payoff: row.loan_balance,
            purchase_price: input.original_basis,
            capital_improvements: input.capital_improvements + hold_improvements,
            depreciation_taken,
            years_owned: input.years_owned + row.year,
        },
        treatment,
    );
    let hold_value = row.net_sale_proceeds + row.cumulative_cash_flow;
    let hold_after_tax_value = hold_tax.after_tax_proceeds + row.cumulative_cash_flow;

    SellVsHoldYear {
        year: row.year,
        sell_value,
        sell_after_tax_value,
        hold_value,
        hold_after_tax_value,
        hold_sale_tax: hold_tax.total_tax,
        hold_depreciation_taken: depreciation_taken,
        pre_tax_difference: hold_value - sell_value,
        difference: hold_after_tax_value - sell_after_tax_value,
    }
}

fn rationale(
    recommendation: Recommendation,
    final_difference: Money,
    horizon: u32,
    crossover: Option<Year>,
) -> String {
    let crossover_note = match crossover {
        Some(year) => format!("; the after-tax leader changes in year {year}"),
        None => "; no crossover within the horizon".to_string(),
    };
    match recommendation {
        Recommendation::Hold => format!(
            "Hold: after {horizon} years holding is ahead by ${:.0} after tax{crossover_note}",
            final_difference
        ),
        Recommendation::Sell => format!(
            "Sell: after {horizon} years selling now is ahead by ${:.0} after tax{crossover_note}",
            final_difference.abs()
        ),
        Recommendation::Indifferent => format!(
            "Indifferent: both paths end level after {horizon} years{crossover_note}"
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financing::amortization::PaymentFrequency;
    use crate::income::appreciation::AppreciationPolicy;
    use crate::income::rental::RentalAssumptions;
    use crate::operating_costs::cost_growth::{BaseCosts, CostGrowthPolicy};
    use crate::projection::parameters::FinancingTerms;
    use rust_decimal_macros::dec;

    fn hold_scenario(appreciation: Rate) -> PropertyInput {
        PropertyInput {
            property_name: "Held rental".into(),
            purchase_price: dec!(500000),
            property_value: None,
            down_payment: dec!(200000),
            closing_costs: Decimal::ZERO,
            financing: FinancingTerms {
                loan_amount: Some(dec!(300000)),
                annual_rate: dec!(0.04),
                term_years: 25,
                frequency: PaymentFrequency::Monthly,
                extra_payment: Decimal::ZERO,
                pmi_rate: Decimal::ZERO,
            },
            base_costs: BaseCosts {
                property_tax: dec!(5000),
                insurance: dec!(1500),
                maintenance: dec!(3000),
                ..Default::default()
            },
            cost_growth: CostGrowthPolicy::with_inflation(dec!(0.025), dec!(0.01)),
            rental: RentalAssumptions {
                monthly_rent: dec!(3000),
                annual_rent_growth: dec!(0.03),
                vacancy_rate: dec!(0.05),
                management_rate: Decimal::ZERO,
            },
            appreciation: AppreciationPolicy::Fixed { rate: appreciation },
            renovation: None,
            tax: TaxTreatment::default(),
            holding_period_years: 1,
            selling_cost_pct: dec!(0.06),
            alternative_return: dec!(0.07),
        }
    }

    fn sample_input(appreciation: Rate) -> SellVsHoldInput {
        SellVsHoldInput {
            current_equity: dec!(200000),
            current_value: dec!(500000),
            years_owned: 8,
            original_basis: dec!(350000),
            capital_improvements: Decimal::ZERO,
            was_rental: true,
            depreciation_taken: Some(dec!(80000)),
            capital_gains_rate: dec!(0.15),
            depreciation_recapture_rate: dec!(0.25),
            selling_cost_pct: dec!(0.06),
            benchmark_rate: dec!(0.07),
            horizon_years: 10,
            hold: hold_scenario(appreciation),
        }
    }

    #[test]
    fn test_sell_now_position() {
        let input = sample_input(dec!(0.03));
        let t = sale_treatment(&input);
        let pos = sell_now_position(&input, &t, dec!(80000));
        assert_eq!(pos.selling_costs, dec!(30000));
        assert_eq!(pos.net_equity, dec!(170000));
        // realized 470000 - adjusted basis 270000 = 200000 gain
        assert_eq!(pos.sale_tax.total_gain, dec!(200000));
        // 80000 * 25% + 120000 * 15%
        assert_eq!(pos.sale_tax.total_tax, dec!(38000));
        assert_eq!(pos.after_tax_balance, dec!(132000));
    }

    #[test]
    fn test_horizon_rows_and_final_sign() {
        let out = analyze_sell_vs_hold(&sample_input(dec!(0.03))).unwrap();
        let r = &out.result;
        assert_eq!(r.years.len(), 10);
        assert_eq!(r.final_difference, r.years[9].difference);
        assert_eq!(r.recommendation, recommend(r.final_difference));
    }

    #[test]
    fn test_strong_appreciation_favours_holding() {
        let out = analyze_sell_vs_hold(&sample_input(dec!(0.08))).unwrap();
        assert_eq!(out.result.recommendation, Recommendation::Hold);
        assert!(out.result.rationale.starts_with("Hold"));
    }

    #[test]
    fn test_falling_market_favours_selling() {
        let out = analyze_sell_vs_hold(&sample_input(dec!(-0.05))).unwrap();
        assert_eq!(out.result.recommendation, Recommendation::Sell);
    }

    #[test]
    fn test_sell_path_taxes_only_new_gains() {
        let out = analyze_sell_vs_hold(&sample_input(dec!(0.03))).unwrap();
        let y1 = &out.result.years[0];
        // 132000 * 1.07 = 141240; gain 9240 taxed at 15%
        assert_eq!(y1.sell_value, dec!(141240));
        assert_eq!(y1.sell_after_tax_value, dec!(141240) - dec!(1386));
    }

    #[test]
    fn test_crossover_detection() {
        let row = |year, difference| SellVsHoldYear {
            year,
            sell_value: Decimal::ZERO,
            sell_after_tax_value: Decimal::ZERO,
            hold_value: Decimal::ZERO,
            hold_after_tax_value: Decimal::ZERO,
            hold_sale_tax: Decimal::ZERO,
            hold_depreciation_taken: Decimal::ZERO,
            pre_tax_difference: difference,
            difference,
        };
        let years = vec![row(1, dec!(-500)), row(2, dec!(-100)), row(3, dec!(250)), row(4, dec!(-10))];
        assert_eq!(find_crossover(&years), Some(3));
        let years = vec![row(1, dec!(5)), row(2, dec!(10))];
        assert_eq!(find_crossover(&years), None);
    }

    #[test]
    fn test_derived_prior_depreciation() {
        let mut input = sample_input(dec!(0.03));
        input.depreciation_taken = None;
        let t = sale_treatment(&input);
        // building 350000 * 0.8 = 280000; 8 years of 280000 / 27.5
        let expected = dec!(280000) / dec!(27.5) * dec!(8);
        assert_eq!(prior_depreciation(&input, &t), expected);

        input.was_rental = false;
        assert_eq!(prior_depreciation(&input, &t), Decimal::ZERO);
    }

    #[test]
    fn test_hold_depreciation_capped_at_original_building_basis() {
        let mut input = sample_input(dec!(0.03));
        input.years_owned = 20;
        input.horizon_years = 20;
        input.depreciation_taken = None;
        input.hold.tax.depreciation_enabled = true;
        let out = analyze_sell_vs_hold(&input).unwrap();
        let years = &out.result.years;

        // building 350000 * 0.8 = 280000, fully recovered after 27.5 years
        let building = dec!(280000);
        let annual = building / dec!(27.5);
        assert_eq!(years[0].hold_depreciation_taken, annual * dec!(20) + annual);
        assert!(years.iter().all(|y| y.hold_depreciation_taken <= building));
        assert_eq!(years[19].hold_depreciation_taken, building);
        for pair in years.windows(2) {
            assert!(pair[1].hold_depreciation_taken >= pair[0].hold_depreciation_taken);
        }
    }

    #[test]
    fn test_hold_depreciation_ignores_hold_purchase_price() {
        let mut base = sample_input(dec!(0.03));
        base.hold.property_value = Some(dec!(500000));
        base.hold.purchase_price = dec!(350000);
        let mut pricier = base.clone();
        pricier.hold.purchase_price = dec!(600000);

        let a = analyze_sell_vs_hold(&base).unwrap();
        let b = analyze_sell_vs_hold(&pricier).unwrap();
        assert_eq!(a.result.years, b.result.years);
        // 80000 claimed + 280000 / 27.5 in the first held year
        assert_eq!(
            a.result.years[0].hold_depreciation_taken,
            dec!(80000) + dec!(280000) / dec!(27.5)
        );
    }

    #[test]
    fn test_rental_keeps_depreciating_without_hold_flag() {
        let input = sample_input(dec!(0.03));
        assert!(!input.hold.tax.depreciation_enabled);
        let out = analyze_sell_vs_hold(&input).unwrap();
        let years = &out.result.years;
        assert!(years[0].hold_depreciation_taken > dec!(80000));
        for pair in years.windows(2) {
            assert!(pair[1].hold_depreciation_taken > pair[0].hold_depreciation_taken);
        }

        let mut owner_occupied = input.clone();
        owner_occupied.was_rental = false;
        let out = analyze_sell_vs_hold(&owner_occupied).unwrap();
        assert!(out.result.years.iter().all(|y| y.hold_depreciation_taken.is_zero()));
    }

    #[test]
    fn test_invalid_horizon() {
        let mut input = sample_input(dec!(0.03));
        input.horizon_years = 0;
        assert!(analyze_sell_vs_hold(&input).is_err());
    }
}
