use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::parameters::{validate_input, PropertyInput};
use crate::financing::amortization::{loan_to_value, pmi_removal_year, project_loan_years, LoanYear};
use crate::income::appreciation::{effective_appreciation_rate, value_at_year};
use crate::income::rental::rent_at_year;
use crate::operating_costs::cost_growth::{project_costs, BaseCosts, OperatingCosts};
use crate::tax::deductions::{building_value, compute_tax_benefits, depreciation_for_year};
use crate::tax::sale::{estimate_sale_tax, SaleEvent, SaleTaxEstimate};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Year};
use crate::PropertyFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One fully populated year of the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyProjection {
    pub year: Year,
    pub property_value: Money,
    /// Loan balance at the end of the year
    pub loan_balance: Money,
    /// Property value less loan balance; negative when under water
    pub equity: Money,
    pub loan_to_value: Rate,

    // --- Income ---
    pub monthly_rent: Money,
    pub gross_rental_income: Money,
    pub vacancy_adjusted_income: Money,
    /// Rent after vacancy and management
    pub net_rental_income: Money,

    // --- Debt service ---
    /// Principal and interest paid; zero once the loan was retired before the year began
    pub mortgage_payment: Money,
    pub principal_paid: Money,
    pub interest_paid: Money,

    // --- Costs ---
    pub operating_costs: OperatingCosts,

    // --- Tax ---
    pub interest_tax_benefit: Money,
    pub depreciation: Money,
    pub depreciation_benefit: Money,
    pub taxable_rental_income: Money,
    pub qbi_deduction: Money,
    pub qbi_benefit: Money,
    pub total_tax_benefit: Money,

    // --- Cash flow ---
    /// Net rent less mortgage payment and operating costs
    pub pre_tax_cash_flow: Money,
    /// Pre-tax cash flow plus total tax benefit
    pub net_cash_flow: Money,
    pub cumulative_cash_flow: Money,
    pub cumulative_depreciation: Money,
    pub cash_on_cash: Rate,

    // --- Hypothetical sale at year end ---
    pub sale_price: Money,
    pub selling_costs: Money,
    /// Sale price less selling costs and loan payoff
    pub net_sale_proceeds: Money,
    /// Cumulative cash flow + net sale proceeds - total initial investment
    pub total_profit_if_sold: Money,
    pub sale_tax: SaleTaxEstimate,
    pub after_tax_sale_proceeds: Money,
    pub after_tax_profit_if_sold: Money,
}

/// Loan and investment facts shared by every year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionContext {
    pub loan_amount: Money,
    pub payment_per_period: Money,
    pub periods_per_year: u32,
    pub total_initial_investment: Money,
    pub starting_value: Money,
    pub building_value: Money,
    pub pmi_removal_year: Option<Year>,
    pub loan_payoff_year: Option<Year>,
}

/// Complete year-indexed ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub context: ProjectionContext,
    pub years: Vec<YearlyProjection>,
}

impl ProjectionOutput {
    pub fn final_year(&self) -> Option<&YearlyProjection> {
        self.years.last()
    }

    pub fn year(&self, year: Year) -> Option<&YearlyProjection> {
        year.checked_sub(1).and_then(|i| self.years.get(i as usize))
    }

    pub fn net_cash_flows(&self) -> Vec<Money> {
        self.years.iter().map(|y| y.net_cash_flow).collect()
    }
}

/// State carried from one year to the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoldState {
    pub cumulative_cash_flow: Money,
    /// Loan balance at the end of the previous year (the start of this one)
    pub prior_end_balance: Money,
    pub cumulative_depreciation: Money,
}

/// Depreciation history of a property that is already owned when the
/// projection starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DepreciationCarryover {
    /// Depreciable basis from the original purchase and improvements
    pub building_value: Money,
    /// Depreciation claimed before year one
    pub already_taken: Money,
}

/// Everything derived once from the input before the year loop.
#[derive(Debug, Clone)]
pub struct ProjectionPlan<'a> {
    pub input: &'a PropertyInput,
    pub loan_years: Vec<LoanYear>,
    pub base_costs: BaseCosts,
    pub context: ProjectionContext,
    /// Depreciation claimed before year one
    pub prior_depreciation: Money,
}

impl<'a> ProjectionPlan<'a> {
    pub fn new(input: &'a PropertyInput) -> Self {
        let years = input.holding_period_years;
        let loan = input.loan_terms();
        let loan_years = project_loan_years(&loan, years);

        let loan_payoff_year = if loan.principal > Decimal::ZERO {
            loan_years
                .iter()
                .find(|y| y.start_balance > Decimal::ZERO && y.end_balance.is_zero())
                .map(|y| y.year)
        } else {
            None
        };

        let context = ProjectionContext {
            loan_amount: loan.principal,
            payment_per_period: loan.payment(),
            periods_per_year: loan.periods_per_year(),
            total_initial_investment: input.total_initial_investment(),
            starting_value: input.base_value(),
            building_value: building_value(
                input.purchase_price,
                input.capital_improvements(),
                &input.tax,
            ),
            pmi_removal_year: pmi_removal_year(&loan, years.max(loan.term_years)),
            loan_payoff_year,
        };

        Self {
            input,
            loan_years,
            base_costs: input.base_costs_with_pmi(),
            context,
            prior_depreciation: Decimal::ZERO,
        }
    }

    /// Depreciate from an earlier basis and count what was already claimed
    /// against it.
    pub fn with_carryover(mut self, carryover: DepreciationCarryover) -> Self {
        self.context.building_value = carryover.building_value;
        self.prior_depreciation = carryover.already_taken;
        self
    }

    /// State before year one.
    pub fn initial_state(&self) -> FoldState {
        FoldState {
            cumulative_cash_flow: Decimal::ZERO,
            prior_end_balance: self.context.loan_amount,
            cumulative_depreciation: self.prior_depreciation,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate the assumptions and build the year-by-year projection.
pub fn build_projection(
    input: &PropertyInput,
) -> PropertyFinanceResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input, &mut warnings)?;
    let output = project(input);
    projection_warnings(&output, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Yearly property projection (amortisation, cost growth, rent, tax, hypothetical sale)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Build the projection for an already validated input.
///
/// Years are folded in ascending order; each year depends on the prior
/// year's cumulative cash flow, loan balance and depreciation.
pub fn project(input: &PropertyInput) -> ProjectionOutput {
    run_plan(ProjectionPlan::new(input))
}

/// Build the projection for a property bought earlier, continuing its
/// depreciation schedule. `cumulative_depreciation` on every row includes
/// the carried amount, and yearly depreciation stops at the carried basis.
pub fn project_with_carryover(
    input: &PropertyInput,
    carryover: DepreciationCarryover,
) -> ProjectionOutput {
    run_plan(ProjectionPlan::new(input).with_carryover(carryover))
}

fn run_plan(plan: ProjectionPlan<'_>) -> ProjectionOutput {
    let input = plan.input;
    let mut state = plan.initial_state();
    let mut years = Vec::with_capacity(input.holding_period_years as usize);

    for year in 1..=input.holding_period_years {
        let (record, next) = project_year(&plan, year, &state);
        years.push(record);
        state = next;
    }

    ProjectionOutput {
        context: plan.context,
        years,
    }
}

/// Compute one year from the plan and the state carried out of the prior year.
pub fn project_year(plan: &ProjectionPlan<'_>, year: Year, state: &FoldState) -> (YearlyProjection, FoldState) {
    let input = plan.input;
    let initial_investment = plan.context.total_initial_investment;

    // 1. Loan
    let loan_year = plan.loan_years.get((year - 1) as usize);
    let loan_balance = loan_year.map(|l| l.end_balance).unwrap_or(Decimal::ZERO);
    let interest_paid = loan_year.map(|l| l.interest_paid).unwrap_or(Decimal::ZERO);
    let principal_paid = loan_year.map(|l| l.principal_paid).unwrap_or(Decimal::ZERO);
    let mortgage_payment = if state.prior_end_balance > Decimal::ZERO {
        loan_year.map(|l| l.payments_made).unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    // 2. Value
    let property_value = value_at_year(plan.context.starting_value, &input.appreciation, year);
    let equity = property_value - loan_balance;

    // 3. Rent
    let rent = rent_at_year(&input.rental, year, input.renovation.as_ref());

    // 4. Costs
    let appreciation_rate = effective_appreciation_rate(&input.appreciation, year);
    let operating_costs = project_costs(
        &plan.base_costs,
        &input.cost_growth,
        appreciation_rate,
        year,
        plan.context.pmi_removal_year,
    );

    // 5. Tax
    let depreciation_available =
        depreciation_for_year(plan.context.building_value, state.cumulative_depreciation);
    let tax = compute_tax_benefits(
        &input.tax,
        rent.net,
        operating_costs.total,
        interest_paid,
        depreciation_available,
    );
    let cumulative_depreciation = state.cumulative_depreciation + tax.depreciation;

    // 6. Cash flow
    let pre_tax_cash_flow = rent.net - mortgage_payment - operating_costs.total;
    let net_cash_flow = pre_tax_cash_flow + tax.total_tax_benefit;
    let cumulative_cash_flow = state.cumulative_cash_flow + net_cash_flow;
    let cash_on_cash = ratio(net_cash_flow, initial_investment);

    // 7. Hypothetical sale at year end
    let sale_price = property_value;
    let selling_costs = sale_price * input.selling_cost_pct;
    let net_sale_proceeds = sale_price - selling_costs - loan_balance;
    let total_profit_if_sold = cumulative_cash_flow + net_sale_proceeds - initial_investment;

    let sale_tax = estimate_sale_tax(
        &SaleEvent {
            sale_price,
            selling_costs,
            loan_payoff: loan_balance,
            purchase_price: input.purchase_price,
            capital_improvements: input.capital_improvements(),
            depreciation_taken: cumulative_depreciation,
            years_owned: year,
        },
        &input.tax,
    );
    let after_tax_sale_proceeds = sale_tax.after_tax_proceeds;
    let after_tax_profit_if_sold =
        cumulative_cash_flow + after_tax_sale_proceeds - initial_investment;

    let record = YearlyProjection {
        year,
        property_value,
        loan_balance,
        equity,
        loan_to_value: loan_to_value(loan_balance, property_value),
        monthly_rent: rent.monthly_rent,
        gross_rental_income: rent.gross,
        vacancy_adjusted_income: rent.effective,
        net_rental_income: rent.net,
        mortgage_payment,
        principal_paid,
        interest_paid,
        operating_costs,
        interest_tax_benefit: tax.interest_tax_benefit,
        depreciation: tax.depreciation,
        depreciation_benefit: tax.depreciation_benefit,
        taxable_rental_income: tax.taxable_rental_income,
        qbi_deduction: tax.qbi_deduction,
        qbi_benefit: tax.qbi_benefit,
        total_tax_benefit: tax.total_tax_benefit,
        pre_tax_cash_flow,
        net_cash_flow,
        cumulative_cash_flow,
        cumulative_depreciation,
        cash_on_cash,
        sale_price,
        selling_costs,
        net_sale_proceeds,
        total_profit_if_sold,
        sale_tax,
        after_tax_sale_proceeds,
        after_tax_profit_if_sold,
    };

    let next = FoldState {
        cumulative_cash_flow,
        prior_end_balance: loan_balance,
        cumulative_depreciation,
    };

    (record, next)
}

/// numerator / denominator, or zero when the denominator is not positive.
pub(crate) fn ratio(numerator: Money, denominator: Money) -> Decimal {
    if denominator <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

fn projection_warnings(output: &ProjectionOutput, warnings: &mut Vec<String>) {
    let negative_cf: Vec<String> = output
        .years
        .iter()
        .filter(|y| y.net_cash_flow < Decimal::ZERO)
        .map(|y| y.year.to_string())
        .collect();
    if !negative_cf.is_empty() {
        warnings.push(format!(
            "Negative net cash flow in year(s) {}",
            negative_cf.join(", ")
        ));
    }

    if let Some(first) = output.years.iter().find(|y| y.equity < Decimal::ZERO) {
        warnings.push(format!(
            "Equity is negative in year {} (LTV {:.1}%)",
            first.year,
            first.loan_to_value * dec!(100)
        ));
    }

    if let Some(year) = output.context.loan_payoff_year {
        warnings.push(format!("Loan is paid off during year {year}"));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
