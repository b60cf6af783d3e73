use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PropertyFinanceError;
use crate::financing::amortization::{LoanTerms, PaymentFrequency, PMI_LTV_THRESHOLD};
use crate::income::appreciation::AppreciationPolicy;
use crate::income::rental::{gross_yield, RenovationContext, RentalAssumptions};
use crate::operating_costs::cost_growth::{BaseCosts, CostCategory, CostGrowthPolicy, GrowthType};
use crate::tax::TaxTreatment;
use crate::types::{Money, Rate};
use crate::PropertyFinanceResult;

/// Maximum analysis horizon accepted by the projection.
pub const MAX_HOLDING_YEARS: u32 = 100;

/// Upper bound on any annual growth, interest or benchmark rate. Together
/// with the horizon cap this keeps compounding inside the Decimal range.
pub const MAX_ANNUAL_RATE: Rate = dec!(0.50);

/// Longest accepted loan term.
pub const MAX_LOAN_TERM_YEARS: u32 = 50;

/// Loan terms for the purchase. The principal defaults to price less down payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingTerms {
    /// Explicit loan amount; overrides purchase price less down payment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<Money>,
    pub annual_rate: Rate,
    pub term_years: u32,
    #[serde(default)]
    pub frequency: PaymentFrequency,
    #[serde(default)]
    pub extra_payment: Money,
    #[serde(default)]
    pub pmi_rate: Rate,
}

/// Complete assumption bundle for one property projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyInput {
    #[serde(default)]
    pub property_name: String,
    /// Price paid; the depreciation and cost basis
    pub purchase_price: Money,
    /// Market value at the start of the analysis; defaults to the purchase price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_value: Option<Money>,
    pub down_payment: Money,
    #[serde(default)]
    pub closing_costs: Money,
    pub financing: FinancingTerms,
    /// Year-one annual operating costs
    #[serde(default)]
    pub base_costs: BaseCosts,
    pub cost_growth: CostGrowthPolicy,
    #[serde(default)]
    pub rental: RentalAssumptions,
    #[serde(default)]
    pub appreciation: AppreciationPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renovation: Option<RenovationContext>,
    #[serde(default)]
    pub tax: TaxTreatment,
    pub holding_period_years: u32,
    /// Selling costs as a share of the sale price
    pub selling_cost_pct: Rate,
    /// Benchmark return for the alternative investment
    pub alternative_return: Rate,
}

impl PropertyInput {
    /// Market value before appreciation, without any renovation uplift.
    pub fn market_value(&self) -> Money {
        self.property_value.unwrap_or(self.purchase_price)
    }

    /// Value that appreciation compounds from.
    pub fn base_value(&self) -> Money {
        self.market_value()
            + self
                .renovation
                .as_ref()
                .map(RenovationContext::value_uplift)
                .unwrap_or(Decimal::ZERO)
    }

    pub fn loan_amount(&self) -> Money {
        self.financing
            .loan_amount
            .unwrap_or(self.purchase_price - self.down_payment)
            .max(Decimal::ZERO)
    }

    pub fn loan_terms(&self) -> LoanTerms {
        LoanTerms {
            principal: self.loan_amount(),
            annual_rate: self.financing.annual_rate,
            term_years: self.financing.term_years,
            frequency: self.financing.frequency,
            extra_payment: self.financing.extra_payment,
            pmi_rate: self.financing.pmi_rate,
            pmi_ltv_threshold: PMI_LTV_THRESHOLD,
            property_value: self.market_value(),
        }
    }

    pub fn capital_improvements(&self) -> Money {
        self.renovation
            .as_ref()
            .map(RenovationContext::capital_cost)
            .unwrap_or(Decimal::ZERO)
    }

    /// Cash in at closing: down payment, closing costs and renovation spend.
    pub fn total_initial_investment(&self) -> Money {
        self.down_payment + self.closing_costs + self.capital_improvements()
    }

    /// Year-one costs with the PMI premium filled in from the loan when not given.
    pub fn base_costs_with_pmi(&self) -> BaseCosts {
        let loan = self.loan_terms();
        let mut costs = self.base_costs.clone();
        costs.pmi = if !loan.requires_pmi() {
            Decimal::ZERO
        } else if costs.pmi > Decimal::ZERO {
            costs.pmi
        } else {
            loan.principal * loan.pmi_rate
        };
        costs
    }
}

/// Reject structurally impossible bundles and flag unusual ones.
pub fn validate_input(input: &PropertyInput, warnings: &mut Vec<String>) -> PropertyFinanceResult<()> {
    if input.holding_period_years < 1 {
        return Err(PropertyFinanceError::InvalidInput {
            field: "holding_period_years".into(),
            reason: "Holding period must be at least 1 year".into(),
        });
    }
    if input.holding_period_years > MAX_HOLDING_YEARS {
        return Err(PropertyFinanceError::InvalidInput {
            field: "holding_period_years".into(),
            reason: format!("Holding period cannot exceed {MAX_HOLDING_YEARS} years"),
        });
    }
    if input.purchase_price < Decimal::ZERO {
        return Err(PropertyFinanceError::InvalidInput {
            field: "purchase_price".into(),
            reason: "Purchase price cannot be negative".into(),
        });
    }
    if input.market_value() < Decimal::ZERO {
        return Err(PropertyFinanceError::InvalidInput {
            field: "property_value".into(),
            reason: "Property value cannot be negative".into(),
        });
    }
    if input.down_payment < Decimal::ZERO {
        return Err(PropertyFinanceError::InvalidInput {
            field: "down_payment".into(),
            reason: "Down payment cannot be negative".into(),
        });
    }
    if input.financing.loan_amount.is_none() && input.down_payment > input.purchase_price {
        return Err(PropertyFinanceError::InvalidInput {
            field: "down_payment".into(),
            reason: "Down payment cannot exceed the purchase price".into(),
        });
    }
    if input.financing.annual_rate < Decimal::ZERO {
        return Err(PropertyFinanceError::InvalidInput {
            field: "financing.annual_rate".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    check_annual_rate("financing.annual_rate", input.financing.annual_rate)?;
    if input.financing.term_years > MAX_LOAN_TERM_YEARS {
        return Err(PropertyFinanceError::InvalidInput {
            field: "financing.term_years".into(),
            reason: format!("Loan term cannot exceed {MAX_LOAN_TERM_YEARS} years"),
        });
    }
    if input.loan_amount() > Decimal::ZERO && input.financing.term_years == 0 {
        return Err(PropertyFinanceError::InvalidInput {
            field: "financing.term_years".into(),
            reason: "A financed purchase needs a loan term of at least 1 year".into(),
        });
    }
    if input.financing.extra_payment < Decimal::ZERO {
        return Err(PropertyFinanceError::InvalidInput {
            field: "financing.extra_payment".into(),
            reason: "Extra payment cannot be negative".into(),
        });
    }
    if input.rental.vacancy_rate < Decimal::ZERO || input.rental.vacancy_rate >= Decimal::ONE {
        return Err(PropertyFinanceError::InvalidInput {
            field: "rental.vacancy_rate".into(),
            reason: "Vacancy rate must be between 0 and 1 (exclusive upper)".into(),
        });
    }
    if input.rental.management_rate < Decimal::ZERO || input.rental.management_rate >= Decimal::ONE {
        return Err(PropertyFinanceError::InvalidInput {
            field: "rental.management_rate".into(),
            reason: "Management rate must be between 0 and 1 (exclusive upper)".into(),
        });
    }
    if input.selling_cost_pct < Decimal::ZERO || input.selling_cost_pct >= Decimal::ONE {
        return Err(PropertyFinanceError::InvalidInput {
            field: "selling_cost_pct".into(),
            reason: "Selling cost must be between 0 and 1 (exclusive upper)".into(),
        });
    }
    check_annual_rate("alternative_return", input.alternative_return)?;
    check_annual_rate("rental.annual_rent_growth", input.rental.annual_rent_growth)?;
    match &input.appreciation {
        AppreciationPolicy::Fixed { rate } => check_annual_rate("appreciation.rate", *rate)?,
        AppreciationPolicy::Schedule { rates } => {
            for rate in rates {
                check_annual_rate("appreciation.rates", *rate)?;
            }
        }
    }
    let growth = &input.cost_growth;
    check_annual_rate("cost_growth.general_inflation", growth.general_inflation)?;
    check_annual_rate(
        "cost_growth.inflation_premium",
        growth.general_inflation + growth.inflation_premium,
    )?;
    for category in CostCategory::ALL {
        let policy = growth.policy_for(category);
        if policy.growth_type == GrowthType::Custom {
            check_annual_rate("cost_growth.custom_rate", policy.custom_rate)?;
        }
    }
    if let Some(reno) = &input.renovation {
        if reno.duration_months > 12 {
            return Err(PropertyFinanceError::InvalidInput {
                field: "renovation.duration_months".into(),
                reason: "Renovation must complete within the first year (12 months)".into(),
            });
        }
        if reno.cost < Decimal::ZERO {
            return Err(PropertyFinanceError::InvalidInput {
                field: "renovation.cost".into(),
                reason: "Renovation cost cannot be negative".into(),
            });
        }
    }

    // --- Warnings for unusual assumptions ---
    let loan = input.loan_terms();
    let ltv = loan.origination_ltv();
    if ltv > PMI_LTV_THRESHOLD && input.financing.pmi_rate.is_zero() {
        warnings.push(format!(
            "LTV of {:.1}% exceeds 80% but no PMI rate was given",
            ltv * dec!(100)
        ));
    }
    if input.rental.vacancy_rate > dec!(0.15) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15%, above typical market norms",
            input.rental.vacancy_rate * dec!(100)
        ));
    }
    if input.rental.monthly_rent > Decimal::ZERO {
        let yield_ = gross_yield(&input.rental, input.purchase_price);
        if yield_ < dec!(0.04) {
            warnings.push(format!(
                "Gross rental yield {:.2}% is below 4%; rent may not cover carrying costs",
                yield_ * dec!(100)
            ));
        }
    }
    if input.total_initial_investment() <= Decimal::ZERO {
        warnings.push(
            "Total initial investment is zero; return ratios are reported as 0".into(),
        );
    }

    Ok(())
}

/// Rates must lie in (-100%, MAX_ANNUAL_RATE].
pub fn check_annual_rate(field: &str, rate: Rate) -> PropertyFinanceResult<()> {
    if rate <= dec!(-1) || rate > MAX_ANNUAL_RATE {
        return Err(PropertyFinanceError::InvalidInput {
            field: field.into(),
            reason: format!(
                "Rate must be greater than -100% and at most {}%",
                MAX_ANNUAL_RATE * dec!(100)
            ),
        });
    }
    Ok(())
}
