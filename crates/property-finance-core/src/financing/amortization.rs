use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PropertyFinanceError;
use crate::time_value::{compound_factor, pmt};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Year};
use crate::PropertyFinanceResult;

/// Loan-to-value at or below which borrower-paid PMI is cancelled.
pub const PMI_LTV_THRESHOLD: Rate = dec!(0.80);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How often the borrower makes a payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    BiWeekly,
    Weekly,
}

impl PaymentFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::BiWeekly => 26,
            PaymentFrequency::Weekly => 52,
        }
    }
}

fn default_pmi_threshold() -> Rate {
    PMI_LTV_THRESHOLD
}

/// Fixed-rate loan terms. A zero principal models a cash purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Amount borrowed
    pub principal: Money,
    /// Annual nominal interest rate (0.065 = 6.5%)
    pub annual_rate: Rate,
    /// Amortisation term in years
    pub term_years: u32,
    /// Payment frequency
    #[serde(default)]
    pub frequency: PaymentFrequency,
    /// Additional principal paid every period
    #[serde(default)]
    pub extra_payment: Money,
    /// Annual PMI premium as a fraction of the loan balance
    #[serde(default)]
    pub pmi_rate: Rate,
    /// LTV at which PMI stops
    #[serde(default = "default_pmi_threshold")]
    pub pmi_ltv_threshold: Rate,
    /// Property value used as the LTV denominator
    pub property_value: Money,
}

impl LoanTerms {
    pub fn periods_per_year(&self) -> u32 {
        self.frequency.periods_per_year()
    }

    pub fn periodic_rate(&self) -> Rate {
        self.annual_rate / Decimal::from(self.periods_per_year())
    }

    pub fn total_periods(&self) -> u32 {
        self.term_years * self.periods_per_year()
    }

    /// Level payment per period (principal + interest). Zero for a cash purchase.
    pub fn payment(&self) -> Money {
        periodic_payment(self.principal, self.annual_rate, self.term_years, self.frequency)
    }

    /// Loan-to-value at origination.
    pub fn origination_ltv(&self) -> Rate {
        loan_to_value(self.principal, self.property_value)
    }

    /// PMI applies when a premium is configured and the loan starts above the threshold.
    pub fn requires_pmi(&self) -> bool {
        self.principal > Decimal::ZERO
            && self.pmi_rate > Decimal::ZERO
            && self.origination_ltv() > self.pmi_ltv_threshold
    }
}

/// Annual escrowed items collected alongside the loan payment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EscrowItems {
    #[serde(default)]
    pub annual_property_tax: Money,
    #[serde(default)]
    pub annual_insurance: Money,
    #[serde(default)]
    pub annual_hoa: Money,
}

/// One payment period of the amortisation schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub period: u32,
    pub year: Year,
    pub beginning_balance: Money,
    pub scheduled_payment: Money,
    pub principal_payment: Money,
    pub interest_payment: Money,
    pub extra_payment: Money,
    pub ending_balance: Money,
    pub cumulative_interest: Money,
    pub cumulative_principal: Money,
    pub loan_to_value: Rate,
    pub pmi_payment: Money,
    pub property_tax: Money,
    pub insurance: Money,
    pub hoa: Money,
}

impl PeriodRecord {
    /// Everything leaving the borrower's pocket this period.
    pub fn total_outlay(&self) -> Money {
        self.scheduled_payment
            + self.extra_payment
            + self.pmi_payment
            + self.property_tax
            + self.insurance
            + self.hoa
    }
}

/// Lifetime totals for a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSummary {
    pub payment_per_period: Money,
    pub periods_per_year: u32,
    pub total_payments: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_pmi: Money,
    pub total_escrow: Money,
    pub periods_paid: u32,
    pub payoff_period: Option<u32>,
    pub payoff_year: Option<Year>,
    pub pmi_removal_period: Option<u32>,
    pub pmi_removal_year: Option<Year>,
    /// Interest avoided by the extra payments versus the level-payment schedule
    pub interest_saved: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub periods: Vec<PeriodRecord>,
    pub summary: AmortizationSummary,
}

/// Input for the validated schedule entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub loan: LoanTerms,
    #[serde(default)]
    pub escrow: EscrowItems,
    /// Periods to report; defaults to the full term
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_periods: Option<u32>,
}

/// One year of the whole-horizon loan projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanYear {
    pub year: Year,
    pub start_balance: Money,
    pub end_balance: Money,
    pub interest_paid: Money,
    pub principal_paid: Money,
    /// Scheduled plus extra payments made during the year
    pub payments_made: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Level principal-and-interest payment per period; straight-line at a zero rate.
pub fn periodic_payment(
    principal: Money,
    annual_rate: Rate,
    term_years: u32,
    frequency: PaymentFrequency,
) -> Money {
    if principal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let per_year = frequency.periods_per_year();
    let rate = annual_rate / Decimal::from(per_year);
    pmt(rate, term_years * per_year, principal).unwrap_or(Decimal::ZERO)
}

/// Validate the loan and produce a period-by-period schedule.
pub fn amortize(
    input: &AmortizationInput,
) -> PropertyFinanceResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_loan(&input.loan)?;

    let periods = input
        .analysis_periods
        .unwrap_or_else(|| input.loan.total_periods());
    let schedule = generate_schedule(&input.loan, &input.escrow, periods);

    if input.loan.requires_pmi() {
        match schedule.summary.pmi_removal_year {
            Some(year) => warnings.push(format!(
                "PMI required at origination (LTV {:.1}%), removed in year {year}",
                input.loan.origination_ltv() * dec!(100)
            )),
            None => warnings.push(
                "PMI remains in force for the entire analysis window".into(),
            ),
        }
    }
    if input.loan.principal > Decimal::ZERO && schedule.summary.payoff_period.is_none() {
        warnings.push(format!(
            "Loan is not retired within the {periods} reported periods"
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-rate loan amortisation (level annuity payment)",
        input,
        warnings,
        elapsed,
        schedule,
    ))
}

/// Period-by-period amortisation over `analysis_periods` periods.
///
/// Preconditions: non-negative principal, rate, term and extra payment.
/// Periods after payoff report zero loan activity; escrow still accrues.
pub fn generate_schedule(
    terms: &LoanTerms,
    escrow: &EscrowItems,
    analysis_periods: u32,
) -> AmortizationSchedule {
    let ppy = terms.periods_per_year();
    let ppy_dec = Decimal::from(ppy);
    let total_periods = terms.total_periods();
    let rate = terms.periodic_rate();
    let payment = terms.payment();

    let tax = escrow.annual_property_tax / ppy_dec;
    let insurance = escrow.annual_insurance / ppy_dec;
    let hoa = escrow.annual_hoa / ppy_dec;

    let mut balance = terms.principal.max(Decimal::ZERO);
    let mut pmi_active = terms.requires_pmi();
    let mut cumulative_interest = Decimal::ZERO;
    let mut cumulative_principal = Decimal::ZERO;
    let mut payoff_period = None;
    let mut pmi_removal_period = None;

    let mut periods = Vec::with_capacity(analysis_periods as usize);

    for period in 1..=analysis_periods {
        let year = period_to_year(period, ppy);

        if balance.is_zero() || period > total_periods {
            periods.push(PeriodRecord {
                period,
                year,
                beginning_balance: balance,
                scheduled_payment: Decimal::ZERO,
                principal_payment: Decimal::ZERO,
                interest_payment: Decimal::ZERO,
                extra_payment: Decimal::ZERO,
                ending_balance: balance,
                cumulative_interest,
                cumulative_principal,
                loan_to_value: loan_to_value(balance, terms.property_value),
                pmi_payment: Decimal::ZERO,
                property_tax: tax,
                insurance,
                hoa,
            });
            continue;
        }

        let beginning = balance;
        let interest = beginning * rate;

        // The final scheduled period retires whatever residue rounding left behind.
        let scheduled_principal = if period == total_periods {
            beginning
        } else {
            (payment - interest).max(Decimal::ZERO).min(beginning)
        };
        let extra = terms
            .extra_payment
            .max(Decimal::ZERO)
            .min(beginning - scheduled_principal);

        let ending = (beginning - scheduled_principal - extra).max(Decimal::ZERO);
        let ltv = loan_to_value(ending, terms.property_value);

        let pmi_payment = if pmi_active {
            if ltv <= terms.pmi_ltv_threshold {
                pmi_active = false;
                pmi_removal_period = Some(period);
                Decimal::ZERO
            } else {
                terms.pmi_rate * beginning / ppy_dec
            }
        } else {
            Decimal::ZERO
        };

        cumulative_interest += interest;
        cumulative_principal += scheduled_principal + extra;

        periods.push(PeriodRecord {
            period,
            year,
            beginning_balance: beginning,
            scheduled_payment: scheduled_principal + interest,
            principal_payment: scheduled_principal,
            interest_payment: interest,
            extra_payment: extra,
            ending_balance: ending,
            cumulative_interest,
            cumulative_principal,
            loan_to_value: ltv,
            pmi_payment,
            property_tax: tax,
            insurance,
            hoa,
        });

        balance = ending;
        if balance.is_zero() {
            payoff_period = Some(period);
        }
    }

    let summary = summarize(terms, &periods, payment, payoff_period, pmi_removal_period);
    AmortizationSchedule { periods, summary }
}

/// Closed-form remaining balance after `k` of `total_periods` level payments:
/// B(k) = P * ((1+r)^N - (1+r)^k) / ((1+r)^N - 1).
pub fn balance_after_periods(
    principal: Money,
    periodic_rate: Rate,
    total_periods: u32,
    k: u32,
) -> Money {
    if principal <= Decimal::ZERO || total_periods == 0 || k >= total_periods {
        return Decimal::ZERO;
    }

    if periodic_rate.is_zero() {
        return principal * Decimal::from(total_periods - k) / Decimal::from(total_periods);
    }

    let growth_n = compound_factor(periodic_rate, total_periods);
    let growth_k = compound_factor(periodic_rate, k);
    let denominator = growth_n - Decimal::ONE;
    if denominator.is_zero() {
        return principal;
    }

    (principal * (growth_n - growth_k) / denominator).max(Decimal::ZERO)
}

/// Year-end balances and yearly interest over the whole horizon, computed once.
///
/// Uses the closed-form balance when there are no extra payments; otherwise
/// aggregates the period schedule, since prepayments break the annuity identity.
pub fn project_loan_years(terms: &LoanTerms, years: u32) -> Vec<LoanYear> {
    if terms.principal <= Decimal::ZERO {
        return (1..=years)
            .map(|year| LoanYear {
                year,
                start_balance: Decimal::ZERO,
                end_balance: Decimal::ZERO,
                interest_paid: Decimal::ZERO,
                principal_paid: Decimal::ZERO,
                payments_made: Decimal::ZERO,
            })
            .collect();
    }

    if terms.extra_payment > Decimal::ZERO {
        let ppy = terms.periods_per_year();
        let schedule = generate_schedule(terms, &EscrowItems::default(), years * ppy);
        return aggregate_years(&schedule.periods, terms.principal, years);
    }

    let ppy = terms.periods_per_year();
    let total = terms.total_periods();
    let rate = terms.periodic_rate();
    let payment = terms.payment();

    (1..=years)
        .map(|year| {
            let k_start = (year - 1) * ppy;
            let k_end = (year * ppy).min(total);
            let start_balance = balance_after_periods(terms.principal, rate, total, k_start);
            let end_balance = balance_after_periods(terms.principal, rate, total, k_end);

            let payments_made = if k_start < total {
                payment * Decimal::from(k_end - k_start)
            } else {
                Decimal::ZERO
            };
            let principal_paid = start_balance - end_balance;
            let interest_paid = (payments_made - principal_paid).max(Decimal::ZERO);

            LoanYear {
                year,
                start_balance,
                end_balance,
                interest_paid,
                principal_paid,
                payments_made,
            }
        })
        .collect()
}

/// First year whose schedule cancels PMI, if PMI applies at all.
pub fn pmi_removal_year(terms: &LoanTerms, years: u32) -> Option<Year> {
    if !terms.requires_pmi() {
        return None;
    }
    let schedule = generate_schedule(terms, &EscrowItems::default(), years * terms.periods_per_year());
    schedule.summary.pmi_removal_year
}

/// Loan balance divided by property value; zero when the value is unknown.
pub fn loan_to_value(balance: Money, property_value: Money) -> Rate {
    if property_value <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        balance / property_value
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn period_to_year(period: u32, periods_per_year: u32) -> Year {
    (period - 1) / periods_per_year + 1
}

fn summarize(
    terms: &LoanTerms,
    periods: &[PeriodRecord],
    payment: Money,
    payoff_period: Option<u32>,
    pmi_removal_period: Option<u32>,
) -> AmortizationSummary {
    let ppy = terms.periods_per_year();
    let mut total_payments = Decimal::ZERO;
    let mut total_pmi = Decimal::ZERO;
    let mut total_escrow = Decimal::ZERO;
    let mut periods_paid = 0u32;

    for p in periods {
        total_payments += p.scheduled_payment + p.extra_payment;
        total_pmi += p.pmi_payment;
        total_escrow += p.property_tax + p.insurance + p.hoa;
        if p.scheduled_payment > Decimal::ZERO {
            periods_paid += 1;
        }
    }

    let (total_interest, total_principal) = periods
        .last()
        .map(|p| (p.cumulative_interest, p.cumulative_principal))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO));

    // Level-payment lifetime interest only makes sense once the loan is retired.
    let interest_saved = if terms.extra_payment > Decimal::ZERO && payoff_period.is_some() {
        let baseline = payment * Decimal::from(terms.total_periods()) - terms.principal;
        (baseline - total_interest).max(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    AmortizationSummary {
        payment_per_period: payment,
        periods_per_year: ppy,
        total_payments,
        total_interest,
        total_principal,
        total_pmi,
        total_escrow,
        periods_paid,
        payoff_period,
        payoff_year: payoff_period.map(|p| period_to_year(p, ppy)),
        pmi_removal_period,
        pmi_removal_year: pmi_removal_period.map(|p| period_to_year(p, ppy)),
        interest_saved,
    }
}

fn aggregate_years(periods: &[PeriodRecord], principal: Money, years: u32) -> Vec<LoanYear> {
    let mut out = Vec::with_capacity(years as usize);
    let mut start_balance = principal;

    for year in 1..=years {
        let mut interest_paid = Decimal::ZERO;
        let mut principal_paid = Decimal::ZERO;
        let mut payments_made = Decimal::ZERO;
        let mut end_balance = start_balance;

        for p in periods.iter().filter(|p| p.year == year) {
            interest_paid += p.interest_payment;
            principal_paid += p.principal_payment + p.extra_payment;
            payments_made += p.scheduled_payment + p.extra_payment;
            end_balance = p.ending_balance;
        }

        out.push(LoanYear {
            year,
            start_balance,
            end_balance,
            interest_paid,
            principal_paid,
            payments_made,
        });
        start_balance = end_balance;
    }

    out
}

fn validate_loan(loan: &LoanTerms) -> PropertyFinanceResult<()> {
    if loan.principal < Decimal::ZERO {
        return Err(PropertyFinanceError::InvalidInput {
            field: "principal".into(),
            reason: "Loan principal cannot be negative".into(),
        });
    }
    if loan.annual_rate < Decimal::ZERO {
        return Err(PropertyFinanceError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if loan.principal > Decimal::ZERO && loan.term_years == 0 {
        return Err(PropertyFinanceError::InvalidInput {
            field: "term_years".into(),
            reason: "A financed purchase needs a term of at least 1 year".into(),
        });
    }
    if loan.extra_payment < Decimal::ZERO {
        return Err(PropertyFinanceError::InvalidInput {
            field: "extra_payment".into(),
            reason: "Extra payment cannot be negative".into(),
        });
    }
    if loan.pmi_rate < Decimal::ZERO {
        return Err(PropertyFinanceError::InvalidInput {
            field: "pmi_rate".into(),
            reason: "PMI rate cannot be negative".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
