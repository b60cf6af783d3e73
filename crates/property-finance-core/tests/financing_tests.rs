use property_finance_core::financing::amortization::{
    amortize, balance_after_periods, generate_schedule, project_loan_years, AmortizationInput,
    EscrowItems, LoanTerms, PaymentFrequency, PMI_LTV_THRESHOLD,
};
use property_finance_core::income::appreciation::{value_at_year, AppreciationPolicy};
use property_finance_core::operating_costs::cost_growth::{cost_at_year, project_costs, BaseCosts, CostGrowthPolicy};
use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn loan(principal: Decimal, rate: Decimal, years: u32) -> LoanTerms {
    LoanTerms {
        principal,
        annual_rate: rate,
        term_years: years,
        frequency: PaymentFrequency::Monthly,
        extra_payment: Decimal::ZERO,
        pmi_rate: Decimal::ZERO,
        pmi_ltv_threshold: PMI_LTV_THRESHOLD,
        property_value: principal / dec!(0.8),
    }
}

// ===========================================================================
// Amortization
// ===========================================================================

#[test]
fn test_zero_rate_principal_sums_exactly() {
    let terms = loan(dec!(120000), Decimal::ZERO, 10);
    let schedule = generate_schedule(&terms, &EscrowItems::default(), terms.total_periods());
    assert_eq!(schedule.summary.payment_per_period, dec!(1000));
    assert_eq!(schedule.summary.total_principal, dec!(120000));
    assert_eq!(schedule.summary.total_interest, Decimal::ZERO);
    assert!(schedule.periods.iter().all(|p| p.interest_payment.is_zero()));
}

#[test]
fn test_standard_mortgage_reference() {
    // $320,000 at 6.5% over 30 years: $2,022.62 per month
    let terms = loan(dec!(320000), dec!(0.065), 30);
    let out = amortize(&AmortizationInput {
        loan: terms,
        escrow: EscrowItems::default(),
        analysis_periods: None,
    })
    .unwrap();
    let s = &out.result.summary;
    assert_eq!(s.payment_per_period.round_dp(2), dec!(2022.62));
    assert_eq!(s.payoff_period, Some(360));
    assert_eq!(out.result.periods.last().unwrap().ending_balance, Decimal::ZERO);
    // Total interest of roughly $408k
    assert!((s.total_interest - dec!(408142)).abs() < dec!(10), "{}", s.total_interest);
}

#[test]
fn test_escrow_accrues_after_payoff() {
    let terms = loan(dec!(12000), dec!(0.05), 1);
    let escrow = EscrowItems {
        annual_property_tax: dec!(2400),
        annual_insurance: dec!(1200),
        annual_hoa: Decimal::ZERO,
    };
    let schedule = generate_schedule(&terms, &escrow, 24);
    let after = &schedule.periods[18];
    assert_eq!(after.scheduled_payment, Decimal::ZERO);
    assert_eq!(after.property_tax, dec!(200));
    assert_eq!(after.insurance, dec!(100));
    assert_eq!(after.total_outlay(), dec!(300));
}

#[test]
fn test_cash_purchase_schedule_is_empty_of_debt() {
    let terms = loan(Decimal::ZERO, dec!(0.06), 30);
    let years = project_loan_years(&terms, 5);
    assert_eq!(years.len(), 5);
    assert!(years.iter().all(|y| y.payments_made.is_zero() && y.end_balance.is_zero()));
}

#[test]
fn test_pmi_stops_permanently_at_threshold() {
    let mut terms = loan(dec!(380000), dec!(0.065), 30);
    terms.property_value = dec!(400000);
    terms.pmi_rate = dec!(0.005);
    let schedule = generate_schedule(&terms, &EscrowItems::default(), terms.total_periods());

    let removal = schedule
        .periods
        .iter()
        .position(|p| p.loan_to_value <= PMI_LTV_THRESHOLD)
        .unwrap();
    for (i, p) in schedule.periods.iter().enumerate() {
        if i < removal {
            assert!(p.pmi_payment > Decimal::ZERO, "period {}", p.period);
        } else {
            assert_eq!(p.pmi_payment, Decimal::ZERO, "period {}", p.period);
        }
    }
    assert_eq!(schedule.summary.pmi_removal_period, Some(removal as u32 + 1));
}

#[test]
fn test_extra_payments_save_interest() {
    let mut terms = loan(dec!(250000), dec!(0.06), 30);
    terms.extra_payment = dec!(200);
    let schedule = generate_schedule(&terms, &EscrowItems::default(), terms.total_periods());
    let payoff = schedule.summary.payoff_period.unwrap();
    assert!(payoff < 360);
    assert!(schedule.summary.interest_saved > Decimal::ZERO);
    assert!(schedule.periods[payoff as usize..]
        .iter()
        .all(|p| p.ending_balance.is_zero() && p.scheduled_payment.is_zero()));
}

#[test]
fn test_loan_years_tie_to_schedule() {
    let terms = loan(dec!(200000), dec!(0.055), 15);
    let years = project_loan_years(&terms, 15);
    let schedule = generate_schedule(&terms, &EscrowItems::default(), terms.total_periods());
    for y in &years {
        let period_end = &schedule.periods[(y.year * 12 - 1) as usize];
        assert!(
            (y.end_balance - period_end.ending_balance).abs() < dec!(0.01),
            "year {}: closed form {} vs schedule {}",
            y.year,
            y.end_balance,
            period_end.ending_balance
        );
    }
    assert_eq!(years.last().unwrap().end_balance, Decimal::ZERO);
}

#[test]
fn test_biweekly_frequency() {
    let mut terms = loan(dec!(300000), dec!(0.06), 30);
    terms.frequency = PaymentFrequency::BiWeekly;
    assert_eq!(terms.total_periods(), 780);
    let schedule = generate_schedule(&terms, &EscrowItems::default(), 26);
    assert!(schedule.periods.iter().all(|p| p.year == 1));
}

#[test]
fn test_negative_principal_rejected() {
    let result = amortize(&AmortizationInput {
        loan: loan(dec!(-1), dec!(0.05), 30),
        escrow: EscrowItems::default(),
        analysis_periods: None,
    });
    assert!(result.is_err());
}

// ===========================================================================
// Cost growth and appreciation
// ===========================================================================

#[test]
fn test_year_one_costs_are_the_base() {
    let base = BaseCosts {
        property_tax: dec!(4800),
        insurance: dec!(1500),
        hoa: dec!(600),
        pmi: dec!(1200),
        maintenance: dec!(4000),
        utilities: dec!(900),
    };
    let policy = CostGrowthPolicy::with_inflation(dec!(0.03), dec!(0.02));
    let costs = project_costs(&base, &policy, dec!(0.05), 1, Some(4));
    assert_eq!(costs.total, dec!(13000));
    let later = project_costs(&base, &policy, dec!(0.05), 4, Some(4));
    assert_eq!(later.pmi, Decimal::ZERO);
    assert_eq!(later.insurance, dec!(1500) * dec!(1.05) * dec!(1.05) * dec!(1.05));
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(24))]

    #[test]
    fn prop_balance_non_increasing_and_retired(
        principal in 10_000u32..1_000_000,
        rate_bp in 0u32..1500,
        term in 1u32..40,
        extra in 0u32..500,
    ) {
        let mut terms = loan(Decimal::from(principal), Decimal::new(rate_bp as i64, 4), term);
        terms.extra_payment = Decimal::from(extra);
        let schedule = generate_schedule(&terms, &EscrowItems::default(), terms.total_periods());

        let mut prior = terms.principal;
        for p in &schedule.periods {
            prop_assert!(p.ending_balance <= prior);
            prop_assert!(p.ending_balance >= Decimal::ZERO);
            prior = p.ending_balance;
        }
        prop_assert_eq!(schedule.periods.last().map(|p| p.ending_balance), Some(Decimal::ZERO));
    }

    #[test]
    fn prop_closed_form_balance_is_bounded(
        principal in 10_000u32..1_000_000,
        rate_bp in 1u32..1500,
        term in 1u32..40,
        k_pct in 0u32..101,
    ) {
        let p = Decimal::from(principal);
        let n = term * 12;
        let k = n * k_pct / 100;
        let b = balance_after_periods(p, Decimal::new(rate_bp as i64, 4) / dec!(12), n, k);
        prop_assert!(b >= Decimal::ZERO);
        prop_assert!(b <= p + dec!(0.000001));
    }

    #[test]
    fn prop_year_one_cost_is_base(
        base in 0u32..1_000_000,
        rate_bp in -500i32..1500,
    ) {
        let base = Decimal::from(base);
        prop_assert_eq!(cost_at_year(base, Decimal::new(rate_bp as i64, 4), 1), base);
    }

    #[test]
    fn prop_fixed_appreciation_matches_iteration(
        rate_bp in -500i32..1200,
        years in 1u32..40,
    ) {
        let rate = Decimal::new(rate_bp as i64, 4);
        let policy = AppreciationPolicy::Fixed { rate };
        let mut iterative = dec!(400000);
        for _ in 0..years {
            iterative *= Decimal::ONE + rate;
        }
        let closed = value_at_year(dec!(400000), &policy, years);
        prop_assert!((closed - iterative).abs() < dec!(0.0001));
    }
}
