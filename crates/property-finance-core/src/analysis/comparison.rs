use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::time_value::future_value;
use crate::types::{Money, Rate};

/// Real estate profit set against a benchmark investment of the same cash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeComparison {
    pub benchmark_rate: Rate,
    pub initial_investment: Money,
    /// Initial investment compounded untouched for the holding period
    pub simple_final_value: Money,
    pub simple_profit: Money,
    /// Benchmark balance after mirroring every property cash flow
    pub matched_final_value: Money,
    pub matched_profit: Money,
    /// Real estate profit less simple benchmark profit; positive when real estate wins
    pub outperformance: Money,
    pub matched_outperformance: Money,
    /// Benchmark balance at the end of each year under the matched method
    pub yearly_matched_balances: Vec<Money>,
}

/// Compare the property against the benchmark two ways.
///
/// The simple method compounds the initial investment alone. The matched
/// method compounds the balance each year and then moves the property's net
/// cash flow through it: a distribution from the property is withdrawn, a
/// cash injection into the property is added. Matched profit counts the
/// withdrawn cash back in, so both vehicles release identical cash each year.
/// Transaction costs and tax drag are ignored.
pub fn compare(
    initial_investment: Money,
    yearly_cash_flows: &[Money],
    re_profit: Money,
    benchmark_rate: Rate,
    holding_years: u32,
) -> AlternativeComparison {
    let simple_final_value = future_value(initial_investment, benchmark_rate, holding_years);
    let simple_profit = simple_final_value.saturating_sub(initial_investment);

    let growth = Decimal::ONE + benchmark_rate;
    let mut balance = initial_investment;
    let mut yearly_matched_balances = Vec::with_capacity(holding_years as usize);
    let mut total_cash_flow = Decimal::ZERO;

    for year in 0..holding_years as usize {
        let cf = yearly_cash_flows.get(year).copied().unwrap_or(Decimal::ZERO);
        // Saturates rather than overflowing on extreme benchmark rates
        balance = balance.saturating_mul(growth).saturating_sub(cf);
        total_cash_flow = total_cash_flow.saturating_add(cf);
        yearly_matched_balances.push(balance);
    }

    let matched_final_value = balance;
    let matched_profit = matched_final_value
        .saturating_add(total_cash_flow)
        .saturating_sub(initial_investment);

    AlternativeComparison {
        benchmark_rate,
        initial_investment,
        simple_final_value,
        simple_profit,
        matched_final_value,
        matched_profit,
        outperformance: re_profit.saturating_sub(simple_profit),
        matched_outperformance: re_profit.saturating_sub(matched_profit),
        yearly_matched_balances,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_simple_method() {
        let c = compare(dec!(100000), &[], dec!(50000), dec!(0.10), 2);
        assert_eq!(c.simple_final_value, dec!(121000));
        assert_eq!(c.simple_profit, dec!(21000));
        assert_eq!(c.outperformance, dec!(29000));
    }

    #[test]
    fn test_matched_withdraws_distributions() {
        let c = compare(dec!(100000), &[dec!(5000), dec!(5000)], dec!(0), dec!(0.10), 2);
        // 100000*1.1 - 5000 = 105000; 105000*1.1 - 5000 = 110500
        assert_eq!(c.yearly_matched_balances, vec![dec!(105000), dec!(110500)]);
        assert_eq!(c.matched_final_value, dec!(110500));
        // 110500 + 10000 - 100000
        assert_eq!(c.matched_profit, dec!(20500));
        assert_eq!(c.matched_outperformance, dec!(-20500));
    }

    #[test]
    fn test_matched_adds_injections() {
        let c = compare(dec!(50000), &[dec!(-2000)], dec!(0), dec!(0.05), 1);
        assert_eq!(c.matched_final_value, dec!(54500));
        // Injected cash is not profit
        assert_eq!(c.matched_profit, dec!(2500));
    }

    #[test]
    fn test_zero_rate_matches_cash() {
        let flows = [dec!(1000), dec!(-500), dec!(2000)];
        let c = compare(dec!(10000), &flows, dec!(0), Decimal::ZERO, 3);
        assert_eq!(c.simple_profit, Decimal::ZERO);
        assert_eq!(c.matched_profit, Decimal::ZERO);
    }

    #[test]
    fn test_extreme_benchmark_saturates() {
        let flows = vec![dec!(12000); 100];
        let c = compare(dec!(100000), &flows, dec!(250000), dec!(2), 100);
        assert_eq!(c.simple_final_value, Decimal::MAX);
        assert_eq!(c.yearly_matched_balances.len(), 100);
        assert!(c.matched_final_value > dec!(100000000000000000000));
        assert!(c.outperformance < Decimal::ZERO);
        assert!(c.matched_outperformance < Decimal::ZERO);
    }

    #[test]
    fn test_missing_years_are_zero() {
        let c = compare(dec!(1000), &[dec!(100)], dec!(0), dec!(0.10), 3);
        assert_eq!(c.yearly_matched_balances.len(), 3);
    }
}
