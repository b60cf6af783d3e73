use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::time_value::compound_factor;
use crate::types::{Money, Rate, Year};

/// How the property value grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppreciationPolicy {
    /// Constant annual rate
    Fixed { rate: Rate },
    /// One rate per year starting with year one; the last rate carries forward
    Schedule { rates: Vec<Rate> },
}

impl Default for AppreciationPolicy {
    fn default() -> Self {
        AppreciationPolicy::Fixed {
            rate: Decimal::ZERO,
        }
    }
}

impl AppreciationPolicy {
    /// Appreciation applied during `year`.
    pub fn rate_for_year(&self, year: Year) -> Rate {
        match self {
            AppreciationPolicy::Fixed { rate } => *rate,
            AppreciationPolicy::Schedule { rates } => {
                let idx = (year.max(1) - 1) as usize;
                rates
                    .get(idx)
                    .or_else(|| rates.last())
                    .copied()
                    .unwrap_or(Decimal::ZERO)
            }
        }
    }
}

/// Property value at the end of `year`.
///
/// A fixed rate uses the closed form base * (1 + rate)^year. A schedule
/// compounds year by year from the prior computed value.
pub fn value_at_year(base_value: Money, policy: &AppreciationPolicy, year: Year) -> Money {
    match policy {
        AppreciationPolicy::Fixed { rate } => base_value * compound_factor(*rate, year),
        AppreciationPolicy::Schedule { .. } => (1..=year).fold(base_value, |value, y| {
            value * (Decimal::ONE + policy.rate_for_year(y))
        }),
    }
}

/// Constant rate that reproduces the policy's compounded growth through `year - 1`.
///
/// Appreciation-tied costs use this so `cost_at_year` stays a single-rate formula
/// when the value follows a schedule.
pub fn effective_appreciation_rate(policy: &AppreciationPolicy, year: Year) -> Rate {
    match policy {
        AppreciationPolicy::Fixed { rate } => *rate,
        AppreciationPolicy::Schedule { .. } => {
            if year <= 1 {
                return policy.rate_for_year(1);
            }
            let elapsed = year - 1;
            let growth = value_at_year(Decimal::ONE, policy, elapsed);
            if growth <= Decimal::ZERO {
                return -Decimal::ONE;
            }
            if elapsed == 1 {
                return growth - Decimal::ONE;
            }
            let exponent = Decimal::ONE / Decimal::from(elapsed);
            growth
                .checked_powd(exponent)
                .map(|g| g - Decimal::ONE)
                .unwrap_or_else(|| policy.rate_for_year(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fixed_closed_form() {
        let policy = AppreciationPolicy::Fixed { rate: dec!(0.03) };
        assert_eq!(value_at_year(dec!(400000), &policy, 0), dec!(400000));
        assert_eq!(value_at_year(dec!(400000), &policy, 1), dec!(412000));
        assert_eq!(value_at_year(dec!(400000), &policy, 2), dec!(424360));
    }

    #[test]
    fn test_closed_form_matches_iteration() {
        let policy = AppreciationPolicy::Fixed { rate: dec!(0.037) };
        let mut iterative = dec!(350000);
        for year in 1..=30 {
            iterative *= dec!(1.037);
            let closed = value_at_year(dec!(350000), &policy, year);
            assert!(
                (closed - iterative).abs() < dec!(0.000001),
                "year {year}: closed {closed} vs iterative {iterative}"
            );
        }
    }

    #[test]
    fn test_schedule_compounds_and_carries_last_rate() {
        let policy = AppreciationPolicy::Schedule {
            rates: vec![dec!(0.10), dec!(-0.05)],
        };
        assert_eq!(value_at_year(dec!(100000), &policy, 1), dec!(110000));
        assert_eq!(value_at_year(dec!(100000), &policy, 2), dec!(104500));
        // Year 3 reuses -5%
        assert_eq!(value_at_year(dec!(100000), &policy, 3), dec!(99275));
    }

    #[test]
    fn test_empty_schedule_is_flat() {
        let policy = AppreciationPolicy::Schedule { rates: vec![] };
        assert_eq!(value_at_year(dec!(250000), &policy, 5), dec!(250000));
    }

    #[test]
    fn test_effective_rate_reproduces_growth() {
        let policy = AppreciationPolicy::Schedule {
            rates: vec![dec!(0.02), dec!(0.04), dec!(0.06)],
        };
        let g = effective_appreciation_rate(&policy, 4);
        let via_rate = compound_factor(g, 3);
        let direct = value_at_year(Decimal::ONE, &policy, 3);
        assert!((via_rate - direct).abs() < dec!(0.00001));
        assert_eq!(effective_appreciation_rate(&policy, 2), dec!(0.02));
    }

    #[test]
    fn test_deserialize_tagged_policy() {
        let policy: AppreciationPolicy =
            serde_json::from_str(r#"{"type": "fixed", "rate": "0.03"}"#).unwrap();
        assert_eq!(policy.rate_for_year(9), dec!(0.03));
    }
}
