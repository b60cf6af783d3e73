use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::PropertyFinanceError;
use crate::types::{Money, Rate};
use crate::PropertyFinanceResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const RATE_TOLERANCE: Decimal = dec!(0.0000000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;

/// Rates probed when Newton-Raphson fails and a sign-change bracket is needed.
const BRACKET_GRID: [Decimal; 14] = [
    dec!(-0.99),
    dec!(-0.9),
    dec!(-0.75),
    dec!(-0.5),
    dec!(-0.25),
    dec!(-0.1),
    dec!(0),
    dec!(0.1),
    dec!(0.25),
    dec!(0.5),
    dec!(1),
    dec!(2),
    dec!(5),
    dec!(10),
];

/// Net Present Value of a series of cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> PropertyFinanceResult<Money> {
    if rate <= dec!(-1) {
        return Err(PropertyFinanceError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    npv_and_derivative(cash_flows, rate)
        .map(|(value, _)| value)
        .ok_or_else(|| PropertyFinanceError::FinancialImpossibility(format!(
            "NPV overflows decimal range at rate {rate}"
        )))
}

/// Internal Rate of Return: Newton-Raphson from `guess`, falling back to
/// bisection over a sign-change bracket when Newton stalls or diverges.
pub fn irr(cash_flows: &[Money], guess: Rate) -> PropertyFinanceResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(PropertyFinanceError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let has_outflow = cash_flows.iter().any(|cf| cf.is_sign_negative() && !cf.is_zero());
    let has_inflow = cash_flows.iter().any(|cf| cf.is_sign_positive() && !cf.is_zero());
    if !has_outflow || !has_inflow {
        return Err(PropertyFinanceError::FinancialImpossibility(
            "IRR requires at least one negative and one positive cash flow".into(),
        ));
    }

    if let Some(rate) = newton_raphson(cash_flows, guess) {
        return Ok(rate);
    }

    bisection(cash_flows)
}

fn newton_raphson(cash_flows: &[Money], guess: Rate) -> Option<Rate> {
    let mut rate = guess;

    for _ in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) = npv_and_derivative(cash_flows, rate)?;

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Some(rate);
        }
        if dnpv.is_zero() {
            return None;
        }

        let new_rate = rate - npv_val.checked_div(dnpv)?;

        // Guard against divergence
        let new_rate = new_rate.max(dec!(-0.99)).min(dec!(10));

        if (new_rate - rate).abs() < RATE_TOLERANCE {
            return Some(new_rate);
        }
        rate = new_rate;
    }

    None
}

fn bisection(cash_flows: &[Money]) -> PropertyFinanceResult<Rate> {
    let evaluated: Vec<(Rate, Money)> = BRACKET_GRID
        .iter()
        .filter_map(|&r| npv_and_derivative(cash_flows, r).map(|(v, _)| (r, v)))
        .collect();

    let bracket = evaluated.windows(2).find_map(|w| {
        let (lo, f_lo) = w[0];
        let (hi, f_hi) = w[1];
        if f_lo.is_zero() {
            Some((lo, lo, f_lo))
        } else if f_lo.is_sign_negative() != f_hi.is_sign_negative() {
            Some((lo, hi, f_lo))
        } else {
            None
        }
    });

    let (mut lo, mut hi, mut f_lo) = match bracket {
        Some(b) => b,
        None => {
            return Err(PropertyFinanceError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: MAX_IRR_ITERATIONS,
                last_delta: evaluated.last().map(|(_, v)| *v).unwrap_or(Decimal::MAX),
            })
        }
    };

    if lo == hi {
        return Ok(lo);
    }

    let mut last_delta = Decimal::MAX;
    for _ in 0..MAX_BISECTION_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        let f_mid = match npv_and_derivative(cash_flows, mid) {
            Some((v, _)) => v,
            None => break,
        };
        last_delta = f_mid;

        if f_mid.abs() < CONVERGENCE_THRESHOLD || (hi - lo) < RATE_TOLERANCE {
            return Ok(mid);
        }

        if f_mid.is_sign_negative() == f_lo.is_sign_negative() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(PropertyFinanceError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_BISECTION_ITERATIONS,
        last_delta,
    })
}

/// NPV(r) = sum CF_t / (1+r)^t and its derivative d(NPV)/dr.
///
/// Returns `None` when the discount factors leave the decimal range.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let inverse = Decimal::ONE.checked_div(one_plus_r)?;

    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE; // (1+r)^-t

    for (t, cf) in cash_flows.iter().enumerate() {
        npv = npv.checked_add(cf.checked_mul(discount)?)?;
        if t > 0 {
            // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
            let term = Decimal::from(t as u64)
                .checked_mul(*cf)?
                .checked_mul(discount)?
                .checked_mul(inverse)?;
            dnpv = dnpv.checked_sub(term)?;
        }
        discount = discount.checked_mul(inverse)?;
    }

    Some((npv, dnpv))
}

/// Growth factor (1 + rate)^periods, saturating at `Decimal::MAX`.
pub fn compound_factor(rate: Rate, periods: u32) -> Decimal {
    if periods == 0 {
        return Decimal::ONE;
    }
    (Decimal::ONE + rate)
        .checked_powu(periods as u64)
        .unwrap_or(Decimal::MAX)
}

/// Future value of a single lump sum: PV * (1 + r)^n
pub fn future_value(present_value: Money, rate: Rate, periods: u32) -> Money {
    present_value.saturating_mul(compound_factor(rate, periods))
}

/// Level payment that retires `principal` over `nper` periods at `rate` per period.
///
/// PMT = P * r(1+r)^n / ((1+r)^n - 1); straight-line P / n when the rate is zero.
pub fn pmt(rate: Rate, nper: u32, principal: Money) -> PropertyFinanceResult<Money> {
    if nper == 0 {
        return Err(PropertyFinanceError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let factor = compound_factor(rate, nper);
    let denominator = factor - Decimal::ONE;

    if denominator.is_zero() {
        return Err(PropertyFinanceError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    Ok(principal * rate * factor / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_single_exit_matches_closed_form() {
        let cfs = vec![
            dec!(-100000),
            dec!(0),
            dec!(0),
            dec!(0),
            dec!(0),
            dec!(150000),
        ];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        // (1.5)^(1/5) - 1 = 0.08447...
        assert!(
            (result - dec!(0.08447)).abs() < dec!(0.0001),
            "Expected ~8.447%, got {result}"
        );
    }

    #[test]
    fn test_irr_negative_return() {
        // Lose half the money over two years => about -29.3%
        let cfs = vec![dec!(-1000), dec!(0), dec!(500)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        assert!((result - dec!(-0.2929)).abs() < dec!(0.001));
    }

    #[test]
    fn test_irr_requires_sign_change() {
        let cfs = vec![dec!(100), dec!(100)];
        assert!(irr(&cfs, dec!(0.10)).is_err());
    }

    #[test]
    fn test_irr_too_few_flows() {
        assert!(irr(&[dec!(-100)], dec!(0.10)).is_err());
    }

    #[test]
    fn test_pmt_standard_mortgage() {
        // $320k at 6.5% over 30 years => ~$2,022.62/mo
        let payment = pmt(dec!(0.065) / dec!(12), 360, dec!(320000)).unwrap();
        assert!((payment - dec!(2022.62)).abs() < dec!(0.01));
    }

    #[test]
    fn test_pmt_zero_rate() {
        let payment = pmt(Decimal::ZERO, 360, dec!(360000)).unwrap();
        assert_eq!(payment, dec!(1000));
    }

    #[test]
    fn test_compound_factor_saturates() {
        // 3^100 is far beyond the Decimal range
        assert_eq!(compound_factor(dec!(2), 100), Decimal::MAX);
        assert_eq!(future_value(dec!(250000), dec!(2), 100), Decimal::MAX);
        assert_eq!(compound_factor(dec!(2), 0), Decimal::ONE);
    }

    #[test]
    fn test_future_value() {
        let fv = future_value(dec!(1000), dec!(0.10), 2);
        assert_eq!(fv, dec!(1210));
    }
}
