use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::projection::yearly::YearlyProjection;
use crate::types::{Money, Multiple, Rate};

const IRR_GUESS: Rate = dec!(0.10);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GradeLetter {
    A,
    B,
    C,
    D,
    F,
}

impl GradeLetter {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 80 => GradeLetter::A,
            s if s >= 65 => GradeLetter::B,
            s if s >= 50 => GradeLetter::C,
            s if s >= 35 => GradeLetter::D,
            _ => GradeLetter::F,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GradeLetter::A => "A",
            GradeLetter::B => "B",
            GradeLetter::C => "C",
            GradeLetter::D => "D",
            GradeLetter::F => "F",
        }
    }
}

impl std::fmt::Display for GradeLetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 100-point investment grade with the points behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentGrade {
    pub letter: GradeLetter,
    pub score: u32,
    /// IRR spread over the benchmark (max 50)
    pub irr_points: u32,
    /// Equity multiple (max 30)
    pub multiple_points: u32,
    /// Dollar outperformance vs the benchmark (max 20)
    pub outperformance_points: u32,
    pub rationale: String,
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

/// IRR of a cash flow sequence. Returns zero when the solver cannot find a root.
pub fn irr(cash_flows: &[Money]) -> Rate {
    crate::time_value::irr(cash_flows, IRR_GUESS).unwrap_or(Decimal::ZERO)
}

/// Same as [`irr`] but records the solver failure as a warning.
pub fn irr_with_warning(cash_flows: &[Money], warnings: &mut Vec<String>) -> Rate {
    match crate::time_value::irr(cash_flows, IRR_GUESS) {
        Ok(rate) => rate,
        Err(e) => {
            warnings.push(format!("IRR could not be computed, reported as 0: {e}"));
            Decimal::ZERO
        }
    }
}

/// Equity cash flows for IRR: the initial investment out, each year's net
/// cash flow in, and the final year's net sale proceeds on top.
pub fn irr_cash_flows(initial_investment: Money, years: &[YearlyProjection]) -> Vec<Money> {
    let mut flows = Vec::with_capacity(years.len() + 1);
    flows.push(-initial_investment);
    flows.extend(years.iter().map(|y| y.net_cash_flow));
    if let (Some(last), Some(y)) = (flows.last_mut(), years.last()) {
        *last += y.net_sale_proceeds;
    }
    flows
}

/// Total profit over the initial investment.
pub fn total_roi(total_profit: Money, initial_investment: Money) -> Rate {
    if initial_investment <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    total_profit / initial_investment
}

/// Compound annual return implied by a total ROI.
///
/// Below -100% the compounding base is negative, so the linear average
/// roi / years is reported instead.
pub fn annualized_roi(total_roi: Rate, years: u32, initial_investment: Money) -> Rate {
    if initial_investment <= Decimal::ZERO || years == 0 {
        return Decimal::ZERO;
    }
    let n = Decimal::from(years);
    if total_roi < -Decimal::ONE {
        return total_roi / n;
    }
    let base = Decimal::ONE + total_roi;
    if base.is_zero() {
        return -Decimal::ONE;
    }
    if years == 1 {
        return total_roi;
    }
    base.checked_powd(Decimal::ONE / n)
        .map(|g| g - Decimal::ONE)
        .unwrap_or(total_roi / n)
}

/// Total cash returned (profit plus the capital) per dollar invested.
pub fn equity_multiple(total_profit: Money, initial_investment: Money) -> Multiple {
    if initial_investment <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (initial_investment + total_profit) / initial_investment
}

pub fn cash_on_cash(net_cash_flow: Money, initial_investment: Money) -> Rate {
    if initial_investment <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    net_cash_flow / initial_investment
}

/// Mean of the yearly cash-on-cash returns.
pub fn average_cash_on_cash(years: &[YearlyProjection], initial_investment: Money) -> Rate {
    if years.is_empty() || initial_investment <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let total: Money = years.iter().map(|y| y.net_cash_flow).sum();
    total / Decimal::from(years.len() as u64) / initial_investment
}

// ---------------------------------------------------------------------------
// Grading
// ---------------------------------------------------------------------------

fn irr_spread_points(spread: Rate) -> u32 {
    if spread >= dec!(0.05) {
        50
    } else if spread >= dec!(0.02) {
        40
    } else if spread >= Decimal::ZERO {
        30
    } else if spread >= dec!(-0.02) {
        20
    } else if spread >= dec!(-0.05) {
        10
    } else {
        0
    }
}

fn multiple_points(multiple: Multiple) -> u32 {
    if multiple >= dec!(3.0) {
        30
    } else if multiple >= dec!(2.0) {
        25
    } else if multiple >= dec!(1.5) {
        20
    } else if multiple >= dec!(1.2) {
        15
    } else if multiple >= dec!(1.0) {
        10
    } else {
        0
    }
}

fn outperformance_points(outperformance: Money) -> u32 {
    if outperformance > Decimal::ZERO {
        20
    } else if outperformance >= dec!(-5000) {
        10
    } else {
        0
    }
}

/// Score the investment on the fixed 100-point rubric.
pub fn grade(
    irr: Rate,
    equity_multiple: Multiple,
    dollar_outperformance: Money,
    benchmark_rate: Rate,
) -> InvestmentGrade {
    let spread = irr - benchmark_rate;
    let irr_points = irr_spread_points(spread);
    let multiple_points = multiple_points(equity_multiple);
    let outperformance_points = outperformance_points(dollar_outperformance);
    let score = irr_points + multiple_points + outperformance_points;
    let letter = GradeLetter::from_score(score);

    let verdict = if dollar_outperformance > Decimal::ZERO {
        "beats"
    } else {
        "trails"
    };
    let rationale = format!(
        "Grade {letter} ({score}/100): IRR {:.2}% vs {:.2}% benchmark ({:+.2} pts spread, {irr_points}/50); \
         equity multiple {:.2}x ({multiple_points}/30); {verdict} the benchmark by ${:.0} ({outperformance_points}/20)",
        irr * dec!(100),
        benchmark_rate * dec!(100),
        spread * dec!(100),
        equity_multiple,
        dollar_outperformance.abs(),
    );

    InvestmentGrade {
        letter,
        score,
        irr_points,
        multiple_points,
        outperformance_points,
        rationale,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
