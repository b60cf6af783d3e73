use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::metrics::GradeLetter;
use super::summary::summarize;
use crate::income::appreciation::AppreciationPolicy;
use crate::projection::parameters::{validate_input, PropertyInput};
use crate::projection::yearly::project;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::PropertyFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An assumption that can be shocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityDriver {
    AppreciationRate,
    RentGrowth,
    InterestRate,
    VacancyRate,
    GeneralInflation,
    BenchmarkRate,
    /// Shocked proportionally (0.10 = +10%)
    MonthlyRent,
    /// Shocked proportionally (0.10 = +10%)
    PurchasePrice,
}

impl SensitivityDriver {
    pub const ALL: [SensitivityDriver; 8] = [
        SensitivityDriver::AppreciationRate,
        SensitivityDriver::RentGrowth,
        SensitivityDriver::InterestRate,
        SensitivityDriver::VacancyRate,
        SensitivityDriver::GeneralInflation,
        SensitivityDriver::BenchmarkRate,
        SensitivityDriver::MonthlyRent,
        SensitivityDriver::PurchasePrice,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SensitivityDriver::AppreciationRate => "Appreciation rate",
            SensitivityDriver::RentGrowth => "Rent growth",
            SensitivityDriver::InterestRate => "Interest rate",
            SensitivityDriver::VacancyRate => "Vacancy rate",
            SensitivityDriver::GeneralInflation => "General inflation",
            SensitivityDriver::BenchmarkRate => "Benchmark return",
            SensitivityDriver::MonthlyRent => "Monthly rent",
            SensitivityDriver::PurchasePrice => "Purchase price",
        }
    }

    /// Default (low, high) shocks.
    pub fn default_shocks(self) -> (Decimal, Decimal) {
        match self {
            SensitivityDriver::AppreciationRate
            | SensitivityDriver::RentGrowth
            | SensitivityDriver::InterestRate
            | SensitivityDriver::GeneralInflation => (dec!(-0.01), dec!(0.01)),
            SensitivityDriver::VacancyRate => (dec!(-0.03), dec!(0.03)),
            SensitivityDriver::BenchmarkRate => (dec!(-0.02), dec!(0.02)),
            SensitivityDriver::MonthlyRent | SensitivityDriver::PurchasePrice => {
                (dec!(-0.10), dec!(0.10))
            }
        }
    }

    /// Copy of `base` with this driver moved by `shock`.
    pub fn apply(self, base: &PropertyInput, shock: Decimal) -> PropertyInput {
        let mut input = base.clone();
        match self {
            SensitivityDriver::AppreciationRate => {
                input.appreciation = match &base.appreciation {
                    AppreciationPolicy::Fixed { rate } => AppreciationPolicy::Fixed {
                        rate: *rate + shock,
                    },
                    AppreciationPolicy::Schedule { rates } => AppreciationPolicy::Schedule {
                        rates: rates.iter().map(|r| *r + shock).collect(),
                    },
                };
            }
            SensitivityDriver::RentGrowth => input.rental.annual_rent_growth += shock,
            SensitivityDriver::InterestRate => {
                input.financing.annual_rate =
                    (input.financing.annual_rate + shock).max(Decimal::ZERO);
            }
            SensitivityDriver::VacancyRate => {
                input.rental.vacancy_rate =
                    (input.rental.vacancy_rate + shock).max(Decimal::ZERO).min(dec!(0.99));
            }
            SensitivityDriver::GeneralInflation => input.cost_growth.general_inflation += shock,
            SensitivityDriver::BenchmarkRate => input.alternative_return += shock,
            SensitivityDriver::MonthlyRent => {
                input.rental.monthly_rent *= Decimal::ONE + shock;
            }
            SensitivityDriver::PurchasePrice => {
                let factor = Decimal::ONE + shock;
                input.purchase_price *= factor;
                input.property_value = base.property_value.map(|v| v * factor);
                input.down_payment = input.down_payment.min(input.purchase_price);
            }
        }
        input
    }
}

/// Low and high shocks for one driver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DriverShock {
    pub driver: SensitivityDriver,
    pub low: Decimal,
    pub high: Decimal,
}

impl From<SensitivityDriver> for DriverShock {
    fn from(driver: SensitivityDriver) -> Self {
        let (low, high) = driver.default_shocks();
        Self { driver, low, high }
    }
}

fn default_parallel() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub base: PropertyInput,
    /// Drivers to sweep; every driver with default shocks when empty
    #[serde(default)]
    pub drivers: Vec<DriverShock>,
    /// Run scenarios on worker threads when built with the `parallel` feature
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

/// Outcome of one shocked scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPoint {
    pub shock: Decimal,
    pub irr: Rate,
    pub total_profit: Money,
    pub irr_delta: Rate,
    pub profit_delta: Money,
    pub grade: GradeLetter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverResult {
    pub driver: SensitivityDriver,
    pub label: String,
    pub low: ScenarioPoint,
    pub high: ScenarioPoint,
    /// |high - low| total profit
    pub profit_swing: Money,
    /// |high - low| IRR
    pub irr_swing: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub base_irr: Rate,
    pub base_total_profit: Money,
    pub base_grade: GradeLetter,
    /// Sorted by profit swing, largest first
    pub drivers: Vec<DriverResult>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Tornado sweep: rerun the full analysis with each driver at its low and
/// high shock, and rank drivers by the profit swing between the two.
pub fn run_sensitivity(
    input: &SensitivityInput,
) -> PropertyFinanceResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(&input.base, &mut warnings)?;
    let base = evaluate(&input.base);

    let shocks: Vec<DriverShock> = if input.drivers.is_empty() {
        SensitivityDriver::ALL.iter().copied().map(DriverShock::from).collect()
    } else {
        input.drivers.clone()
    };

    let scenarios: Vec<(SensitivityDriver, Decimal)> = shocks
        .iter()
        .flat_map(|s| [(s.driver, s.low), (s.driver, s.high)])
        .collect();

    let points = maybe_parallel_map(&scenarios, input.parallel, |(driver, shock)| {
        let shocked = driver.apply(&input.base, *shock);
        let mut scenario_warnings = Vec::new();
        validate_input(&shocked, &mut scenario_warnings).map(|_| evaluate(&shocked))
    });

    let mut drivers = Vec::with_capacity(shocks.len());
    for (shock, pair) in shocks.iter().zip(points.chunks(2)) {
        let (low, high) = match pair {
            [Ok(low), Ok(high)] => (low, high),
            _ => {
                warnings.push(format!(
                    "{}: shocked assumptions are invalid, driver skipped",
                    shock.driver.label()
                ));
                continue;
            }
        };
        drivers.push(DriverResult {
            driver: shock.driver,
            label: shock.driver.label().to_string(),
            low: point(shock.low, low, &base),
            high: point(shock.high, high, &base),
            profit_swing: (high.total_profit - low.total_profit).abs(),
            irr_swing: (high.irr - low.irr).abs(),
        });
    }

    drivers.sort_by(|a, b| b.profit_swing.cmp(&a.profit_swing));

    let output = SensitivityOutput {
        base_irr: base.irr,
        base_total_profit: base.total_profit,
        base_grade: base.grade,
        drivers,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-at-a-time sensitivity of IRR and total profit (tornado)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Evaluation {
    irr: Rate,
    total_profit: Money,
    grade: GradeLetter,
}

fn evaluate(input: &PropertyInput) -> Evaluation {
    let mut warnings = Vec::new();
    let summary = summarize(input, project(input), &mut warnings);
    Evaluation {
        irr: summary.irr,
        total_profit: summary.total_profit,
        grade: summary.grade.letter,
    }
}

fn point(shock: Decimal, eval: &Evaluation, base: &Evaluation) -> ScenarioPoint {
    ScenarioPoint {
        shock,
        irr: eval.irr,
        total_profit: eval.total_profit,
        irr_delta: eval.irr - base.irr,
        profit_delta: eval.total_profit - base.total_profit,
        grade: eval.grade,
    }
}

/// Map over scenarios, on rayon worker threads when the `parallel` feature is on.
#[allow(unused_variables)]
fn maybe_parallel_map<T, U, F>(items: &[T], parallel: bool, f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if parallel && items.len() > 1 {
            return items.par_iter().map(f).collect();
        }
    }

    items.iter().map(f).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
