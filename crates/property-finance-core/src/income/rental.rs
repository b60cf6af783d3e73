use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::time_value::compound_factor;
use crate::types::{Money, Rate, Year};

const MONTHS_PER_YEAR: u32 = 12;

/// Rental income assumptions, all expressed for year one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RentalAssumptions {
    /// Market rent per month in year one
    pub monthly_rent: Money,
    /// Annual rent growth
    #[serde(default)]
    pub annual_rent_growth: Rate,
    /// Vacancy and collection loss (0.05 = 5%)
    #[serde(default)]
    pub vacancy_rate: Rate,
    /// Property management fee on collected rent
    #[serde(default)]
    pub management_rate: Rate,
}

/// Renovation undertaken at the start of ownership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenovationContext {
    pub enabled: bool,
    /// Months the unit is under renovation in year one (at most 12)
    #[serde(default)]
    pub duration_months: u32,
    /// Share of market rent collected while the work is underway (0 = vacant)
    #[serde(default)]
    pub rent_during_renovation_pct: Rate,
    /// Cash spent on the renovation; added to the initial investment and cost basis
    #[serde(default)]
    pub cost: Money,
    /// Immediate uplift in property value once the work is complete
    #[serde(default)]
    pub value_increase: Money,
}

impl RenovationContext {
    pub fn is_active(&self) -> bool {
        self.enabled && self.duration_months > 0
    }

    /// Renovation spend counted toward cash invested.
    pub fn capital_cost(&self) -> Money {
        if self.enabled {
            self.cost
        } else {
            Decimal::ZERO
        }
    }

    pub fn value_uplift(&self) -> Money {
        if self.enabled {
            self.value_increase
        } else {
            Decimal::ZERO
        }
    }
}

/// Rent for one year, from gross potential down to net of management.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RentBreakdown {
    pub monthly_rent: Money,
    pub gross: Money,
    pub vacancy_loss: Money,
    /// Vacancy-adjusted rent
    pub effective: Money,
    pub management_cost: Money,
    /// Management-adjusted rent
    pub net: Money,
}

/// Monthly market rent in `year`, compounding from the year-one baseline.
pub fn monthly_rent_at_year(rental: &RentalAssumptions, year: Year) -> Money {
    rental.monthly_rent * compound_factor(rental.annual_rent_growth, year.saturating_sub(1))
}

/// Rent collected in `year`.
///
/// Year one is prorated when a renovation is active: the renovation months
/// earn `rent_during_renovation_pct` of market rent, the rest earn full rent.
/// Vacancy applies to gross rent; management applies to the vacancy-adjusted amount.
pub fn rent_at_year(
    rental: &RentalAssumptions,
    year: Year,
    renovation: Option<&RenovationContext>,
) -> RentBreakdown {
    let monthly_rent = monthly_rent_at_year(rental, year);

    let rent_months = match renovation {
        Some(reno) if year == 1 && reno.is_active() => {
            let duration = reno.duration_months.min(MONTHS_PER_YEAR);
            Decimal::from(duration) * reno.rent_during_renovation_pct
                + Decimal::from(MONTHS_PER_YEAR - duration)
        }
        _ => Decimal::from(MONTHS_PER_YEAR),
    };

    let gross = monthly_rent * rent_months;
    let vacancy_loss = gross * rental.vacancy_rate;
    let effective = gross - vacancy_loss;
    let management_cost = effective * rental.management_rate;
    let net = effective - management_cost;

    RentBreakdown {
        monthly_rent,
        gross,
        vacancy_loss,
        effective,
        management_cost,
        net,
    }
}

/// Annual gross rent as a share of price; a quick screen used in warnings.
pub fn gross_yield(rental: &RentalAssumptions, price: Money) -> Rate {
    if price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    rental.monthly_rent * dec!(12) / price
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_rental() -> RentalAssumptions {
        RentalAssumptions {
            monthly_rent: dec!(2500),
            annual_rent_growth: dec!(0.03),
            vacancy_rate: dec!(0.05),
            management_rate: dec!(0.08),
        }
    }

    #[test]
    fn test_year_one_breakdown() {
        let rent = rent_at_year(&sample_rental(), 1, None);
        assert_eq!(rent.gross, dec!(30000));
        assert_eq!(rent.vacancy_loss, dec!(1500));
        assert_eq!(rent.effective, dec!(28500));
        // Management on vacancy-adjusted rent: 28500 * 0.08 = 2280
        assert_eq!(rent.management_cost, dec!(2280));
        assert_eq!(rent.net, dec!(26220));
    }

    #[test]
    fn test_rent_growth_compounds() {
        let rent = rent_at_year(&sample_rental(), 3, None);
        // 2500 * 1.03^2 = 2652.25
        assert_eq!(rent.monthly_rent, dec!(2652.25));
        assert_eq!(rent.gross, dec!(31827));
    }

    #[test]
    fn test_renovation_prorates_year_one_only() {
        let reno = RenovationContext {
            enabled: true,
            duration_months: 3,
            rent_during_renovation_pct: dec!(0.5),
            cost: dec!(25000),
            value_increase: dec!(40000),
        };
        let rental = sample_rental();

        let year1 = rent_at_year(&rental, 1, Some(&reno));
        // 2500 * (3 * 0.5 + 9) = 26250
        assert_eq!(year1.gross, dec!(26250));

        let year2 = rent_at_year(&rental, 2, Some(&reno));
        assert_eq!(year2.gross, dec!(2575) * dec!(12));
    }

    #[test]
    fn test_renovation_zero_rent_full_year() {
        let reno = RenovationContext {
            enabled: true,
            duration_months: 12,
            rent_during_renovation_pct: Decimal::ZERO,
            ..Default::default()
        };
        let year1 = rent_at_year(&sample_rental(), 1, Some(&reno));
        assert_eq!(year1.gross, Decimal::ZERO);
        assert_eq!(year1.net, Decimal::ZERO);
    }

    #[test]
    fn test_disabled_renovation_ignored() {
        let reno = RenovationContext {
            enabled: false,
            duration_months: 6,
            cost: dec!(10000),
            ..Default::default()
        };
        let year1 = rent_at_year(&sample_rental(), 1, Some(&reno));
        assert_eq!(year1.gross, dec!(30000));
        assert_eq!(reno.capital_cost(), Decimal::ZERO);
    }

    #[test]
    fn test_gross_yield() {
        assert_eq!(gross_yield(&sample_rental(), dec!(400000)), dec!(0.075));
        assert_eq!(gross_yield(&sample_rental(), Decimal::ZERO), Decimal::ZERO);
    }
}
