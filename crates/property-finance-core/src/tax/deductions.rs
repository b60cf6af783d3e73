use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{TaxTreatment, QBI_DEDUCTION_RATE, RESIDENTIAL_RECOVERY_YEARS};
use crate::types::Money;

/// Tax effects of one year of ownership.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxBenefits {
    /// Tax saved by deducting mortgage interest
    pub interest_tax_benefit: Money,
    /// Depreciation expense claimed this year
    pub depreciation: Money,
    /// Tax saved by the depreciation expense
    pub depreciation_benefit: Money,
    /// Schedule E net: net rent - operating costs - interest - depreciation
    pub taxable_rental_income: Money,
    pub qbi_deduction: Money,
    pub qbi_benefit: Money,
    pub total_tax_benefit: Money,
}

/// Depreciable basis: the building share of the purchase price plus improvements.
pub fn building_value(
    purchase_price: Money,
    capital_improvements: Money,
    treatment: &TaxTreatment,
) -> Money {
    (purchase_price * (Decimal::ONE - treatment.land_value_pct) + capital_improvements)
        .max(Decimal::ZERO)
}

/// Straight-line depreciation for one full year.
pub fn annual_depreciation(building_value: Money) -> Money {
    building_value / RESIDENTIAL_RECOVERY_YEARS
}

/// Depreciation available this year given what has already been claimed.
pub fn depreciation_for_year(building_value: Money, already_taken: Money) -> Money {
    let remaining = (building_value - already_taken).max(Decimal::ZERO);
    annual_depreciation(building_value).min(remaining)
}

/// Cumulative depreciation after `years` full years of ownership.
pub fn depreciation_through(building_value: Money, years: u32) -> Money {
    (annual_depreciation(building_value) * Decimal::from(years)).min(building_value)
}

/// Tax benefits for a year, given rent net of management, operating costs,
/// interest paid and the depreciation available this year.
///
/// Passive-activity loss limits and income phase-outs are not modelled.
pub fn compute_tax_benefits(
    treatment: &TaxTreatment,
    net_rent: Money,
    operating_costs: Money,
    interest_paid: Money,
    depreciation_available: Money,
) -> TaxBenefits {
    let rate = treatment.marginal_tax_rate;

    let interest_tax_benefit = if treatment.deduct_mortgage_interest {
        interest_paid * rate
    } else {
        Decimal::ZERO
    };

    let depreciation = if treatment.depreciation_enabled {
        depreciation_available
    } else {
        Decimal::ZERO
    };
    let depreciation_benefit = depreciation * rate;

    let taxable_rental_income = net_rent - operating_costs - interest_paid - depreciation;

    let qbi_deduction = if treatment.qbi_enabled && taxable_rental_income > Decimal::ZERO {
        taxable_rental_income * QBI_DEDUCTION_RATE
    } else {
        Decimal::ZERO
    };
    let qbi_benefit = qbi_deduction * rate;

    TaxBenefits {
        interest_tax_benefit,
        depreciation,
        depreciation_benefit,
        taxable_rental_income,
        qbi_deduction,
        qbi_benefit,
        total_tax_benefit: interest_tax_benefit + depreciation_benefit + qbi_benefit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rental_treatment() -> TaxTreatment {
        TaxTreatment {
            marginal_tax_rate: dec!(0.24),
            deduct_mortgage_interest: true,
            depreciation_enabled: true,
            qbi_enabled: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_building_value_excludes_land() {
        let t = rental_treatment();
        assert_eq!(building_value(dec!(400000), Decimal::ZERO, &t), dec!(320000));
        assert_eq!(building_value(dec!(400000), dec!(25000), &t), dec!(345000));
    }

    #[test]
    fn test_depreciation_caps_at_basis() {
        let basis = dec!(275000);
        assert_eq!(annual_depreciation(basis), dec!(10000));
        assert_eq!(depreciation_for_year(basis, dec!(270000)), dec!(5000));
        assert_eq!(depreciation_for_year(basis, basis), Decimal::ZERO);
        assert_eq!(depreciation_through(basis, 30), basis);
    }

    #[test]
    fn test_profitable_rental_gets_qbi() {
        let t = rental_treatment();
        let b = compute_tax_benefits(&t, dec!(40000), dec!(10000), dec!(8000), dec!(10000));
        // taxable = 40000 - 10000 - 8000 - 10000 = 12000
        assert_eq!(b.taxable_rental_income, dec!(12000));
        assert_eq!(b.qbi_deduction, dec!(2400));
        assert_eq!(b.qbi_benefit, dec!(576));
        assert_eq!(b.interest_tax_benefit, dec!(1920));
        assert_eq!(b.depreciation_benefit, dec!(2400));
        assert_eq!(b.total_tax_benefit, dec!(4896));
    }

    #[test]
    fn test_loss_gets_no_qbi() {
        let t = rental_treatment();
        let b = compute_tax_benefits(&t, dec!(20000), dec!(10000), dec!(15000), dec!(10000));
        assert!(b.taxable_rental_income < Decimal::ZERO);
        assert_eq!(b.qbi_deduction, Decimal::ZERO);
        assert_eq!(b.qbi_benefit, Decimal::ZERO);
    }

    #[test]
    fn test_flags_disable_benefits() {
        let t = TaxTreatment {
            marginal_tax_rate: dec!(0.24),
            ..Default::default()
        };
        let b = compute_tax_benefits(&t, dec!(40000), dec!(10000), dec!(8000), dec!(10000));
        assert_eq!(b.total_tax_benefit, Decimal::ZERO);
        assert_eq!(b.depreciation, Decimal::ZERO);
        assert_eq!(b.taxable_rental_income, dec!(22000));
    }
}
