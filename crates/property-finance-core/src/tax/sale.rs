use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{TaxTreatment, EXCLUSION_MIN_YEARS};
use crate::types::Money;

/// A sale, real or hypothetical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleEvent {
    pub sale_price: Money,
    pub selling_costs: Money,
    /// Loan balance repaid out of the proceeds
    pub loan_payoff: Money,
    pub purchase_price: Money,
    pub capital_improvements: Money,
    pub depreciation_taken: Money,
    pub years_owned: u32,
}

/// Tax due on a sale and the cash left afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleTaxEstimate {
    pub sale_price: Money,
    pub selling_costs: Money,
    /// Purchase price plus capital improvements
    pub cost_basis: Money,
    pub depreciation_taken: Money,
    /// Cost basis less depreciation taken
    pub adjusted_basis: Money,
    pub total_gain: Money,
    pub exclusion_applied: Money,
    pub depreciation_recapture_tax: Money,
    pub capital_gains_tax: Money,
    pub total_tax: Money,
    /// Sale price less selling costs and loan payoff, before tax
    pub pre_tax_proceeds: Money,
    pub after_tax_proceeds: Money,
}

/// Capital gains and depreciation recapture on a sale.
///
/// Recapture is taxed at the flat recapture rate on min(depreciation, gain);
/// the remaining gain, less any primary-residence exclusion, at the capital
/// gains rate. A loss produces no tax.
pub fn estimate_sale_tax(sale: &SaleEvent, treatment: &TaxTreatment) -> SaleTaxEstimate {
    let cost_basis = sale.purchase_price + sale.capital_improvements;
    let adjusted_basis = cost_basis - sale.depreciation_taken;
    let amount_realized = sale.sale_price - sale.selling_costs;
    let total_gain = amount_realized - adjusted_basis;
    let pre_tax_proceeds = amount_realized - sale.loan_payoff;

    if total_gain <= Decimal::ZERO {
        return SaleTaxEstimate {
            sale_price: sale.sale_price,
            selling_costs: sale.selling_costs,
            cost_basis,
            depreciation_taken: sale.depreciation_taken,
            adjusted_basis,
            total_gain,
            pre_tax_proceeds,
            after_tax_proceeds: pre_tax_proceeds,
            ..Default::default()
        };
    }

    let recapture_base = sale.depreciation_taken.max(Decimal::ZERO).min(total_gain);
    let depreciation_recapture_tax = recapture_base * treatment.depreciation_recapture_rate;

    let remaining_gain = total_gain - recapture_base;
    let exclusion_applied =
        if treatment.primary_residence && sale.years_owned >= EXCLUSION_MIN_YEARS {
            remaining_gain.min(treatment.filing_status.exclusion_limit())
        } else {
            Decimal::ZERO
        };
    let capital_gains_tax = (remaining_gain - exclusion_applied) * treatment.capital_gains_rate;

    let total_tax = depreciation_recapture_tax + capital_gains_tax;

    SaleTaxEstimate {
        sale_price: sale.sale_price,
        selling_costs: sale.selling_costs,
        cost_basis,
        depreciation_taken: sale.depreciation_taken,
        adjusted_basis,
        total_gain,
        exclusion_applied,
        depreciation_recapture_tax,
        capital_gains_tax,
        total_tax,
        pre_tax_proceeds,
        after_tax_proceeds: pre_tax_proceeds - total_tax,
    }
}
