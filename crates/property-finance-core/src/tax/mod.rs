pub mod deductions;
pub mod sale;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Rate;

/// Recovery period for residential rental property (straight line, years).
pub const RESIDENTIAL_RECOVERY_YEARS: Decimal = dec!(27.5);

/// Qualified business income deduction as a share of positive rental income.
pub const QBI_DEDUCTION_RATE: Rate = dec!(0.20);

/// Unrecaptured Section 1250 gain rate.
pub const DEFAULT_RECAPTURE_RATE: Rate = dec!(0.25);

/// Long-term capital gains rate applied when none is given.
pub const DEFAULT_CAPITAL_GAINS_RATE: Rate = dec!(0.15);

/// Share of the purchase price attributed to land when none is given.
pub const DEFAULT_LAND_VALUE_PCT: Rate = dec!(0.20);

/// Section 121 primary-residence exclusion limits.
pub const EXCLUSION_SINGLE: Decimal = dec!(250000);
pub const EXCLUSION_MARRIED_JOINT: Decimal = dec!(500000);

/// Years of ownership and use required for the primary-residence exclusion.
pub const EXCLUSION_MIN_YEARS: u32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    #[default]
    Single,
    MarriedJoint,
}

impl FilingStatus {
    pub fn exclusion_limit(self) -> Decimal {
        match self {
            FilingStatus::Single => EXCLUSION_SINGLE,
            FilingStatus::MarriedJoint => EXCLUSION_MARRIED_JOINT,
        }
    }
}

fn default_land_value_pct() -> Rate {
    DEFAULT_LAND_VALUE_PCT
}

fn default_capital_gains_rate() -> Rate {
    DEFAULT_CAPITAL_GAINS_RATE
}

fn default_recapture_rate() -> Rate {
    DEFAULT_RECAPTURE_RATE
}

/// Tax treatment of the property and its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxTreatment {
    /// Owner's marginal income tax rate
    pub marginal_tax_rate: Rate,
    #[serde(default)]
    pub deduct_mortgage_interest: bool,
    #[serde(default)]
    pub depreciation_enabled: bool,
    #[serde(default)]
    pub qbi_enabled: bool,
    /// Non-depreciable land share of the purchase price
    #[serde(default = "default_land_value_pct")]
    pub land_value_pct: Rate,
    #[serde(default = "default_capital_gains_rate")]
    pub capital_gains_rate: Rate,
    #[serde(default = "default_recapture_rate")]
    pub depreciation_recapture_rate: Rate,
    /// Owner-occupied; eligible for the Section 121 exclusion on sale
    #[serde(default)]
    pub primary_residence: bool,
    #[serde(default)]
    pub filing_status: FilingStatus,
}

impl Default for TaxTreatment {
    fn default() -> Self {
        Self {
            marginal_tax_rate: Decimal::ZERO,
            deduct_mortgage_interest: false,
            depreciation_enabled: false,
            qbi_enabled: false,
            land_value_pct: DEFAULT_LAND_VALUE_PCT,
            capital_gains_rate: DEFAULT_CAPITAL_GAINS_RATE,
            depreciation_recapture_rate: DEFAULT_RECAPTURE_RATE,
            primary_residence: false,
            filing_status: FilingStatus::Single,
        }
    }
}
