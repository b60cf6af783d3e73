use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::time_value::compound_factor;
use crate::types::{Money, Rate, Year};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Operating cost categories tracked by the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    PropertyTax,
    Insurance,
    Hoa,
    Pmi,
    Maintenance,
    Utilities,
}

impl CostCategory {
    pub const ALL: [CostCategory; 6] = [
        CostCategory::PropertyTax,
        CostCategory::Insurance,
        CostCategory::Hoa,
        CostCategory::Pmi,
        CostCategory::Maintenance,
        CostCategory::Utilities,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CostCategory::PropertyTax => "property_tax",
            CostCategory::Insurance => "insurance",
            CostCategory::Hoa => "hoa",
            CostCategory::Pmi => "pmi",
            CostCategory::Maintenance => "maintenance",
            CostCategory::Utilities => "utilities",
        }
    }
}

/// How a category's cost grows from year to year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthType {
    /// Tracks the property appreciation rate
    Appreciation,
    /// Tracks general inflation
    #[default]
    Inflation,
    /// General inflation plus a fixed premium
    InflationPlus,
    /// No growth
    Fixed,
    /// Category-specific rate
    Custom,
    /// Unrecognised tag; grows with general inflation
    #[serde(other)]
    Unknown,
}

/// Growth settings for a single category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPolicy {
    pub growth_type: GrowthType,
    #[serde(default)]
    pub custom_rate: Rate,
}

impl CategoryPolicy {
    pub fn new(growth_type: GrowthType) -> Self {
        Self {
            growth_type,
            custom_rate: Decimal::ZERO,
        }
    }

    pub fn custom(rate: Rate) -> Self {
        Self {
            growth_type: GrowthType::Custom,
            custom_rate: rate,
        }
    }
}

fn appreciation_policy() -> CategoryPolicy {
    CategoryPolicy::new(GrowthType::Appreciation)
}

fn inflation_policy() -> CategoryPolicy {
    CategoryPolicy::new(GrowthType::Inflation)
}

fn inflation_plus_policy() -> CategoryPolicy {
    CategoryPolicy::new(GrowthType::InflationPlus)
}

fn fixed_policy() -> CategoryPolicy {
    CategoryPolicy::new(GrowthType::Fixed)
}

/// Growth policy for every operating cost category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostGrowthPolicy {
    /// General inflation rate
    pub general_inflation: Rate,
    /// Premium above inflation for `inflation_plus` categories
    #[serde(default)]
    pub inflation_premium: Rate,
    #[serde(default = "appreciation_policy")]
    pub property_tax: CategoryPolicy,
    #[serde(default = "inflation_plus_policy")]
    pub insurance: CategoryPolicy,
    #[serde(default = "inflation_policy")]
    pub hoa: CategoryPolicy,
    #[serde(default = "fixed_policy")]
    pub pmi: CategoryPolicy,
    #[serde(default = "inflation_policy")]
    pub maintenance: CategoryPolicy,
    #[serde(default = "inflation_policy")]
    pub utilities: CategoryPolicy,
}

impl CostGrowthPolicy {
    /// Default category tags with the given inflation assumptions.
    pub fn with_inflation(general_inflation: Rate, inflation_premium: Rate) -> Self {
        Self {
            general_inflation,
            inflation_premium,
            property_tax: appreciation_policy(),
            insurance: inflation_plus_policy(),
            hoa: inflation_policy(),
            pmi: fixed_policy(),
            maintenance: inflation_policy(),
            utilities: inflation_policy(),
        }
    }

    pub fn policy_for(&self, category: CostCategory) -> &CategoryPolicy {
        match category {
            CostCategory::PropertyTax => &self.property_tax,
            CostCategory::Insurance => &self.insurance,
            CostCategory::Hoa => &self.hoa,
            CostCategory::Pmi => &self.pmi,
            CostCategory::Maintenance => &self.maintenance,
            CostCategory::Utilities => &self.utilities,
        }
    }
}

/// Year-one annual cost per category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseCosts {
    #[serde(default)]
    pub property_tax: Money,
    #[serde(default)]
    pub insurance: Money,
    #[serde(default)]
    pub hoa: Money,
    #[serde(default)]
    pub pmi: Money,
    #[serde(default)]
    pub maintenance: Money,
    #[serde(default)]
    pub utilities: Money,
}

impl BaseCosts {
    pub fn amount(&self, category: CostCategory) -> Money {
        match category {
            CostCategory::PropertyTax => self.property_tax,
            CostCategory::Insurance => self.insurance,
            CostCategory::Hoa => self.hoa,
            CostCategory::Pmi => self.pmi,
            CostCategory::Maintenance => self.maintenance,
            CostCategory::Utilities => self.utilities,
        }
    }
}

/// Inflated annual costs for one projection year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatingCosts {
    pub property_tax: Money,
    pub insurance: Money,
    pub hoa: Money,
    pub pmi: Money,
    pub maintenance: Money,
    pub utilities: Money,
    pub total: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Annual growth rate that applies to `category`.
pub fn effective_rate(
    category: CostCategory,
    policy: &CostGrowthPolicy,
    appreciation_rate: Rate,
) -> Rate {
    let category_policy = policy.policy_for(category);
    match category_policy.growth_type {
        GrowthType::Appreciation => appreciation_rate,
        GrowthType::Inflation => policy.general_inflation,
        GrowthType::InflationPlus => policy.general_inflation + policy.inflation_premium,
        GrowthType::Fixed => Decimal::ZERO,
        GrowthType::Custom => category_policy.custom_rate,
        GrowthType::Unknown => policy.general_inflation,
    }
}

/// Cost in `year` (1-indexed): base * (1 + rate)^(year - 1). Year 1 returns the base.
pub fn cost_at_year(base_cost: Money, rate: Rate, year: Year) -> Money {
    base_cost * compound_factor(rate, year.saturating_sub(1))
}

/// PMI is charged in every year before the removal year.
pub fn pmi_still_required(year: Year, pmi_removal_year: Option<Year>) -> bool {
    match pmi_removal_year {
        Some(removal) => year < removal,
        None => true,
    }
}

/// Cost for one category, applying the PMI removal rule.
pub fn category_cost_at_year(
    category: CostCategory,
    base: &BaseCosts,
    policy: &CostGrowthPolicy,
    appreciation_rate: Rate,
    year: Year,
    pmi_removal_year: Option<Year>,
) -> Money {
    let base_cost = base.amount(category);
    if category == CostCategory::Pmi {
        // PMI is a flat premium on the original loan until it is cancelled.
        return if pmi_still_required(year, pmi_removal_year) {
            base_cost
        } else {
            Decimal::ZERO
        };
    }
    let rate = effective_rate(category, policy, appreciation_rate);
    cost_at_year(base_cost, rate, year)
}

/// All inflated operating costs for `year`.
pub fn project_costs(
    base: &BaseCosts,
    policy: &CostGrowthPolicy,
    appreciation_rate: Rate,
    year: Year,
    pmi_removal_year: Option<Year>,
) -> OperatingCosts {
    let cost = |category| {
        category_cost_at_year(category, base, policy, appreciation_rate, year, pmi_removal_year)
    };

    let property_tax = cost(CostCategory::PropertyTax);
    let insurance = cost(CostCategory::Insurance);
    let hoa = cost(CostCategory::Hoa);
    let pmi = cost(CostCategory::Pmi);
    let maintenance = cost(CostCategory::Maintenance);
    let utilities = cost(CostCategory::Utilities);

    OperatingCosts {
        property_tax,
        insurance,
        hoa,
        pmi,
        maintenance,
        utilities,
        total: property_tax + insurance + hoa + pmi + maintenance + utilities,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
