pub mod error;
pub mod time_value;
pub mod types;

pub mod financing;
pub mod income;
pub mod operating_costs;
pub mod tax;

pub mod projection;

pub mod analysis;

pub use error::PropertyFinanceError;
pub use types::*;

/// Standard result type for all property-finance operations
pub type PropertyFinanceResult<T> = Result<T, PropertyFinanceError>;
