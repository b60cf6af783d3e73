use rust_decimal::Decimal;
use thiserror::Error;

/// Failures surfaced by the validating entry points and the TVM solvers.
///
/// Degenerate arithmetic inside a projection (zero rates, zero investment,
/// a loan retired mid-year) is never an error; it resolves to a documented
/// fallback value instead.
#[derive(Debug, Error)]
pub enum PropertyFinanceError {
    /// An assumption bundle that cannot describe a real purchase
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    /// Cash flows or rates with no economic solution (e.g. IRR with no sign change)
    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    /// Input or output that could not cross the JSON boundary
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PropertyFinanceError {
    fn from(e: serde_json::Error) -> Self {
        PropertyFinanceError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_names_the_field() {
        let err = PropertyFinanceError::InvalidInput {
            field: "down_payment".into(),
            reason: "Down payment cannot exceed the purchase price".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("down_payment"));
        assert!(msg.contains("purchase price"));
    }

    #[test]
    fn test_serde_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: PropertyFinanceError = parse.into();
        assert!(matches!(err, PropertyFinanceError::SerializationError(_)));
    }
}
