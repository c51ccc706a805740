use thiserror::Error;

/// Rejections from the expression validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,

    #[error("parentheses are mismatched")]
    ParenthesesMismatched,

    #[error("operator lacks an operand")]
    OperatorUnmatched,

    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("independent variable {0} does not appear in the expression")]
    IndependentMissing(String),
}

#[derive(Debug, Error)]
pub enum FitError {
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error("fewer data points ({points}) than parameters ({parameters})")]
    InsufficientData { points: usize, parameters: usize },

    #[error("fit failed to converge: {message}")]
    FitFailed { message: String },
}
