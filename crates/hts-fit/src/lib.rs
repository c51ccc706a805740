//! Symbolic curve fitting.
//!
//! User-supplied function strings are validated by a token-level state
//! machine before anything is built from them; the validator is the
//! sandbox. Validated expressions compile to an AST over a closed
//! vocabulary (four binary operators, six whitelisted functions, declared
//! parameters, one independent variable, numeric literals) and are fitted
//! to (x, y) data by Levenberg-Marquardt least squares.

pub mod ast;
pub mod error;
pub mod fit;
pub mod token;
pub mod validate;

pub use ast::CompiledExpression;
pub use error::{ExpressionError, FitError};
pub use fit::{FitResult, curve_fit, r_square};
pub use token::{BinOp, Token, tokenize};
pub use validate::{WHITELISTED_FUNCTIONS, validate};

/// Compiles a validated expression. The token stream is validated first;
/// unvalidated strings never reach the AST builder.
pub fn compile(
    expression: &str,
    parameter_names: &[String],
    independent: &str,
) -> Result<CompiledExpression, ExpressionError> {
    let tokens = tokenize(expression);
    validate(&tokens, parameter_names, independent)?;
    ast::build(&tokens, parameter_names, independent)
}

/// Evaluates `expression` at each x with the given parameter values.
pub fn evaluate(
    expression: &str,
    parameter_values: &[f64],
    parameter_names: &[String],
    independent: &str,
    x: &[f64],
) -> Result<Vec<f64>, ExpressionError> {
    let compiled = compile(expression, parameter_names, independent)?;
    Ok(x.iter().map(|&xi| compiled.eval(parameter_values, xi)).collect())
}

/// Fits `expression` to (x, y) by non-linear least squares, starting from
/// `initial` parameter values.
pub fn fit(
    expression: &str,
    parameter_names: &[String],
    independent: &str,
    x: &[f64],
    y: &[f64],
    initial: &[f64],
) -> Result<FitResult, FitError> {
    let compiled = compile(expression, parameter_names, independent)?;
    curve_fit(|params, xi| compiled.eval(params, xi), initial, x, y)
}
