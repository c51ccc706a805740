//! Token-level validator: the sandbox in front of the evaluator.
//!
//! A two-state machine (`ExpectOperand` / `ExpectOperator`) checks that
//! every binary operator has an operand on both sides; parenthesis depth
//! is tracked alongside. Reaching the end of the stream in
//! `ExpectOperator` at depth zero is the only accepting state.

use crate::error::ExpressionError;
use crate::token::Token;

/// Mathematical functions the vocabulary admits. `log` is base 10,
/// `ln` natural.
pub const WHITELISTED_FUNCTIONS: [&str; 6] = ["exp", "sqrt", "sin", "cos", "log", "ln"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectOperand,
    /// An operand just completed; an operator or closing paren may follow.
    ExpectOperator,
    /// A whitelisted function name was read; only `(` may follow.
    ExpectFunctionParen,
}

/// Validates a token stream against the declared parameters and the
/// independent variable. Only validated streams may reach the AST builder.
pub fn validate(
    tokens: &[Token],
    parameter_names: &[String],
    independent: &str,
) -> Result<(), ExpressionError> {
    if tokens.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let mut state = State::ExpectOperand;
    let mut depth = 0usize;
    let mut saw_independent = false;

    for token in tokens {
        match (state, token) {
            (State::ExpectOperand, Token::Number(_)) => state = State::ExpectOperator,
            (State::ExpectOperand, Token::Ident(name)) => {
                // Parameters and the independent shadow function names.
                if name == independent {
                    saw_independent = true;
                    state = State::ExpectOperator;
                } else if parameter_names.iter().any(|p| p == name) {
                    state = State::ExpectOperator;
                } else if WHITELISTED_FUNCTIONS.contains(&name.as_str()) {
                    state = State::ExpectFunctionParen;
                } else {
                    return Err(ExpressionError::UnknownIdentifier(name.clone()));
                }
            }
            (State::ExpectOperand, Token::LParen) => depth += 1,
            (State::ExpectOperand, Token::Op(_)) => {
                return Err(ExpressionError::OperatorUnmatched);
            }
            (State::ExpectOperand, Token::RParen) => {
                return Err(ExpressionError::ParenthesesMismatched);
            }

            (State::ExpectOperator, Token::Op(_)) => state = State::ExpectOperand,
            (State::ExpectOperator, Token::RParen) => {
                if depth == 0 {
                    return Err(ExpressionError::ParenthesesMismatched);
                }
                depth -= 1;
            }
            (State::ExpectOperator, Token::Number(_) | Token::Ident(_) | Token::LParen) => {
                // Two operands in a row, e.g. "2 x" or "x(".
                return Err(ExpressionError::OperatorUnmatched);
            }

            (State::ExpectFunctionParen, Token::LParen) => {
                depth += 1;
                state = State::ExpectOperand;
            }
            (State::ExpectFunctionParen, _) => {
                return Err(ExpressionError::OperatorUnmatched);
            }
        }
    }

    match state {
        State::ExpectOperator => {}
        State::ExpectOperand => return Err(ExpressionError::OperatorUnmatched),
        State::ExpectFunctionParen => return Err(ExpressionError::OperatorUnmatched),
    }
    if depth != 0 {
        return Err(ExpressionError::ParenthesesMismatched);
    }
    if !saw_independent {
        return Err(ExpressionError::IndependentMissing(independent.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    fn check(expression: &str) -> Result<(), ExpressionError> {
        let parameters = vec!["a".to_string(), "b".to_string()];
        validate(&tokenize(expression), &parameters, "x")
    }

    #[test]
    fn accepts_well_formed_expressions() {
        for good in [
            "a*x+b",
            "(a + b) / x",
            "exp(a*x)",
            "a / (1 + exp(b*ln(x)))",
            "sin(x) * cos(x)",
            "1e-7 + x",
        ] {
            assert!(check(good).is_ok(), "{good}");
        }
    }

    #[test]
    fn rejects_the_counterexample_list() {
        assert_eq!(check(""), Err(ExpressionError::Empty));
        assert_eq!(check("x+"), Err(ExpressionError::OperatorUnmatched));
        assert_eq!(check("+x"), Err(ExpressionError::OperatorUnmatched));
        assert_eq!(check("(x+1"), Err(ExpressionError::ParenthesesMismatched));
        assert_eq!(check("x+)"), Err(ExpressionError::ParenthesesMismatched));
        assert_eq!(check("x*+1"), Err(ExpressionError::OperatorUnmatched));
        assert_eq!(
            check("2*foo(x)"),
            Err(ExpressionError::UnknownIdentifier("foo".to_string()))
        );
        assert_eq!(check("sin(x"), Err(ExpressionError::ParenthesesMismatched));
    }

    #[test]
    fn requires_the_independent() {
        assert_eq!(
            check("a+b"),
            Err(ExpressionError::IndependentMissing("x".to_string()))
        );
    }

    #[test]
    fn bare_function_name_is_rejected() {
        assert_eq!(check("exp + x"), Err(ExpressionError::OperatorUnmatched));
    }

    #[test]
    fn injection_attempt_names_the_first_foreign_identifier() {
        let result = check("__import__('os').system('rm -rf /')");
        assert_eq!(
            result,
            Err(ExpressionError::UnknownIdentifier("__import__".to_string()))
        );
    }
}
