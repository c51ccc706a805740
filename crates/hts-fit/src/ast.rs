//! Expression AST over the closed vocabulary, built from validated token
//! streams only.

use crate::error::ExpressionError;
use crate::token::{BinOp, Token};
use crate::validate::WHITELISTED_FUNCTIONS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Exp,
    Sqrt,
    Sin,
    Cos,
    Log,
    Ln,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "exp" => Some(Self::Exp),
            "sqrt" => Some(Self::Sqrt),
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "log" => Some(Self::Log),
            "ln" => Some(Self::Ln),
            _ => None,
        }
    }

    fn apply(self, value: f64) -> f64 {
        match self {
            Self::Exp => value.exp(),
            Self::Sqrt => value.sqrt(),
            Self::Sin => value.sin(),
            Self::Cos => value.cos(),
            Self::Log => value.log10(),
            Self::Ln => value.ln(),
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Number(f64),
    Param(usize),
    Independent,
    Call(Func, Box<Node>),
    Binary(BinOp, Box<Node>, Box<Node>),
}

/// A validated, compiled expression ready for evaluation.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    root: Node,
    parameter_count: usize,
}

impl CompiledExpression {
    /// Evaluates at one x. `params` must match the declared parameter list.
    pub fn eval(&self, params: &[f64], x: f64) -> f64 {
        debug_assert_eq!(params.len(), self.parameter_count);
        eval_node(&self.root, params, x)
    }
}

fn eval_node(node: &Node, params: &[f64], x: f64) -> f64 {
    match node {
        Node::Number(n) => *n,
        Node::Param(index) => params.get(*index).copied().unwrap_or(f64::NAN),
        Node::Independent => x,
        Node::Call(func, argument) => func.apply(eval_node(argument, params, x)),
        Node::Binary(op, left, right) => {
            let l = eval_node(left, params, x);
            let r = eval_node(right, params, x);
            match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
            }
        }
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
    parameter_names: &'a [String],
    independent: &'a str,
}

/// Builds the AST. Callers must have validated `tokens`; a malformed
/// stream still fails closed with a typed error rather than panicking.
pub fn build(
    tokens: &[Token],
    parameter_names: &[String],
    independent: &str,
) -> Result<CompiledExpression, ExpressionError> {
    let mut parser = Parser {
        tokens,
        position: 0,
        parameter_names,
        independent,
    };
    let root = parser.expression()?;
    if parser.position != tokens.len() {
        return Err(ExpressionError::OperatorUnmatched);
    }
    Ok(CompiledExpression {
        root,
        parameter_count: parameter_names.len(),
    })
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Returns the next token by value; borrowing it would keep `self`
    /// borrowed across the callers' recursive descent.
    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<Node, ExpressionError> {
        let mut left = self.term()?;
        while let Some(Token::Op(op @ (BinOp::Add | BinOp::Sub))) = self.peek() {
            let op = *op;
            self.position += 1;
            let right = self.term()?;
            left = Node::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<Node, ExpressionError> {
        let mut left = self.factor()?;
        while let Some(Token::Op(op @ (BinOp::Mul | BinOp::Div))) = self.peek() {
            let op = *op;
            self.position += 1;
            let right = self.factor()?;
            left = Node::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// factor := number | identifier | function '(' expression ')' | '(' expression ')'
    fn factor(&mut self) -> Result<Node, ExpressionError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Node::Number(n)),
            Some(Token::Ident(name)) => {
                if name == self.independent {
                    return Ok(Node::Independent);
                }
                if let Some(index) = self.parameter_names.iter().position(|p| *p == name) {
                    return Ok(Node::Param(index));
                }
                match Func::from_name(&name) {
                    Some(func) => {
                        self.expect_lparen()?;
                        let argument = self.expression()?;
                        self.expect_rparen()?;
                        Ok(Node::Call(func, Box::new(argument)))
                    }
                    None => {
                        debug_assert!(
                            !WHITELISTED_FUNCTIONS.contains(&name.as_str()),
                            "whitelist and Func::from_name disagree"
                        );
                        Err(ExpressionError::UnknownIdentifier(name))
                    }
                }
            }
            Some(Token::LParen) => {
                let inner = self.expression()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            _ => Err(ExpressionError::OperatorUnmatched),
        }
    }

    fn expect_lparen(&mut self) -> Result<(), ExpressionError> {
        match self.advance() {
            Some(Token::LParen) => Ok(()),
            _ => Err(ExpressionError::ParenthesesMismatched),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), ExpressionError> {
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            _ => Err(ExpressionError::ParenthesesMismatched),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    fn compile(expression: &str, parameters: &[&str]) -> CompiledExpression {
        let names: Vec<String> = parameters.iter().map(|s| s.to_string()).collect();
        build(&tokenize(expression), &names, "x").expect("build")
    }

    #[test]
    fn precedence_binds_multiplication_first() {
        let expr = compile("a + b*x", &["a", "b"]);
        assert_eq!(expr.eval(&[1.0, 2.0], 3.0), 7.0);
    }

    #[test]
    fn parentheses_override_precedence() {
        let expr = compile("(a + b)*x", &["a", "b"]);
        assert_eq!(expr.eval(&[1.0, 2.0], 3.0), 9.0);
    }

    #[test]
    fn function_calls_nest() {
        let expr = compile("exp(ln(x))", &[]);
        assert!((expr.eval(&[], 4.2) - 4.2).abs() < 1e-12);
    }

    #[test]
    fn declared_parameter_shadows_a_function_name() {
        // Resolution order is independent, then parameters, then the
        // function whitelist.
        let expr = compile("exp + x", &["exp"]);
        assert_eq!(expr.eval(&[2.0], 3.0), 5.0);
    }

    #[test]
    fn log_is_base_ten() {
        let expr = compile("log(x)", &[]);
        assert!((expr.eval(&[], 1000.0) - 3.0).abs() < 1e-12);
    }
}
