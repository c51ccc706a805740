//! Expression tokenizer.
//!
//! The vocabulary is deliberately small: four binary operators,
//! parentheses, numeric literals, and identifier atoms. Any run of
//! characters that is none of those still becomes an atom, so that the
//! validator can name it in an `UnknownIdentifier` rejection instead of
//! the tokenizer failing anonymously.

/// Binary operators of the expression vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    Op(BinOp),
    LParen,
    RParen,
}

fn is_atom_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '+' | '-' | '*' | '/' | '(' | ')')
}

/// Splits an expression into tokens. Atoms that parse as numbers become
/// `Number`, everything else becomes `Ident` for the validator to judge.
pub fn tokenize(expression: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();
    while let Some(&ch) = chars.peek() {
        match ch {
            ch if ch.is_whitespace() => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Op(BinOp::Add));
            }
            '-' => {
                chars.next();
                tokens.push(Token::Op(BinOp::Sub));
            }
            '*' => {
                chars.next();
                tokens.push(Token::Op(BinOp::Mul));
            }
            '/' => {
                chars.next();
                tokens.push(Token::Op(BinOp::Div));
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            _ => {
                let mut atom = String::new();
                while let Some(&ch) = chars.peek() {
                    if is_atom_char(ch) {
                        atom.push(ch);
                        chars.next();
                        continue;
                    }
                    // Signed exponents: the '-' in "1e-7" belongs to the
                    // literal, not the operator vocabulary.
                    let in_exponent = matches!(ch, '+' | '-')
                        && atom.ends_with(['e', 'E'])
                        && atom.starts_with(|c: char| c.is_ascii_digit() || c == '.');
                    if in_exponent {
                        atom.push(ch);
                        chars.next();
                        continue;
                    }
                    break;
                }
                match atom.parse::<f64>() {
                    Ok(number) => tokens.push(Token::Number(number)),
                    Err(_) => tokens.push(Token::Ident(atom)),
                }
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_a_simple_expression() {
        let tokens = tokenize("a*x + 2.5");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a".to_string()),
                Token::Op(BinOp::Mul),
                Token::Ident("x".to_string()),
                Token::Op(BinOp::Add),
                Token::Number(2.5),
            ]
        );
    }

    #[test]
    fn foreign_atoms_survive_as_identifiers() {
        let tokens = tokenize("__import__('os')");
        assert_eq!(tokens[0], Token::Ident("__import__".to_string()));
        assert_eq!(tokens[1], Token::LParen);
        assert_eq!(tokens[2], Token::Ident("'os'".to_string()));
    }

    #[test]
    fn signed_exponents_stay_in_the_literal() {
        assert_eq!(tokenize("1e-7"), vec![Token::Number(1e-7)]);
        assert_eq!(tokenize("2.5E+3"), vec![Token::Number(2.5e3)]);
        // A '-' after an identifier ending in 'e' is still subtraction.
        assert_eq!(
            tokenize("slope-1"),
            vec![
                Token::Ident("slope".to_string()),
                Token::Op(BinOp::Sub),
                Token::Number(1.0),
            ]
        );
    }
}
