//! # Dice Formula Evaluator
//!
//! Parses formulas such as `2d6+3`, `d3*10` or `-(1d6 - 2) / 2`, rolls every
//! dice term, substitutes the rolled sums into the arithmetic and evaluates it
//! with normal precedence.
//!
//! ## Grammar
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | 'x' | '/') unary)*
//! unary   := '-' unary | primary
//! primary := NUMBER ('d' NUMBER)? | 'd' NUMBER | '(' expr ')'
//! ```
//!
//! `x`, `X` and `×` are read as `*`, matching the rulebook's `D3x10` style.
//! Every other letter apart from `d` is rejected.
//!
//! The whole formula is parsed before any die is rolled, so an invalid
//! formula never consumes randomness. All arithmetic is checked `i64`;
//! `/` truncates toward zero.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use thiserror::Error;
use underhive_shared::constants::{MAX_DICE_PER_TERM, MAX_DIE_SIDES};

/// Longest formula accepted, in characters.
pub const MAX_FORMULA_LENGTH: usize = 200;

/// Errors produced while parsing or evaluating a formula.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiceError {
    /// Nothing to roll.
    #[error("formula is empty")]
    Empty,

    /// Formula exceeds [`MAX_FORMULA_LENGTH`].
    #[error("formula is longer than {max} characters")]
    TooLong {
        /// Allowed length.
        max: usize,
    },

    /// A character that is neither a digit, `d`, an operator nor a parenthesis.
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character.
        ch: char,
        /// 1-based column.
        position: usize,
    },

    /// A valid token in an invalid place, e.g. `2**3` or `4+/2`.
    #[error("unexpected '{found}' at position {position}")]
    UnexpectedToken {
        /// Token text.
        found: String,
        /// 1-based column.
        position: usize,
    },

    /// The formula stopped where an operand was expected.
    #[error("formula ends unexpectedly")]
    UnexpectedEnd,

    /// A `(` without its `)`.
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    /// `0dM`.
    #[error("a dice term needs at least one die")]
    ZeroDice,

    /// `Nd0`.
    #[error("dice need at least one side")]
    ZeroSides,

    /// More than [`MAX_DICE_PER_TERM`] dice in one term.
    #[error("too many dice: {count} (max {max})")]
    TooManyDice {
        /// Requested dice.
        count: u64,
        /// Allowed dice.
        max: u32,
    },

    /// More than [`MAX_DIE_SIDES`] sides.
    #[error("too many sides: {sides} (max {max})")]
    TooManySides {
        /// Requested sides.
        sides: u64,
        /// Allowed sides.
        max: u32,
    },

    /// A literal that does not fit in 64 bits.
    #[error("number too large at position {position}")]
    NumberTooLarge {
        /// 1-based column.
        position: usize,
    },

    /// `x / 0` after substitution.
    #[error("division by zero")]
    DivisionByZero,

    /// Result left the `i64` range.
    #[error("arithmetic overflow")]
    Overflow,
}

// ============================================================================
// Results
// ============================================================================

/// One rolled `NdM` term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiceTerm {
    /// Normalised notation, e.g. `2d6`.
    pub notation: String,
    /// Number of dice rolled.
    pub count: u32,
    /// Sides per die.
    pub sides: u32,
    /// Individual results, in roll order.
    pub rolls: Vec<u32>,
    /// Sum of `rolls`.
    pub subtotal: i64,
}

/// Everything a roll produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollOutcome {
    /// The formula as given (whitespace removed).
    pub formula: String,
    /// Every dice term, left to right.
    pub terms: Vec<DiceTerm>,
    /// The formula with each dice term replaced by its subtotal.
    pub expression: String,
    /// Final value.
    pub total: i64,
}

impl fmt::Display for RollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rolls: Vec<String> = self
            .terms
            .iter()
            .map(|t| format!("{} {:?}", t.notation, t.rolls))
            .collect();
        if rolls.is_empty() {
            write!(f, "{} = {}", self.expression, self.total)
        } else {
            write!(
                f,
                "Rolls: {}, {} = {}",
                rolls.join(", "),
                self.expression,
                self.total
            )
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Rolls a formula with an entropy-seeded RNG.
///
/// # Errors
///
/// Returns a [`DiceError`] describing why the formula was rejected.
pub fn roll_formula(formula: &str) -> Result<RollOutcome, DiceError> {
    roll_formula_with(formula, &mut StdRng::from_entropy())
}

/// Rolls a formula with the given RNG.
///
/// # Errors
///
/// Returns a [`DiceError`] describing why the formula was rejected.
pub fn roll_formula_with<R: Rng>(
    formula: &str,
    rng: &mut R,
) -> Result<RollOutcome, DiceError> {
    let (compact, expr) = parse(formula)?;
    let mut terms = Vec::new();
    let mut expression = String::new();
    let total = eval(&expr, rng, &mut terms, &mut expression)?;
    Ok(RollOutcome {
        formula: compact,
        terms,
        expression,
        total,
    })
}

/// Checks a formula without rolling it.
///
/// # Errors
///
/// Returns the same [`DiceError`] a roll would.
pub fn validate_formula(formula: &str) -> Result<(), DiceError> {
    parse(formula).map(|_| ())
}

// ============================================================================
// Tokenizer
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token {
    Number(u64),
    Dice,
    Plus,
    Minus,
    Star,
    Slash,
    Open,
    Close,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Dice => f.write_str("d"),
            Self::Plus => f.write_str("+"),
            Self::Minus => f.write_str("-"),
            Self::Star => f.write_str("*"),
            Self::Slash => f.write_str("/"),
            Self::Open => f.write_str("("),
            Self::Close => f.write_str(")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, DiceError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().enumerate().peekable();

    while let Some((i, ch)) = chars.next() {
        let position = i + 1;
        let token = match ch {
            c if c.is_whitespace() => continue,
            '0'..='9' => {
                let mut value = u64::from(ch.to_digit(10).unwrap_or(0));
                while let Some(&(_, next)) = chars.peek() {
                    let Some(digit) = next.to_digit(10) else { break };
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(u64::from(digit)))
                        .ok_or(DiceError::NumberTooLarge { position })?;
                    chars.next();
                }
                Token::Number(value)
            }
            'd' | 'D' => Token::Dice,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' | 'x' | 'X' | '×' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::Open,
            ')' => Token::Close,
            _ => return Err(DiceError::UnexpectedCharacter { ch, position }),
        };
        tokens.push((token, position));
    }

    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Expr {
    Number(i64),
    Dice { count: u32, sides: u32 },
    Neg(Box<Expr>),
    Group(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let item = self.tokens.get(self.pos).copied();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn expr(&mut self) -> Result<Expr, DiceError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.peek().and_then(|t| match t {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            _ => None,
        }) {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, DiceError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek().and_then(|t| match t {
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            _ => None,
        }) {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, DiceError> {
        if self.peek() == Some(Token::Minus) {
            self.pos += 1;
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, DiceError> {
        match self.next() {
            Some((Token::Number(n), position)) => {
                if self.peek() == Some(Token::Dice) {
                    self.pos += 1;
                    let sides = self.sides()?;
                    return Ok(Expr::Dice {
                        count: dice_count(n)?,
                        sides,
                    });
                }
                let value = i64::try_from(n).map_err(|_| DiceError::NumberTooLarge { position })?;
                Ok(Expr::Number(value))
            }
            Some((Token::Dice, _)) => Ok(Expr::Dice {
                count: 1,
                sides: self.sides()?,
            }),
            Some((Token::Open, _)) => {
                let inner = self.expr()?;
                match self.next() {
                    Some((Token::Close, _)) => Ok(Expr::Group(Box::new(inner))),
                    _ => Err(DiceError::UnbalancedParentheses),
                }
            }
            Some((token, position)) => Err(DiceError::UnexpectedToken {
                found: token.to_string(),
                position,
            }),
            None => Err(DiceError::UnexpectedEnd),
        }
    }

    fn sides(&mut self) -> Result<u32, DiceError> {
        match self.next() {
            Some((Token::Number(0), _)) => Err(DiceError::ZeroSides),
            Some((Token::Number(n), _)) => u32::try_from(n)
                .ok()
                .filter(|s| *s <= MAX_DIE_SIDES)
                .ok_or(DiceError::TooManySides {
                    sides: n,
                    max: MAX_DIE_SIDES,
                }),
            Some((token, position)) => Err(DiceError::UnexpectedToken {
                found: token.to_string(),
                position,
            }),
            None => Err(DiceError::UnexpectedEnd),
        }
    }
}

fn dice_count(n: u64) -> Result<u32, DiceError> {
    if n == 0 {
        return Err(DiceError::ZeroDice);
    }
    u32::try_from(n)
        .ok()
        .filter(|c| *c <= MAX_DICE_PER_TERM)
        .ok_or(DiceError::TooManyDice {
            count: n,
            max: MAX_DICE_PER_TERM,
        })
}

/// Parses a formula into its compact text and syntax tree.
fn parse(formula: &str) -> Result<(String, Expr), DiceError> {
    if formula.chars().count() > MAX_FORMULA_LENGTH {
        return Err(DiceError::TooLong {
            max: MAX_FORMULA_LENGTH,
        });
    }
    let tokens = tokenize(formula)?;
    if tokens.is_empty() {
        return Err(DiceError::Empty);
    }

    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    if let Some((token, position)) = parser.next() {
        return Err(match token {
            Token::Close => DiceError::UnbalancedParentheses,
            _ => DiceError::UnexpectedToken {
                found: token.to_string(),
                position,
            },
        });
    }

    let compact = formula.chars().filter(|c| !c.is_whitespace()).collect();
    Ok((compact, expr))
}

// ============================================================================
// Evaluation
// ============================================================================

fn eval<R: Rng>(
    expr: &Expr,
    rng: &mut R,
    terms: &mut Vec<DiceTerm>,
    out: &mut String,
) -> Result<i64, DiceError> {
    match expr {
        Expr::Number(n) => {
            out.push_str(&n.to_string());
            Ok(*n)
        }
        Expr::Dice { count, sides } => {
            let rolls: Vec<u32> = (0..*count).map(|_| rng.gen_range(1..=*sides)).collect();
            let subtotal: i64 = rolls.iter().map(|r| i64::from(*r)).sum();
            out.push_str(&subtotal.to_string());
            terms.push(DiceTerm {
                notation: format!("{count}d{sides}"),
                count: *count,
                sides: *sides,
                rolls,
                subtotal,
            });
            Ok(subtotal)
        }
        Expr::Neg(inner) => {
            out.push('-');
            eval(inner, rng, terms, out)?
                .checked_neg()
                .ok_or(DiceError::Overflow)
        }
        Expr::Group(inner) => {
            out.push('(');
            let value = eval(inner, rng, terms, out)?;
            out.push(')');
            Ok(value)
        }
        Expr::Binary(op, lhs, rhs) => {
            let l = eval(lhs, rng, terms, out)?;
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            let r = eval(rhs, rng, terms, out)?;
            match op {
                BinOp::Add => l.checked_add(r).ok_or(DiceError::Overflow),
                BinOp::Sub => l.checked_sub(r).ok_or(DiceError::Overflow),
                BinOp::Mul => l.checked_mul(r).ok_or(DiceError::Overflow),
                BinOp::Div if r == 0 => Err(DiceError::DivisionByZero),
                BinOp::Div => l.checked_div(r).ok_or(DiceError::Overflow),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_one_d_one_is_always_one() {
        let mut rng = rng();
        for _ in 0..100 {
            let outcome = roll_formula_with("1d1", &mut rng).unwrap();
            assert_eq!(outcome.total, 1);
            assert_eq!(outcome.terms[0].rolls, vec![1]);
        }
    }

    #[test]
    fn test_two_d_six_plus_three_in_range() {
        let mut rng = rng();
        for _ in 0..1000 {
            let outcome = roll_formula_with("2d6+3", &mut rng).unwrap();
            assert!((5..=15).contains(&outcome.total), "total {}", outcome.total);
            assert_eq!(outcome.terms.len(), 1);
            assert_eq!(outcome.terms[0].rolls.len(), 2);
            assert_eq!(outcome.total, outcome.terms[0].subtotal + 3);
        }
    }

    #[test]
    fn test_bogus_is_an_error() {
        assert!(matches!(
            roll_formula("bogus"),
            Err(DiceError::UnexpectedCharacter { ch: 'b', position: 1 })
        ));
    }

    #[test]
    fn test_precedence() {
        let outcome = roll_formula_with("2+3*4", &mut rng()).unwrap();
        assert_eq!(outcome.total, 14);
        assert_eq!(outcome.expression, "2 + 3 * 4");

        let outcome = roll_formula_with("(2+3)*4", &mut rng()).unwrap();
        assert_eq!(outcome.total, 20);
        assert_eq!(outcome.expression, "(2 + 3) * 4");
    }

    #[test]
    fn test_unary_minus_and_division() {
        assert_eq!(roll_formula_with("-7/2", &mut rng()).unwrap().total, -3);
        assert_eq!(roll_formula_with("10--2", &mut rng()).unwrap().total, 12);
    }

    #[test]
    fn test_implicit_single_die_and_case() {
        let outcome = roll_formula_with("D3 * 10", &mut rng()).unwrap();
        assert_eq!(outcome.terms[0].notation, "1d3");
        assert!([10, 20, 30].contains(&outcome.total));
        assert_eq!(outcome.formula, "D3*10");
    }

    #[test]
    fn test_substituted_expression() {
        let outcome = roll_formula_with("1d1 + 2d1", &mut rng()).unwrap();
        assert_eq!(outcome.expression, "1 + 2");
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.terms.len(), 2);
    }

    #[test]
    fn test_rejects_disallowed_operators() {
        assert!(matches!(
            validate_formula("2**3"),
            Err(DiceError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            validate_formula("5%2"),
            Err(DiceError::UnexpectedCharacter { ch: '%', .. })
        ));
    }

    #[test]
    fn test_rulebook_multiplication() {
        for formula in ["D3x10", "d3X10", "d3×10", "d3*10"] {
            let outcome = roll_formula_with(formula, &mut rng()).unwrap();
            assert!([10, 20, 30].contains(&outcome.total), "{formula}");
            assert_eq!(outcome.expression, format!("{} * 10", outcome.terms[0].subtotal));
        }
        assert!(matches!(
            validate_formula("2d6y3"),
            Err(DiceError::UnexpectedCharacter { ch: 'y', position: 4 })
        ));
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(validate_formula("   "), Err(DiceError::Empty));
        assert_eq!(validate_formula("(1+2"), Err(DiceError::UnbalancedParentheses));
        assert_eq!(validate_formula("1+2)"), Err(DiceError::UnbalancedParentheses));
        assert_eq!(validate_formula("3+"), Err(DiceError::UnexpectedEnd));
        assert_eq!(validate_formula("2d"), Err(DiceError::UnexpectedEnd));
        assert_eq!(validate_formula("0d6"), Err(DiceError::ZeroDice));
        assert_eq!(validate_formula("2d0"), Err(DiceError::ZeroSides));
        assert!(matches!(
            validate_formula("1000d6"),
            Err(DiceError::TooManyDice { count: 1000, .. })
        ));
        assert!(matches!(
            validate_formula("99999999999999999999"),
            Err(DiceError::NumberTooLarge { .. })
        ));
    }

    #[test]
    fn test_evaluation_errors() {
        assert_eq!(
            roll_formula_with("1d6/0", &mut rng()),
            Err(DiceError::DivisionByZero)
        );
        assert_eq!(
            roll_formula_with("9223372036854775807+1", &mut rng()),
            Err(DiceError::Overflow)
        );
    }

    #[test]
    fn test_same_seed_same_rolls() {
        let a = roll_formula_with("4d6", &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let b = roll_formula_with("4d6", &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }
}
