//! The formula grammar, implemented as a cascade of `nom` combinators.
//!
//! Each precedence level gets its own public parser so that intermediate
//! levels stay individually testable. The cascade, loosest binding first:
//! binary `+ -`, binary `* /`, unary `+ -`, then atoms (parenthesized
//! expressions, cell names, numeric literals). All binary operators are
//! left-associative.

use nom::character::complete;

use nom::{branch, bytes, combinator, multi, sequence, IResult};
use std::fmt;
use std::fmt::{Display, Formatter};

type Expr = Box<Expression>;

/// Raw parse tree of a formula. Literals keep the lexeme exactly as typed
/// so downstream printing can reproduce the user's text.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    Literal(String),
    Cell(String),
    Parens(Expr),
    UnaryPlus(Expr),
    UnaryMinus(Expr),
    Add(Expr, Expr),
    Subtract(Expr, Expr),
    Multiply(Expr, Expr),
    Divide(Expr, Expr),
}

/// Reported when the input is not a well-formed formula. Carries the
/// front-end's message for the caller to append to its own error.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError(String);

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseError {}

pub fn surround_whitespace<'a, O, F>(inner: F) -> impl Fn(&'a str) -> IResult<&'a str, O>
where
    F: Fn(&'a str) -> IResult<&'a str, O>,
{
    sequence::delimited(complete::multispace0, inner, complete::multispace0)
}

/// Recognizes an unsigned numeric literal: digits, an optional fraction,
/// an optional exponent. Signs belong to the unary level.
pub fn parse_literal(raw: &str) -> IResult<&str, Expression> {
    let (rem, matched) = combinator::recognize(sequence::tuple((
        complete::digit1,
        combinator::opt(sequence::preceded(complete::char('.'), complete::digit1)),
        combinator::opt(sequence::tuple((
            complete::one_of("eE"),
            combinator::opt(complete::one_of("+-")),
            complete::digit1,
        ))),
    )))(raw)?;

    Ok((rem, Expression::Literal(String::from(matched))))
}

/// Recognizes an A1-style cell name: 1-3 uppercase letters followed by a
/// 1-5 digit row that does not start with zero. Range checking against the
/// sheet limits happens later, when the name is resolved to a position.
pub fn parse_cell_reference(raw: &str) -> IResult<&str, Expression> {
    let (rem, letters) =
        bytes::complete::take_while_m_n(1, 3, |c: char| c.is_ascii_uppercase())(raw)?;
    let (rem, digits) = combinator::verify(complete::digit1, |s: &str| {
        s.len() <= 5 && !s.starts_with('0')
    })(rem)?;

    Ok((rem, Expression::Cell(format!("{}{}", letters, digits))))
}

pub fn parens(raw: &str) -> IResult<&str, Expression> {
    let (rem, expr) = sequence::delimited(
        complete::char('('),
        surround_whitespace(base_expr),
        complete::char(')'),
    )(raw)?;

    Ok((rem, Expression::Parens(Box::new(expr))))
}

pub fn expr_level_atom(raw: &str) -> IResult<&str, Expression> {
    branch::alt((parens, parse_cell_reference, parse_literal))(raw)
}

pub fn expr_level_unary(raw: &str) -> IResult<&str, Expression> {
    let sign: IResult<&str, &str> =
        branch::alt((bytes::complete::tag("+"), bytes::complete::tag("-")))(raw);

    match sign {
        Ok((rem, matched)) => {
            let (rem, operand) = expr_level_unary(rem)?;

            let expr = match matched {
                "+" => Expression::UnaryPlus(Box::new(operand)),
                _ => Expression::UnaryMinus(Box::new(operand)),
            };

            Ok((rem, expr))
        }
        Err(_) => expr_level_atom(raw),
    }
}

pub fn expr_level_multiply_divide(raw: &str) -> IResult<&str, Expression> {
    let (rem, first) = expr_level_unary(raw)?;
    let (rem, rest) = multi::many0(sequence::tuple((
        surround_whitespace(branch::alt((
            bytes::complete::tag("*"),
            bytes::complete::tag("/"),
        ))),
        expr_level_unary,
    )))(rem)?;

    Ok((rem, fold_binary_ops(first, rest)))
}

pub fn expr_level_plus_minus(raw: &str) -> IResult<&str, Expression> {
    let (rem, first) = expr_level_multiply_divide(raw)?;
    let (rem, rest) = multi::many0(sequence::tuple((
        surround_whitespace(branch::alt((
            bytes::complete::tag("+"),
            bytes::complete::tag("-"),
        ))),
        expr_level_multiply_divide,
    )))(rem)?;

    Ok((rem, fold_binary_ops(first, rest)))
}

pub fn base_expr(raw: &str) -> IResult<&str, Expression> {
    expr_level_plus_minus(raw)
}

fn fold_binary_ops(first: Expression, rest: Vec<(&str, Expression)>) -> Expression {
    rest.into_iter().fold(first, |lhs, (op, rhs)| match op {
        "+" => Expression::Add(Box::new(lhs), Box::new(rhs)),
        "-" => Expression::Subtract(Box::new(lhs), Box::new(rhs)),
        "*" => Expression::Multiply(Box::new(lhs), Box::new(rhs)),
        "/" => Expression::Divide(Box::new(lhs), Box::new(rhs)),
        e => panic!("Unhandled operator type! {}", e),
    })
}

pub fn parse_expression(raw: &str) -> IResult<&str, Expression> {
    surround_whitespace(base_expr)(raw)
}

/// Parses an entire formula body (the text after the leading `=`).
/// Trailing garbage is a parse error, not a partial result.
pub fn parse_formula_text(raw: &str) -> Result<Expression, ParseError> {
    match combinator::all_consuming(parse_expression)(raw) {
        Ok((_, expr)) => Ok(expr),
        Err(e) => match e {
            nom::Err::Incomplete(_) => Err(ParseError("incomplete input".to_string())),
            _ => Err(ParseError(format!("invalid formula syntax: {:?}", e))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(val: &str) -> Box<Expression> {
        Box::new(Expression::Literal(val.to_string()))
    }

    fn cell(name: &str) -> Box<Expression> {
        Box::new(Expression::Cell(name.to_string()))
    }

    fn assert_is_err(raw: &str) {
        match parse_formula_text(raw) {
            Ok(res) => assert!(false, "Expected error for {:?}, got: {:?}", raw, res),
            Err(_) => assert!(true),
        }
    }

    #[test]
    fn trivial_test() {
        assert_eq!(parse_formula_text("1"), Ok(*lit("1")));
        assert_eq!(parse_formula_text("1.5"), Ok(*lit("1.5")));
        assert_eq!(parse_formula_text("2e10"), Ok(*lit("2e10")));
        assert_eq!(parse_formula_text("3.25E-2"), Ok(*lit("3.25E-2")));
        assert_eq!(parse_formula_text("A1"), Ok(*cell("A1")));
        assert_eq!(parse_formula_text("ZZZ99999"), Ok(*cell("ZZZ99999")));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_is_err("");
        assert_is_err("1+");
        assert_is_err("*2");
        assert_is_err("(1");
        assert_is_err("1)");
        assert_is_err("1.");
        assert_is_err("A0");
        assert_is_err("A123456");
        assert_is_err("AAAA1");
        assert_is_err("a1");
        assert_is_err("1 2");
        assert_is_err("A1B");
        assert_is_err("hello(1)");
    }

    #[test]
    fn trivial_operator_test() {
        assert_eq!(
            parse_formula_text("1+2"),
            Ok(Expression::Add(lit("1"), lit("2")))
        );
        assert_eq!(
            parse_formula_text("1+2-3"),
            Ok(Expression::Subtract(
                Box::new(Expression::Add(lit("1"), lit("2"))),
                lit("3")
            ))
        );
        assert_eq!(
            parse_formula_text("1/2/3"),
            Ok(Expression::Divide(
                Box::new(Expression::Divide(lit("1"), lit("2"))),
                lit("3")
            ))
        );
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse_formula_text("1+2*3"),
            Ok(Expression::Add(
                lit("1"),
                Box::new(Expression::Multiply(lit("2"), lit("3")))
            ))
        );
        assert_eq!(
            parse_formula_text("1*2+3"),
            Ok(Expression::Add(
                Box::new(Expression::Multiply(lit("1"), lit("2"))),
                lit("3")
            ))
        );
    }

    #[test]
    fn test_precedence_parens() {
        assert_eq!(
            parse_formula_text("(1+2)*3"),
            Ok(Expression::Multiply(
                Box::new(Expression::Parens(Box::new(Expression::Add(
                    lit("1"),
                    lit("2")
                )))),
                lit("3")
            ))
        );
    }

    #[test]
    fn test_unary_binds_tighter_than_binary() {
        assert_eq!(
            parse_formula_text("-1*2"),
            Ok(Expression::Multiply(
                Box::new(Expression::UnaryMinus(lit("1"))),
                lit("2")
            ))
        );
        assert_eq!(
            parse_formula_text("2*-3"),
            Ok(Expression::Multiply(
                lit("2"),
                Box::new(Expression::UnaryMinus(lit("3")))
            ))
        );
        assert_eq!(
            parse_formula_text("-1+2"),
            Ok(Expression::Add(
                Box::new(Expression::UnaryMinus(lit("1"))),
                lit("2")
            ))
        );
        assert_eq!(
            parse_formula_text("--1"),
            Ok(Expression::UnaryMinus(Box::new(Expression::UnaryMinus(
                lit("1")
            ))))
        );
        assert_eq!(
            parse_formula_text("+A1"),
            Ok(Expression::UnaryPlus(cell("A1")))
        );
    }

    #[test]
    fn test_whitespace() {
        assert_eq!(
            parse_formula_text(" 1 + B2 "),
            Ok(Expression::Add(lit("1"), cell("B2")))
        );
        assert_eq!(
            parse_formula_text("( 1 + 2 ) * 3"),
            Ok(Expression::Multiply(
                Box::new(Expression::Parens(Box::new(Expression::Add(
                    lit("1"),
                    lit("2")
                )))),
                lit("3")
            ))
        );
    }

    #[test]
    fn test_nested_parens() {
        assert_eq!(
            parse_formula_text("((1))"),
            Ok(Expression::Parens(Box::new(Expression::Parens(lit("1")))))
        );
    }
}
