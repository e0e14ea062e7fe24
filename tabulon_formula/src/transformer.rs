//! Drives the grammar front-end's parse tree into [`TreeBuilder`] events.
//!
//! The walk is post-order: operands are emitted before the operator that
//! consumes them, so the builder's stack discipline lines up with the
//! grammar without any lookahead.

use crate::ast::{BinaryOperator, TreeBuilder, UnaryOperator};
use crate::FormulaException;
use tabulon_parser::raw_parser::Expression;

pub(crate) fn lower_expression(
    expression: &Expression,
    builder: &mut TreeBuilder,
) -> Result<(), FormulaException> {
    match expression {
        Expression::Literal(lexeme) => {
            builder.push_literal(lexeme.clone());
            Ok(())
        }
        Expression::Cell(name) => builder.push_cell(name),
        Expression::Parens(content) => {
            lower_expression(content, builder)?;
            builder.wrap_parens();
            Ok(())
        }
        Expression::UnaryPlus(operand) => {
            lower_expression(operand, builder)?;
            builder.apply_unary(UnaryOperator::Plus);
            Ok(())
        }
        Expression::UnaryMinus(operand) => {
            lower_expression(operand, builder)?;
            builder.apply_unary(UnaryOperator::Minus);
            Ok(())
        }
        Expression::Add(lhs, rhs) => lower_binary(lhs, rhs, BinaryOperator::Add, builder),
        Expression::Subtract(lhs, rhs) => lower_binary(lhs, rhs, BinaryOperator::Sub, builder),
        Expression::Multiply(lhs, rhs) => lower_binary(lhs, rhs, BinaryOperator::Mul, builder),
        Expression::Divide(lhs, rhs) => lower_binary(lhs, rhs, BinaryOperator::Div, builder),
    }
}

fn lower_binary(
    lhs: &Expression,
    rhs: &Expression,
    op: BinaryOperator,
    builder: &mut TreeBuilder,
) -> Result<(), FormulaException> {
    lower_expression(lhs, builder)?;
    lower_expression(rhs, builder)?;
    builder.apply_binary(op);

    Ok(())
}
