//! The expression tree: algebraic nodes, the post-order stack builder, and
//! the canonical minimally-parenthesized rendering.
//!
//! Parentheses are normalized at construction time, so a finished tree
//! prints in exactly one form and that form re-parses to an equivalent
//! tree. The rule: a grouping survives only where erasing it could change
//! the value of the surrounding expression.

use crate::location::Position;
use crate::refer::{RefHandle, RefTable};
use crate::value::{CellValue, FormulaError, ValueSource};
use crate::FormulaException;
use std::fmt;
use std::fmt::{Display, Formatter};

type NodeBox = Box<Node>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
}

impl UnaryOperator {
    pub fn symbol(&self) -> char {
        match self {
            UnaryOperator::Plus => '+',
            UnaryOperator::Minus => '-',
        }
    }
}

impl BinaryOperator {
    pub fn symbol(&self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Sub => '-',
            BinaryOperator::Mul => '*',
            BinaryOperator::Div => '/',
        }
    }
}

/// Whether a parenthesized binary child keeps its grouping under a given
/// parent, possibly depending on which operand slot it sits in.
#[derive(Clone, Copy, PartialEq)]
enum Keep {
    Always,
    Right,
    Never,
}

// Indexed by the child's operator, in BinaryOperator declaration order.
// A negated sum changes value without its grouping; a negated product
// does not.
const UNARY_RESTRICTIONS: [Keep; 4] = [Keep::Always, Keep::Always, Keep::Never, Keep::Never];

// Indexed by [parent][child]. Subtraction and division lose information
// when the grouping to their right is erased; multiplication distributes
// over nothing, so additive children always keep theirs.
const BINARY_RESTRICTIONS: [[Keep; 4]; 4] = [
    [Keep::Never, Keep::Never, Keep::Never, Keep::Never],
    [Keep::Right, Keep::Right, Keep::Never, Keep::Never],
    [Keep::Always, Keep::Always, Keep::Never, Keep::Never],
    [Keep::Always, Keep::Always, Keep::Right, Keep::Right],
];

/// One node of a parsed formula.
#[derive(Clone, Debug)]
pub enum Node {
    /// A numeric literal, kept as its lexeme and parsed on evaluation.
    Literal(String),
    /// A leaf naming another cell through a shared reference slot.
    CellRef(RefHandle),
    Parens(NodeBox),
    Unary(UnaryOperator, NodeBox),
    Binary(BinaryOperator, NodeBox, NodeBox),
}

impl Node {
    /// Wraps `content` in a grouping node. Groupings around leaves and
    /// other groupings carry no information and are never created.
    pub fn parens(content: Node) -> Node {
        match content {
            Node::Literal(_) | Node::CellRef(_) | Node::Parens(_) => content,
            _ => Node::Parens(Box::new(content)),
        }
    }

    pub fn unary(op: UnaryOperator, operand: Node) -> Node {
        Node::Unary(op, Box::new(Self::simplify_unary_parens(operand)))
    }

    pub fn binary(op: BinaryOperator, lhs: Node, rhs: Node) -> Node {
        Node::Binary(
            op,
            Box::new(Self::simplify_binary_parens(op, lhs, true)),
            Box::new(Self::simplify_binary_parens(op, rhs, false)),
        )
    }

    fn simplify_unary_parens(child: Node) -> Node {
        match child {
            Node::Parens(content) => {
                if let Node::Binary(child_op, _, _) = &*content {
                    if UNARY_RESTRICTIONS[*child_op as usize] == Keep::Always {
                        return Node::Parens(content);
                    }
                }

                *content
            }
            other => other,
        }
    }

    fn simplify_binary_parens(parent_op: BinaryOperator, child: Node, left: bool) -> Node {
        match child {
            Node::Parens(content) => {
                if let Node::Binary(child_op, _, _) = &*content {
                    let keep = BINARY_RESTRICTIONS[parent_op as usize][*child_op as usize];

                    if keep == Keep::Always || (keep == Keep::Right && !left) {
                        return Node::Parens(content);
                    }
                }

                *content
            }
            other => other,
        }
    }

    /// Evaluates this subtree against `sheet`, post-order, short-circuiting
    /// on the first error a subexpression produces.
    pub fn evaluate<S: ValueSource>(&self, sheet: &S) -> Result<f64, FormulaError> {
        match self {
            Node::Literal(lexeme) => lexeme.parse().map_err(|_| FormulaError::Value),
            Node::CellRef(handle) => match handle.position() {
                None => Err(FormulaError::Ref),
                Some(pos) => match sheet.value_at(pos) {
                    None => Ok(0.0),
                    Some(CellValue::Number(n)) => Ok(n),
                    Some(CellValue::Error(e)) => Err(e),
                    Some(CellValue::Text(text)) => {
                        if text.is_empty() {
                            Ok(0.0)
                        } else {
                            text.parse().map_err(|_| FormulaError::Value)
                        }
                    }
                },
            },
            Node::Parens(content) => content.evaluate(sheet),
            Node::Unary(op, operand) => {
                let value = operand.evaluate(sheet)?;

                Ok(match op {
                    UnaryOperator::Plus => value,
                    UnaryOperator::Minus => -value,
                })
            }
            Node::Binary(op, lhs, rhs) => {
                let lhs_value = lhs.evaluate(sheet)?;
                let rhs_value = rhs.evaluate(sheet)?;

                let result = match op {
                    BinaryOperator::Add => lhs_value + rhs_value,
                    BinaryOperator::Sub => lhs_value - rhs_value,
                    BinaryOperator::Mul => lhs_value * rhs_value,
                    BinaryOperator::Div => lhs_value / rhs_value,
                };

                // Division by zero and overflow both land here.
                if result.is_finite() {
                    Ok(result)
                } else {
                    Err(FormulaError::Div0)
                }
            }
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal(lexeme) => write!(f, "{}", lexeme),
            Node::CellRef(handle) => match handle.position() {
                Some(pos) => write!(f, "{}", pos),
                None => write!(f, "{}", FormulaError::Ref),
            },
            Node::Parens(content) => write!(f, "({})", content),
            Node::Unary(op, operand) => write!(f, "{}{}", op.symbol(), operand),
            Node::Binary(op, lhs, rhs) => write!(f, "{}{}{}", lhs, op.symbol(), rhs),
        }
    }
}

/// A finished expression tree plus the reference table its leaves share.
#[derive(Debug)]
pub struct Tree {
    root: Node,
    refs: RefTable,
}

impl Tree {
    pub fn evaluate<S: ValueSource>(&self, sheet: &S) -> Result<f64, FormulaError> {
        self.root.evaluate(sheet)
    }

    pub fn build_expression(&self) -> String {
        self.root.to_string()
    }

    pub fn referenced_cells(&self) -> Vec<Position> {
        self.refs.referenced_cells()
    }

    pub fn handle_inserted_rows(&mut self, before: i32, count: i32) -> usize {
        self.refs.handle_inserted_rows(before, count)
    }

    pub fn handle_inserted_cols(&mut self, before: i32, count: i32) -> usize {
        self.refs.handle_inserted_cols(before, count)
    }

    pub fn handle_deleted_rows(&mut self, first: i32, count: i32) -> (usize, usize) {
        self.refs.handle_deleted_rows(first, count)
    }

    pub fn handle_deleted_cols(&mut self, first: i32, count: i32) -> (usize, usize) {
        self.refs.handle_deleted_cols(first, count)
    }
}

/// Stack machine fed by a post-order event stream: operands push, operators
/// pop their operands and push the combined node.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    stack: Vec<Node>,
    refs: RefTable,
}

impl TreeBuilder {
    pub fn new() -> TreeBuilder {
        Default::default()
    }

    pub fn push_literal(&mut self, lexeme: String) {
        self.stack.push(Node::Literal(lexeme));
    }

    /// Resolves `name` to a position and pushes a leaf sharing the slot of
    /// any earlier mention of the same cell. Names outside the sheet limits
    /// cannot become references and fail the build.
    pub fn push_cell(&mut self, name: &str) -> Result<(), FormulaException> {
        let position = Position::from_string(name);

        if !position.is_valid() {
            return Err(FormulaException(format!("invalid position: {}", name)));
        }

        let handle = self.refs.get_or_insert(position);
        self.stack.push(Node::CellRef(handle));

        Ok(())
    }

    pub fn wrap_parens(&mut self) {
        let content = self.pop();
        self.stack.push(Node::parens(content));
    }

    pub fn apply_unary(&mut self, op: UnaryOperator) {
        let operand = self.pop();
        self.stack.push(Node::unary(op, operand));
    }

    pub fn apply_binary(&mut self, op: BinaryOperator) {
        let rhs = self.pop();
        let lhs = self.pop();
        self.stack.push(Node::binary(op, lhs, rhs));
    }

    /// Pops the root. The event stream must have described exactly one
    /// complete expression.
    pub fn finish(mut self) -> Tree {
        let root = self.pop();

        Tree {
            root,
            refs: self.refs,
        }
    }

    fn pop(&mut self) -> Node {
        self.stack
            .pop()
            .unwrap_or_else(|| panic!("Builder event stream ended with a missing operand"))
    }
}
