//! Cell values and the in-formula error category.
//!
//! Formula errors are *values*: they flow through evaluation and end up in
//! cells, they are never surfaced as `Err` by the sheet API.

use crate::location::Position;
use std::fmt;
use std::fmt::{Display, Formatter};

/// The three error categories a formula can evaluate to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormulaError {
    Value,
    Ref,
    Div0,
}

/// What a cell holds once read: a number, a piece of text, or an error
/// produced by its formula.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

/// The sheet as evaluation sees it: a lookup from position to the value of
/// the cell there, `None` when no cell exists at that position.
pub trait ValueSource {
    fn value_at(&self, pos: Position) -> Option<CellValue>;
}

impl FormulaError {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaError::Value => "#VALUE!",
            FormulaError::Ref => "#REF!",
            FormulaError::Div0 => "#DIV/0!",
        }
    }
}

impl Display for FormulaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}
