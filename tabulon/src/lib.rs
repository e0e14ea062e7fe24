//! `tabulon` is a spreadsheet computation core: a sparse grid of cells
//! holding text or formulas, kept coherent under edits, structural
//! mutations and lazy evaluation.
//!
//! A quick example:
//!
//! ```rust
//! use tabulon::{CellValue, Position, Sheet};
//!
//! let mut sheet = Sheet::new();
//!
//! sheet.set_cell(Position::new(0, 0), "=1+2*3").unwrap();
//! sheet.set_cell(Position::new(0, 1), "=A1/2").unwrap();
//!
//! let cell = sheet.cell(Position::new(0, 0)).unwrap();
//! assert_eq!(cell.text(), "=1+2*3");
//! assert_eq!(cell.value(&sheet), CellValue::Number(7.0));
//!
//! assert_eq!(sheet.value(Position::new(0, 1)), Some(CellValue::Number(3.5)));
//! ```
//!
//! Formulas see other cells through their canonical positions; inserting or
//! deleting rows and columns rewrites every affected formula, turning
//! references to deleted cells into permanent `#REF!` markers. Values are
//! memoized per cell and invalidated transitively when anything upstream
//! changes. The whole structure is single-owner and single-threaded.

mod cell;
mod sheet;

pub mod util;

pub use crate::cell::Cell;
pub use crate::sheet::Sheet;

pub use tabulon_formula::formula::{Formula, HandlingResult};
pub use tabulon_formula::location::{Position, Size, MAX_COLS, MAX_ROWS};
pub use tabulon_formula::value::{CellValue, FormulaError, ValueSource};
pub use tabulon_formula::FormulaException;

use thiserror::Error;

/// Errors surfaced by sheet operations. A returned error means the sheet
/// was not modified.
#[derive(Error, Debug, Clone)]
pub enum ErrorKind {
    #[error("invalid position: {0:?}")]
    InvalidPosition(Position),

    #[error("table too big")]
    TableTooBig,

    #[error("circular dependency through {0}")]
    CircularDependency(Position),

    #[error("formula error: {0}")]
    Formula(#[from] FormulaException),
}
