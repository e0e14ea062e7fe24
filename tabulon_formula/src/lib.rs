//! The formula layer of Tabulon.
//!
//! Provides the value types shared across the workspace (positions, sizes,
//! cell values, in-formula errors), the shared mutable cell-reference slots
//! that let one structural edit update every expression leaf naming the same
//! cell, the expression tree itself, and the [`Formula`](formula::Formula)
//! facade the sheet installs on cells.

pub mod ast;
pub mod formula;
pub mod location;
pub mod refer;
pub mod value;

mod transformer;

pub use crate::formula::{Formula, HandlingResult};

use thiserror::Error;

/// Raised for formula text the engine cannot turn into a usable expression
/// tree: syntax the grammar rejects, or a cell name outside the sheet
/// limits. Carries the underlying message.
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct FormulaException(pub String);
