//! The formula facade the sheet works with: parse once, then evaluate,
//! print canonically, enumerate referenced cells, and absorb structural
//! edits.

use crate::ast::{Tree, TreeBuilder};
use crate::location::Position;
use crate::transformer;
use crate::value::{FormulaError, ValueSource};
use crate::FormulaException;
use tabulon_parser::raw_parser;

/// What a structural edit did to a formula's references, in increasing
/// order of severity. `ReferencesRenamedOnly` leaves the formula's value
/// intact (everything it reads moved in lockstep); `ReferencesChanged`
/// means at least one reference was lost and memoized results built on it
/// are stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlingResult {
    NothingChanged,
    ReferencesRenamedOnly,
    ReferencesChanged,
}

/// A compiled cell formula.
#[derive(Debug)]
pub struct Formula {
    tree: Tree,
}

impl Formula {
    /// Parses the text after the leading `=`. Grammar rejections and
    /// out-of-range cell names both surface as [`FormulaException`].
    pub fn parse(expression: &str) -> Result<Formula, FormulaException> {
        let raw = raw_parser::parse_formula_text(expression)
            .map_err(|e| FormulaException(format!("parse error: {}", e)))?;

        let mut builder = TreeBuilder::new();
        transformer::lower_expression(&raw, &mut builder)?;

        Ok(Formula {
            tree: builder.finish(),
        })
    }

    pub fn evaluate<S: ValueSource>(&self, sheet: &S) -> Result<f64, FormulaError> {
        self.tree.evaluate(sheet)
    }

    /// The canonical expression, without the leading `=`.
    pub fn expression(&self) -> String {
        self.tree.build_expression()
    }

    /// Live referenced positions, `(row, col)`-sorted.
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.tree.referenced_cells()
    }

    pub fn handle_inserted_rows(&mut self, before: i32, count: i32) -> HandlingResult {
        Self::insert_result(self.tree.handle_inserted_rows(before, count))
    }

    pub fn handle_inserted_cols(&mut self, before: i32, count: i32) -> HandlingResult {
        Self::insert_result(self.tree.handle_inserted_cols(before, count))
    }

    pub fn handle_deleted_rows(&mut self, first: i32, count: i32) -> HandlingResult {
        Self::delete_result(self.tree.handle_deleted_rows(first, count))
    }

    pub fn handle_deleted_cols(&mut self, first: i32, count: i32) -> HandlingResult {
        Self::delete_result(self.tree.handle_deleted_cols(first, count))
    }

    fn insert_result(updated: usize) -> HandlingResult {
        if updated > 0 {
            HandlingResult::ReferencesRenamedOnly
        } else {
            HandlingResult::NothingChanged
        }
    }

    fn delete_result((deleted, updated): (usize, usize)) -> HandlingResult {
        if deleted > 0 {
            HandlingResult::ReferencesChanged
        } else if updated > 0 {
            HandlingResult::ReferencesRenamedOnly
        } else {
            HandlingResult::NothingChanged
        }
    }
}
