//! A single grid cell: raw text, an optional compiled formula, a lazily
//! memoized value, and this cell's two ends of the dependency graph.

use crate::sheet::Sheet;
use std::cell::RefCell;
use std::collections::HashSet;
use std::mem;
use tabulon_formula::formula::{Formula, HandlingResult};
use tabulon_formula::location::Position;
use tabulon_formula::value::CellValue;

const ESCAPE_SIGN: char = '\'';

/// One cell of a sheet. Mutated only through the owning [`Sheet`], which
/// keeps the dependency edges and memoized values coherent.
#[derive(Debug, Default)]
pub struct Cell {
    text: String,
    formula: Option<Formula>,
    value: RefCell<Option<CellValue>>,
    // Positions of cells this formula reads.
    precedents: HashSet<Position>,
    // Positions of cells whose formulas read this one.
    dependents: HashSet<Position>,
}

impl Cell {
    pub(crate) fn new() -> Cell {
        Default::default()
    }

    /// The raw cell text. For formula cells this is `=` plus the canonical
    /// expression, kept in sync through every structural edit.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn formula(&self) -> Option<&Formula> {
        self.formula.as_ref()
    }

    /// Cells this cell's formula currently reads.
    pub fn precedents(&self) -> &HashSet<Position> {
        &self.precedents
    }

    /// Cells whose formulas currently read this cell.
    pub fn dependents(&self) -> &HashSet<Position> {
        &self.dependents
    }

    /// The formula's live referenced positions, `(row, col)`-sorted.
    /// Empty for plain-text cells.
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.formula
            .as_ref()
            .map(|formula| formula.referenced_cells())
            .unwrap_or_default()
    }

    /// The cell's value, computed on first read and memoized until
    /// invalidated. The fill mutates only the cache, so the read is
    /// idempotent and pure as far as callers can observe.
    pub fn value(&self, sheet: &Sheet) -> CellValue {
        {
            let cached = self.value.borrow();
            if let Some(value) = cached.as_ref() {
                return value.clone();
            }
        }

        let computed = match &self.formula {
            Some(formula) => match formula.evaluate(sheet) {
                Ok(number) => CellValue::Number(number),
                Err(e) => CellValue::Error(e),
            },
            None => match self.text.strip_prefix(ESCAPE_SIGN) {
                Some(escaped) => CellValue::Text(escaped.to_string()),
                None => CellValue::Text(self.text.clone()),
            },
        };

        *self.value.borrow_mut() = Some(computed.clone());
        computed
    }

    /// Drops the memoized value. Returns whether there was one to drop,
    /// which is what bounds the sheet's transitive invalidation walk.
    pub(crate) fn invalidate(&self) -> bool {
        self.value.borrow_mut().take().is_some()
    }

    pub(crate) fn set_formula(&mut self, formula: Formula) {
        self.text = format!("={}", formula.expression());
        self.formula = Some(formula);
        self.value = RefCell::new(None);
    }

    pub(crate) fn set_plain_text(&mut self, text: String) {
        self.text = text;
        self.formula = None;
        self.value = RefCell::new(None);
    }

    pub(crate) fn set_precedents(&mut self, precedents: HashSet<Position>) {
        self.precedents = precedents;
    }

    pub(crate) fn take_precedents(&mut self) -> HashSet<Position> {
        mem::take(&mut self.precedents)
    }

    pub(crate) fn add_dependent(&mut self, pos: Position) {
        self.dependents.insert(pos);
    }

    pub(crate) fn remove_dependent(&mut self, pos: Position) {
        self.dependents.remove(&pos);
    }

    pub(crate) fn clear_edges(&mut self) {
        self.precedents.clear();
        self.dependents.clear();
    }

    pub(crate) fn handle_inserted_rows(&mut self, before: i32, count: i32) -> bool {
        let result = self
            .formula
            .as_mut()
            .map(|formula| formula.handle_inserted_rows(before, count));

        self.absorb(result)
    }

    pub(crate) fn handle_inserted_cols(&mut self, before: i32, count: i32) -> bool {
        let result = self
            .formula
            .as_mut()
            .map(|formula| formula.handle_inserted_cols(before, count));

        self.absorb(result)
    }

    pub(crate) fn handle_deleted_rows(&mut self, first: i32, count: i32) -> bool {
        let result = self
            .formula
            .as_mut()
            .map(|formula| formula.handle_deleted_rows(first, count));

        self.absorb(result)
    }

    pub(crate) fn handle_deleted_cols(&mut self, first: i32, count: i32) -> bool {
        let result = self
            .formula
            .as_mut()
            .map(|formula| formula.handle_deleted_cols(first, count));

        self.absorb(result)
    }

    /// Folds a formula's structural-edit report into this cell: renamed
    /// references refresh the text, lost references additionally require
    /// the sheet to invalidate caches transitively.
    fn absorb(&mut self, result: Option<HandlingResult>) -> bool {
        match result {
            None | Some(HandlingResult::NothingChanged) => false,
            Some(HandlingResult::ReferencesRenamedOnly) => {
                self.refresh_text();
                false
            }
            Some(HandlingResult::ReferencesChanged) => {
                self.refresh_text();
                true
            }
        }
    }

    fn refresh_text(&mut self) {
        if let Some(formula) = &self.formula {
            self.text = format!("={}", formula.expression());
        }
    }
}
