//! The sheet: sparse grid storage, the cell dependency graph, cycle
//! detection, cache invalidation and structural edits.
//!
//! Storage is a jagged row-major two-level structure. Either level may be
//! shorter than the logical sheet; absent cells are `None`. The dependency
//! graph lives in the cells themselves as position sets, symmetric by
//! invariant: `b` is in `a.precedents()` exactly when `a` is in
//! `b.dependents()`, and the graph stays acyclic because every formula
//! installation is preceded by a cycle check.

use crate::cell::Cell;
use crate::ErrorKind;
use std::collections::HashSet;
use std::convert::TryFrom;
use std::io;
use std::io::Write;
use tabulon_formula::formula::Formula;
use tabulon_formula::location::{Position, Size, MAX_COLS, MAX_ROWS};
use tabulon_formula::value::{CellValue, ValueSource};

/// A spreadsheet grid with formula semantics. All cell mutation goes
/// through the sheet so that graph edges and memoized values stay coherent.
#[derive(Debug, Default)]
pub struct Sheet {
    rows: Vec<Vec<Option<Cell>>>,
}

impl Sheet {
    pub fn new() -> Sheet {
        Default::default()
    }

    /// The cell at `pos`, if one has been materialized there.
    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        if !pos.is_valid() {
            return None;
        }

        self.rows
            .get(pos.row as usize)?
            .get(pos.col as usize)?
            .as_ref()
    }

    /// The value of the cell at `pos`, computing and memoizing it on
    /// demand. `None` when no cell exists there.
    pub fn value(&self, pos: Position) -> Option<CellValue> {
        self.cell(pos).map(|cell| cell.value(self))
    }

    /// Installs `text` at `pos`. Text starting with `=` is compiled as a
    /// formula; the cycle check runs before the sheet is touched, so a
    /// rejected edit leaves prior contents intact.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), ErrorKind> {
        if !pos.is_valid() {
            return Err(ErrorKind::InvalidPosition(pos));
        }

        if let Some(expression) = text.strip_prefix('=') {
            // Same formula text again: the tree would come out identical,
            // so just force a re-read.
            let identical = self.cell(pos).map_or(false, |cell| cell.text() == text);
            if identical {
                self.invalidate_transitive(pos);
                return Ok(());
            }

            let formula = Formula::parse(expression)?;
            let references = formula.referenced_cells();

            if self.creates_cycle(pos, &references) {
                return Err(ErrorKind::CircularDependency(pos));
            }

            self.materialize(pos);
            for target in &references {
                self.materialize(*target);
            }

            self.invalidate_transitive(pos);
            self.unhook_precedents(pos);

            let cell = self
                .cell_mut(pos)
                .expect("Cell must exist after materialization");
            cell.set_formula(formula);
            cell.set_precedents(references.iter().copied().collect());

            for target in references {
                let neighbor = self
                    .cell_mut(target)
                    .expect("Referenced cell must exist after materialization");
                neighbor.add_dependent(pos);
            }
        } else {
            self.materialize(pos);
            self.invalidate_transitive(pos);
            self.unhook_precedents(pos);

            self.cell_mut(pos)
                .expect("Cell must exist after materialization")
                .set_plain_text(text.to_string());
        }

        Ok(())
    }

    /// Removes the cell at `pos`. A cell other formulas still reference is
    /// kept as an empty-text slot (it evaluates as zero) so those formulas'
    /// caches keep getting invalidated through it; an unreferenced cell's
    /// slot reverts to `None`. Absent or out-of-range positions are a no-op.
    pub fn clear_cell(&mut self, pos: Position) {
        if self.cell(pos).is_none() {
            return;
        }

        self.invalidate_transitive(pos);
        self.unhook_precedents(pos);

        let cell = self
            .cell_mut(pos)
            .expect("Cell presence was checked above");

        if cell.dependents().is_empty() {
            self.rows[pos.row as usize][pos.col as usize] = None;
        } else {
            cell.set_plain_text(String::new());
        }
    }

    /// Inserts `count` empty rows before row index `before`, shifting every
    /// formula reference at or past it. No-op when `before` is beyond the
    /// current extent.
    pub fn insert_rows(&mut self, before: usize, count: usize) -> Result<(), ErrorKind> {
        if self.rows.len().saturating_add(count) > MAX_ROWS as usize {
            return Err(ErrorKind::TableTooBig);
        }

        if count == 0 || before > self.rows.len() {
            return Ok(());
        }

        let before_i = before as i32;
        let count_i = count as i32;

        for row in self.rows.iter_mut() {
            for slot in row.iter_mut() {
                if let Some(cell) = slot {
                    cell.handle_inserted_rows(before_i, count_i);
                }
            }
        }

        self.rows
            .splice(before..before, (0..count).map(|_| Vec::new()));
        self.rebuild_edges();

        Ok(())
    }

    /// Column analogue of [`Sheet::insert_rows`]. The size check uses the
    /// widest existing row.
    pub fn insert_cols(&mut self, before: usize, count: usize) -> Result<(), ErrorKind> {
        let width = self.width();

        if width.saturating_add(count) > MAX_COLS as usize {
            return Err(ErrorKind::TableTooBig);
        }

        if count == 0 || before > width {
            return Ok(());
        }

        let before_i = before as i32;
        let count_i = count as i32;

        for row in self.rows.iter_mut() {
            for slot in row.iter_mut() {
                if let Some(cell) = slot {
                    cell.handle_inserted_cols(before_i, count_i);
                }
            }
        }

        for row in self.rows.iter_mut() {
            if before <= row.len() {
                row.splice(before..before, (0..count).map(|_| None));
            }
        }

        self.rebuild_edges();

        Ok(())
    }

    /// Deletes the row band `[first, first+count)`. References into the
    /// band become permanent `#REF!`; references past it shift up and keep
    /// tracking the cells they pointed at.
    pub fn delete_rows(&mut self, first: usize, count: usize) {
        if count == 0 {
            return;
        }

        if first < self.rows.len() {
            let end = first.saturating_add(count).min(self.rows.len());
            self.rows.drain(first..end);
        }

        let first_i = i32::try_from(first).unwrap_or(i32::MAX);
        let count_i = i32::try_from(count).unwrap_or(i32::MAX);

        let mut dirty = Vec::new();
        for (r, row) in self.rows.iter_mut().enumerate() {
            for (c, slot) in row.iter_mut().enumerate() {
                if let Some(cell) = slot {
                    if cell.handle_deleted_rows(first_i, count_i) {
                        dirty.push(Position::new(r as i32, c as i32));
                    }
                }
            }
        }

        self.rebuild_edges();

        for pos in dirty {
            self.invalidate_transitive(pos);
        }
    }

    /// Column analogue of [`Sheet::delete_rows`], applied per row.
    pub fn delete_cols(&mut self, first: usize, count: usize) {
        if count == 0 {
            return;
        }

        for row in self.rows.iter_mut() {
            if first < row.len() {
                let end = first.saturating_add(count).min(row.len());
                row.drain(first..end);
            }
        }

        let first_i = i32::try_from(first).unwrap_or(i32::MAX);
        let count_i = i32::try_from(count).unwrap_or(i32::MAX);

        let mut dirty = Vec::new();
        for (r, row) in self.rows.iter_mut().enumerate() {
            for (c, slot) in row.iter_mut().enumerate() {
                if let Some(cell) = slot {
                    if cell.handle_deleted_cols(first_i, count_i) {
                        dirty.push(Position::new(r as i32, c as i32));
                    }
                }
            }
        }

        self.rebuild_edges();

        for pos in dirty {
            self.invalidate_transitive(pos);
        }
    }

    /// The smallest rectangle covering every cell with non-empty text.
    pub fn printable_size(&self) -> Size {
        let mut size = Size::default();

        for (r, row) in self.rows.iter().enumerate() {
            for (c, slot) in row.iter().enumerate() {
                if let Some(cell) = slot {
                    if !cell.text().is_empty() {
                        size.rows = size.rows.max(r as i32 + 1);
                        size.cols = size.cols.max(c as i32 + 1);
                    }
                }
            }
        }

        size
    }

    /// Writes the printable rectangle's values: rows separated by newline,
    /// cells by tab, errors as their display strings, absent cells empty.
    pub fn print_values<W: Write>(&self, output: &mut W) -> io::Result<()> {
        self.print_with(output, |sheet, cell| cell.value(sheet).to_string())
    }

    /// Writes the printable rectangle's raw texts in the same layout.
    pub fn print_texts<W: Write>(&self, output: &mut W) -> io::Result<()> {
        self.print_with(output, |_, cell| cell.text().to_string())
    }

    fn print_with<W, F>(&self, output: &mut W, render: F) -> io::Result<()>
    where
        W: Write,
        F: Fn(&Sheet, &Cell) -> String,
    {
        let size = self.printable_size();

        for r in 0..size.rows {
            for c in 0..size.cols {
                if c > 0 {
                    write!(output, "\t")?;
                }

                if let Some(cell) = self.cell(Position::new(r, c)) {
                    write!(output, "{}", render(self, cell))?;
                }
            }

            writeln!(output)?;
        }

        Ok(())
    }

    fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        if !pos.is_valid() {
            return None;
        }

        self.rows
            .get_mut(pos.row as usize)?
            .get_mut(pos.col as usize)?
            .as_mut()
    }

    fn width(&self) -> usize {
        self.rows.iter().map(|row| row.len()).max().unwrap_or(0)
    }

    /// Grows the jagged storage to cover `pos` and creates an empty cell
    /// there if the slot is vacant.
    fn materialize(&mut self, pos: Position) {
        let (r, c) = (pos.row as usize, pos.col as usize);

        if self.rows.len() <= r {
            self.rows.resize_with(r + 1, Vec::new);
        }

        let row = &mut self.rows[r];
        if row.len() <= c {
            row.resize_with(c + 1, || None);
        }

        if row[c].is_none() {
            row[c] = Some(Cell::new());
        }
    }

    /// Would installing a formula with `references` at `target` close a
    /// loop? DFS through existing precedent edges; positions without a cell
    /// cannot participate.
    fn creates_cycle(&self, target: Position, references: &[Position]) -> bool {
        let mut stack: Vec<Position> = references.to_vec();
        let mut visited = HashSet::new();

        while let Some(pos) = stack.pop() {
            if pos == target {
                return true;
            }

            if !visited.insert(pos) {
                continue;
            }

            if let Some(cell) = self.cell(pos) {
                stack.extend(cell.precedents().iter().copied());
            }
        }

        false
    }

    /// Drops memoized values starting at `start` and walking dependents.
    /// A cell without a cache stops its branch: nothing cached downstream
    /// of it can exist, because caches are only filled after every
    /// precedent's cache is.
    fn invalidate_transitive(&self, start: Position) {
        let mut stack = vec![start];

        while let Some(pos) = stack.pop() {
            if let Some(cell) = self.cell(pos) {
                if cell.invalidate() {
                    stack.extend(cell.dependents().iter().copied());
                }
            }
        }
    }

    /// Detaches `pos` from everything its formula reads, both directions.
    fn unhook_precedents(&mut self, pos: Position) {
        let precedents = match self.cell_mut(pos) {
            Some(cell) => cell.take_precedents(),
            None => return,
        };

        for target in precedents {
            if let Some(neighbor) = self.cell_mut(target) {
                neighbor.remove_dependent(pos);
            }
        }
    }

    /// Recomputes every edge set from the formulas' current references.
    /// Structural edits move cells, so the position-keyed sets are
    /// recomputed wholesale instead of patched in place.
    fn rebuild_edges(&mut self) {
        let mut formula_references = Vec::new();

        for (r, row) in self.rows.iter().enumerate() {
            for (c, slot) in row.iter().enumerate() {
                if let Some(cell) = slot {
                    if cell.formula().is_some() {
                        formula_references
                            .push((Position::new(r as i32, c as i32), cell.referenced_cells()));
                    }
                }
            }
        }

        for row in self.rows.iter_mut() {
            for slot in row.iter_mut() {
                if let Some(cell) = slot {
                    cell.clear_edges();
                }
            }
        }

        for (pos, references) in formula_references {
            if let Some(cell) = self.cell_mut(pos) {
                cell.set_precedents(references.iter().copied().collect());
            }

            for target in references {
                self.materialize(target);
                self.cell_mut(target)
                    .expect("Referenced cell must exist after materialization")
                    .add_dependent(pos);
            }
        }
    }
}

impl ValueSource for Sheet {
    fn value_at(&self, pos: Position) -> Option<CellValue> {
        self.value(pos)
    }
}
