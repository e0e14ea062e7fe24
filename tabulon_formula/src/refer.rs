//! Shared mutable cell-reference slots.
//!
//! Every expression leaf that names the same cell at parse time shares one
//! [`RefHandle`], so a row shift or a deletion is written once and observed
//! by every leaf. The slots are owned by the formula's [`RefTable`], keyed
//! by the coordinate they currently hold.

use crate::location::Position;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// A shared slot holding the position an expression leaf refers to.
/// `None` is the permanent reference-lost state: the cell the slot pointed
/// to was deleted, and the leaf renders and evaluates as `#REF!` forever.
#[derive(Clone, Debug)]
pub struct RefHandle(Rc<RefCell<Option<Position>>>);

impl RefHandle {
    fn new(pos: Position) -> RefHandle {
        RefHandle(Rc::new(RefCell::new(Some(pos))))
    }

    pub fn position(&self) -> Option<Position> {
        *self.0.borrow()
    }
}

/// Owns the distinct reference slots of one formula, keyed by row and then
/// column. Invariant: every handle in the table holds `Some` of exactly the
/// coordinate it is keyed under; handles that lose their referent leave the
/// key space (the leaves keep them alive through the shared pointer).
#[derive(Debug, Default)]
pub struct RefTable {
    slots: BTreeMap<i32, BTreeMap<i32, RefHandle>>,
}

impl RefTable {
    pub fn new() -> RefTable {
        Default::default()
    }

    /// Returns the slot for `pos`, interning a fresh one on first sight so
    /// repeated mentions of a cell share a single handle.
    pub fn get_or_insert(&mut self, pos: Position) -> RefHandle {
        self.slots
            .entry(pos.row)
            .or_insert_with(BTreeMap::new)
            .entry(pos.col)
            .or_insert_with(|| RefHandle::new(pos))
            .clone()
    }

    /// Live referenced coordinates in `(row, col)` order.
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.slots
            .iter()
            .flat_map(|(row, cols)| cols.keys().map(move |col| Position::new(*row, *col)))
            .collect()
    }

    /// Shifts every slot at or below `before` down the sheet by `count`
    /// rows. Returns how many live slots moved.
    pub fn handle_inserted_rows(&mut self, before: i32, count: i32) -> usize {
        let moved: Vec<i32> = self.slots.range(before..).map(|(row, _)| *row).collect();
        let mut updated = 0;

        // Rekey highest-first: every key moves up, so the slot above has
        // always been vacated already.
        for row in moved.into_iter().rev() {
            if let Some(cols) = self.slots.remove(&row) {
                for handle in cols.values() {
                    if let Some(pos) = handle.0.borrow_mut().as_mut() {
                        pos.row += count;
                        updated += 1;
                    }
                }

                self.slots.insert(row + count, cols);
            }
        }

        updated
    }

    /// Column analogue of [`RefTable::handle_inserted_rows`].
    pub fn handle_inserted_cols(&mut self, before: i32, count: i32) -> usize {
        let mut updated = 0;

        for cols in self.slots.values_mut() {
            let moved: Vec<i32> = cols.range(before..).map(|(col, _)| *col).collect();

            for col in moved.into_iter().rev() {
                if let Some(handle) = cols.remove(&col) {
                    if let Some(pos) = handle.0.borrow_mut().as_mut() {
                        pos.col += count;
                        updated += 1;
                    }

                    cols.insert(col + count, handle);
                }
            }
        }

        updated
    }

    /// Slots inside `[start, start+count)` lose their referent for good;
    /// slots past the band shift up by `count`. Returns
    /// `(lost_count, moved_count)` over live slots.
    pub fn handle_deleted_rows(&mut self, start: i32, count: i32) -> (usize, usize) {
        let end = start.saturating_add(count);
        let mut deleted = 0;
        let mut updated = 0;

        let doomed: Vec<i32> = self.slots.range(start..end).map(|(row, _)| *row).collect();
        for row in doomed {
            if let Some(cols) = self.slots.remove(&row) {
                for handle in cols.values() {
                    if handle.0.borrow_mut().take().is_some() {
                        deleted += 1;
                    }
                }
            }
        }

        // Rekey lowest-first: targets land in the band just vacated.
        let moved: Vec<i32> = self.slots.range(end..).map(|(row, _)| *row).collect();
        for row in moved {
            if let Some(cols) = self.slots.remove(&row) {
                for handle in cols.values() {
                    if let Some(pos) = handle.0.borrow_mut().as_mut() {
                        pos.row -= count;
                        updated += 1;
                    }
                }

                self.slots.insert(row - count, cols);
            }
        }

        (deleted, updated)
    }

    /// Column analogue of [`RefTable::handle_deleted_rows`].
    pub fn handle_deleted_cols(&mut self, start: i32, count: i32) -> (usize, usize) {
        let end = start.saturating_add(count);
        let mut deleted = 0;
        let mut updated = 0;

        for cols in self.slots.values_mut() {
            let doomed: Vec<i32> = cols.range(start..end).map(|(col, _)| *col).collect();
            for col in doomed {
                if let Some(handle) = cols.remove(&col) {
                    if handle.0.borrow_mut().take().is_some() {
                        deleted += 1;
                    }
                }
            }

            let moved: Vec<i32> = cols.range(end..).map(|(col, _)| *col).collect();
            for col in moved {
                if let Some(handle) = cols.remove(&col) {
                    if let Some(pos) = handle.0.borrow_mut().as_mut() {
                        pos.col -= count;
                        updated += 1;
                    }

                    cols.insert(col - count, handle);
                }
            }
        }

        (deleted, updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_shares_one_slot() {
        let mut table = RefTable::new();

        let first = table.get_or_insert(Position::new(2, 3));
        let second = table.get_or_insert(Position::new(2, 3));

        assert!(Rc::ptr_eq(&first.0, &second.0));
        assert_eq!(table.referenced_cells(), vec![Position::new(2, 3)]);
    }

    #[test]
    fn test_referenced_cells_sorted() {
        let mut table = RefTable::new();
        table.get_or_insert(Position::new(5, 0));
        table.get_or_insert(Position::new(0, 7));
        table.get_or_insert(Position::new(0, 2));

        assert_eq!(
            table.referenced_cells(),
            vec![
                Position::new(0, 2),
                Position::new(0, 7),
                Position::new(5, 0)
            ]
        );
    }

    #[test]
    fn test_inserted_rows_shift_slots() {
        let mut table = RefTable::new();
        let above = table.get_or_insert(Position::new(1, 0));
        let below = table.get_or_insert(Position::new(4, 0));

        let updated = table.handle_inserted_rows(2, 3);

        assert_eq!(updated, 1);
        assert_eq!(above.position(), Some(Position::new(1, 0)));
        assert_eq!(below.position(), Some(Position::new(7, 0)));
        assert_eq!(
            table.referenced_cells(),
            vec![Position::new(1, 0), Position::new(7, 0)]
        );
    }

    #[test]
    fn test_inserted_rows_adjacent_keys() {
        // Adjacent keys all move; highest-first rekeying must not clobber.
        let mut table = RefTable::new();
        let handles: Vec<_> = (0..4)
            .map(|row| table.get_or_insert(Position::new(row, 1)))
            .collect();

        let updated = table.handle_inserted_rows(0, 2);

        assert_eq!(updated, 4);
        for (row, handle) in handles.iter().enumerate() {
            assert_eq!(handle.position(), Some(Position::new(row as i32 + 2, 1)));
        }
    }

    #[test]
    fn test_deleted_rows_lose_and_shift() {
        let mut table = RefTable::new();
        let kept = table.get_or_insert(Position::new(0, 0));
        let lost = table.get_or_insert(Position::new(2, 0));
        let shifted = table.get_or_insert(Position::new(6, 0));

        let (deleted, updated) = table.handle_deleted_rows(2, 3);

        assert_eq!((deleted, updated), (1, 1));
        assert_eq!(kept.position(), Some(Position::new(0, 0)));
        assert_eq!(lost.position(), None);
        assert_eq!(shifted.position(), Some(Position::new(3, 0)));
        assert_eq!(
            table.referenced_cells(),
            vec![Position::new(0, 0), Position::new(3, 0)]
        );
    }

    #[test]
    fn test_deleted_rows_rekey_collision() {
        // Rows exactly `count` apart: ascending rekeying must keep both.
        let mut table = RefTable::new();
        let near = table.get_or_insert(Position::new(2, 0));
        let far = table.get_or_insert(Position::new(4, 0));

        let (deleted, updated) = table.handle_deleted_rows(0, 2);

        assert_eq!((deleted, updated), (0, 2));
        assert_eq!(near.position(), Some(Position::new(0, 0)));
        assert_eq!(far.position(), Some(Position::new(2, 0)));
        assert_eq!(
            table.referenced_cells(),
            vec![Position::new(0, 0), Position::new(2, 0)]
        );
    }

    #[test]
    fn test_deleted_cols() {
        let mut table = RefTable::new();
        let lost = table.get_or_insert(Position::new(0, 1));
        let shifted = table.get_or_insert(Position::new(0, 3));
        let other_row = table.get_or_insert(Position::new(2, 0));

        let (deleted, updated) = table.handle_deleted_cols(1, 1);

        assert_eq!((deleted, updated), (1, 1));
        assert_eq!(lost.position(), None);
        assert_eq!(shifted.position(), Some(Position::new(0, 2)));
        assert_eq!(other_row.position(), Some(Position::new(2, 0)));
    }

    #[test]
    fn test_inserted_cols() {
        let mut table = RefTable::new();
        let left = table.get_or_insert(Position::new(0, 0));
        let right = table.get_or_insert(Position::new(0, 2));

        let updated = table.handle_inserted_cols(1, 2);

        assert_eq!(updated, 1);
        assert_eq!(left.position(), Some(Position::new(0, 0)));
        assert_eq!(right.position(), Some(Position::new(0, 4)));
    }
}
