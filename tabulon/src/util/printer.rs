use crate::{Position, Sheet};
use prettytable::{Row, Table};

/// A utility to print the Sheet.
/// WARNING: Not intended to have a stable output. Use for debugging purposes only.
pub fn print_sheet(sheet: &Sheet) {
    let mut table = Table::new();
    let size = sheet.printable_size();

    for r in 0..size.rows {
        let mut cells = Vec::new();

        for c in 0..size.cols {
            let content = sheet
                .cell(Position::new(r, c))
                .map(|cell| match cell.formula() {
                    None => format!("{}", cell.value(sheet)),
                    Some(_) => format!("{}  :  {}", cell.value(sheet), cell.text()),
                })
                .unwrap_or_default();

            cells.push(prettytable::Cell::new(&content));
        }

        table.add_row(Row::new(cells));
    }

    table.printstd();
}
