use clap::{App, Arg};
use rand::Rng;
use std::time::Instant;
use tabulon::util::printer;
use tabulon::{CellValue, Position, Sheet};

fn generate_random_num() -> String {
    let value = rand::thread_rng().gen_range(0..100);

    value.to_string()
}

fn main() {
    let matches = App::new("Tabulon bulk-operation timings")
        .version("0.1.0")
        .about("Fills a sheet with numbers and row totals, then times full evaluation and structural edits.")
        .arg(
            Arg::with_name("rows")
                .short("r")
                .long("rows")
                .help("Number of data rows")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("cols")
                .short("c")
                .long("cols")
                .help("Number of numeric columns per row")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("print")
                .short("p")
                .long("print")
                .help("Pretty-print the sheet afterwards (small sheets only)"),
        )
        .get_matches();

    let rows = matches
        .value_of("rows")
        .unwrap()
        .parse::<usize>()
        .expect("Rows should be a valid non-negative integer.");
    let cols = matches
        .value_of("cols")
        .unwrap()
        .parse::<usize>()
        .expect("Cols should be a valid positive integer.");
    assert!(cols > 0, "Need at least one numeric column per row.");

    let mut sheet = Sheet::new();

    let fill_start = Instant::now();
    for row in 0..rows {
        for col in 0..cols {
            sheet
                .set_cell(Position::new(row as i32, col as i32), &generate_random_num())
                .expect("Fill should succeed");
        }

        let total = (0..cols)
            .map(|col| Position::new(row as i32, col as i32).to_string())
            .collect::<Vec<_>>()
            .join("+");
        sheet
            .set_cell(Position::new(row as i32, cols as i32), &format!("={}", total))
            .expect("Total formula should parse");
    }
    println!(
        "fill: {} cells in {:?}",
        rows * (cols + 1),
        fill_start.elapsed()
    );

    let eval_start = Instant::now();
    let mut totals = 0;
    for row in 0..rows {
        if let Some(CellValue::Number(_)) = sheet.value(Position::new(row as i32, cols as i32)) {
            totals += 1;
        }
    }
    println!("evaluate: {} totals in {:?}", totals, eval_start.elapsed());

    let shift_start = Instant::now();
    sheet
        .insert_rows(0, 1)
        .expect("Insert within limits should succeed");
    sheet.delete_rows(0, 1);
    println!("insert+delete row: {:?}", shift_start.elapsed());

    if matches.is_present("print") {
        printer::print_sheet(&sheet);
    }
}
