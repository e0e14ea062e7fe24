/// Measures row insertion and deletion on sheets where every second column
/// is a formula that has to be rewritten by the shift.
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use lazy_static::lazy_static;
use rand::Rng;
use tabulon::{Position, Sheet};

lazy_static! {
    static ref MUTATION_CASES: Vec<usize> = vec![10, 100, 1_000];
}

fn generate_random_num() -> String {
    let value = rand::thread_rng().gen_range(0..100);

    value.to_string()
}

fn build_sheet(rows: usize) -> Sheet {
    let mut sheet = Sheet::new();

    for row in 0..rows {
        sheet
            .set_cell(Position::new(row as i32, 0), &generate_random_num())
            .unwrap();
        sheet
            .set_cell(Position::new(row as i32, 1), &format!("=A{}*2", row + 1))
            .unwrap();
    }

    sheet
}

fn structural_mutation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_delete_rows");

    for rows in MUTATION_CASES.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(rows), rows, |b, &rows| {
            b.iter_batched(
                || build_sheet(rows),
                |mut sheet| {
                    sheet.insert_rows(0, 1).unwrap();
                    sheet.delete_rows(0, 1);

                    sheet
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, structural_mutation_benchmark);
criterion_main!(benches);
