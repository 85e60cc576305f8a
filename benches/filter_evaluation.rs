//! Benchmarks for row filter evaluation
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mprobe_workshop::filter::{FilterEngine, RowPredicate, RowSource};
use mprobe_workshop::table::{CellValue, UnavailableReason};
use mprobe_workshop::types::{EmpiricalShape, FunctionShape};

const ID: usize = 0;
const SHAPE: usize = 1;
const EMPIRICAL: usize = 2;

/// Constraint-like rows: every third nonlinear, half of them not yet analysed
struct SyntheticTable {
    rows: usize,
}

impl RowSource for SyntheticTable {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cell(&self, row: usize, column: usize) -> CellValue {
        match column {
            ID => CellValue::Integer(row as i64),
            SHAPE if row % 3 == 0 => FunctionShape::Nonlinear.into(),
            SHAPE => FunctionShape::Linear.into(),
            EMPIRICAL if row % 2 == 0 => CellValue::Unavailable(UnavailableReason::NotComputed),
            EMPIRICAL => EmpiricalShape::AlmostConvex.into(),
            _ => CellValue::Empty,
        }
    }
}

fn bench_predicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("predicate_evaluation");

    for size in [1000, 10_000, 100_000].iter() {
        let table = SyntheticTable { rows: *size };
        let predicates = [
            ("equals", RowPredicate::equals(SHAPE, FunctionShape::Linear)),
            (
                "negated_equals",
                RowPredicate::equals(SHAPE, FunctionShape::Linear).negate(),
            ),
            (
                "equals_sentinels",
                RowPredicate::equals(EMPIRICAL, EmpiricalShape::AlmostConvex),
            ),
            (
                "membership",
                RowPredicate::membership(ID, (0..*size).rev().step_by(10)),
            ),
        ];

        group.throughput(Throughput::Elements(*size as u64));
        for (name, predicate) in predicates.iter() {
            group.bench_with_input(BenchmarkId::new(*name, size), &table, |b, table| {
                b.iter(|| {
                    (0..table.rows())
                        .filter(|&row| predicate.include(table, row))
                        .count()
                });
            });
        }
    }

    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_engine");
    let table = SyntheticTable { rows: 10_000 };

    group.bench_function("visible_rows_reversed", |b| {
        let mut engine = FilterEngine::new();
        engine.select(RowPredicate::equals(SHAPE, FunctionShape::Nonlinear));
        engine.set_reverse(true);
        b.iter(|| black_box(engine.visible_rows(&table)));
    });

    group.bench_function("toggle_reverse", |b| {
        let mut engine = FilterEngine::new();
        engine.install_related(RowPredicate::membership(ID, 0..1000));
        b.iter(|| {
            engine.toggle_reverse();
            black_box(engine.is_reversed())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_predicates, bench_engine);
criterion_main!(benches);
