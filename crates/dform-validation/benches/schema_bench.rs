//! Benchmarks for schema compilation, validation and visibility recomputation.
//!
//! Run with: cargo bench -p dform-validation

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use dform_core::{ConditionalRule, FieldDescriptor, FieldKind, FieldValue, Values, visible_fields};
use dform_validation::compile;
use std::hint::black_box;

// =============================================================================
// Test Data
// =============================================================================

/// A form of `n` fields cycling through common kinds. Every third field is
/// shown only when the previous one equals "yes".
fn form(n: usize) -> Vec<FieldDescriptor> {
    (0..n)
        .map(|i| {
            let kind = match i % 5 {
                0 => FieldKind::text(),
                1 => FieldKind::email(),
                2 => FieldKind::number_between(0.0, 100.0),
                3 => FieldKind::select(["yes", "no"]),
                _ => FieldKind::tags(),
            };
            let field = FieldDescriptor::new(format!("f{i}"), format!("Field {i}"), kind);
            if i % 3 == 2 {
                field.show_when(ConditionalRule::equals(format!("f{}", i - 1), "yes"))
            } else {
                field
            }
        })
        .collect()
}

fn values(n: usize) -> Values {
    (0..n)
        .map(|i| {
            let value = match i % 5 {
                0 => FieldValue::from("hello"),
                1 => FieldValue::from("a@b.co"),
                2 => FieldValue::from(42),
                3 => FieldValue::from("yes"),
                _ => FieldValue::from(vec!["x", "y"]),
            };
            (format!("f{i}"), value)
        })
        .collect()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema/compile");
    for n in [10, 50, 200] {
        let fields = form(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &fields, |b, fields| {
            b.iter(|| compile(black_box(fields)));
        });
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema/validate");
    for n in [10, 50, 200] {
        let fields = form(n);
        let schema = compile(&fields).expect("bench form compiles");
        let vals = values(n);
        let visible = visible_fields(&fields, &vals);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &vals, |b, vals| {
            b.iter(|| schema.validate_visible(black_box(vals), &visible));
        });
    }
    group.finish();
}

fn bench_visibility(c: &mut Criterion) {
    let mut group = c.benchmark_group("visibility/recompute");
    for n in [10, 50, 200, 1000] {
        let fields = form(n);
        let vals = values(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &vals, |b, vals| {
            b.iter(|| visible_fields(black_box(&fields), black_box(vals)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_validate, bench_visibility);
criterion_main!(benches);
