use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use quack_core::{Diagnostic, Position, Range, Severity, SeverityFilter, TopN, filter_diagnostics};

fn synthetic_diagnostics(count: usize) -> Vec<Diagnostic> {
    (0..count)
        .map(|i| {
            let severity = match i % 4 {
                0 => Severity::Info,
                1 => Severity::Warning,
                2 => Severity::Error,
                _ => Severity::Other("hint".to_string()),
            };
            let line = u32::try_from(i).unwrap_or(u32::MAX);
            Diagnostic::new(
                format!("diagnostic {i}"),
                severity,
                Range {
                    start: Position { line, character: 0 },
                    end: Position { line, character: 8 },
                },
            )
        })
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_diagnostics");

    for size in [10usize, 100, 1_000, 10_000] {
        let input = synthetic_diagnostics(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("all_unbounded", size), &input, |b, input| {
            b.iter(|| {
                filter_diagnostics(
                    black_box(input.clone()),
                    SeverityFilter::All,
                    TopN::unbounded(),
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("errors_top_10", size), &input, |b, input| {
            let cap = TopN::from_raw(10).unwrap();
            b.iter(|| filter_diagnostics(black_box(input.clone()), SeverityFilter::Error, cap))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_filter);
criterion_main!(benches);
