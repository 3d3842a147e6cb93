use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use xfl_core::path::{AssemblerConfig, PathAssembler};
use xfl_data::model::{Edge, PathCommand, Point};

/// A ring of `count` line fragments, shuffled so chaining has to search.
fn ring(count: usize) -> Vec<Edge> {
    let point = |i: usize| {
        let a = (i % count) as f64 / count as f64 * std::f64::consts::TAU;
        Point::new(a.cos() * 500.0, a.sin() * 500.0)
    };
    let mut edges: Vec<Edge> = (0..count)
        .map(|i| Edge {
            fill_left: Some(0),
            fill_right: Some(1),
            stroke: Some(0),
            commands: vec![PathCommand::MoveTo(point(i)), PathCommand::LineTo(point(i + 1))],
        })
        .collect();
    // Order by x so neighbours rarely arrive together.
    edges.sort_by_key(|e| match e.commands[0] {
        PathCommand::MoveTo(p) => (p.x * 1000.0) as i64,
        _ => 0,
    });
    edges
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("PathAssembler::assemble");
    let assembler = PathAssembler::new(AssemblerConfig::default());

    for &count in &[16usize, 256, 2048] {
        let edges = ring(count);
        group.bench_with_input(BenchmarkId::new("ring", count), &edges, |b, edges| {
            b.iter(|| assembler.assemble(edges))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_assemble);
criterion_main!(benches);
