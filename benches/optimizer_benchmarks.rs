//! Benchmarks for the attribute folding optimizer
//!
//! Measures performance of:
//! - A single bottom-up pass over wide trees
//! - Full fixpoint runs on getattr chains that fold over several passes
//! - Exception short-circuiting through deep lookup chains
//! - JSON deserialization of input trees

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use std::time::Duration;

use attrfold::config::OptimizerConfig;
use attrfold::ir::constant::Constant;
use attrfold::ir::exception::{ExceptionKind, RuntimeException};
use attrfold::ir::expression::{Expression, GetattrArgs};
use attrfold::ir::optimization::{ConstraintCollection, Optimizer};
use attrfold::ir::SourceRef;

fn loc(line: u32) -> SourceRef {
    SourceRef::new("bench.py", line)
}

/// `(getattr(0, "real"), getattr(1, "real"), ...)` with `width` elements.
fn wide_getattr_tuple(width: usize) -> Arc<Expression> {
    let elements = (0..width).map(|i| {
        let line = i as u32 + 1;
        Expression::builtin_getattr(
            GetattrArgs {
                object_arg: Some(Expression::constant(Constant::Int(i as i64), loc(line))),
                name: Some(Expression::string("real", loc(line))),
                default: None,
            },
            loc(line),
        )
        .unwrap()
    });
    Expression::make_tuple(elements, loc(0))
}

/// `raise(...).a.a.a...` nested `depth` times.
fn deep_raising_lookup(depth: usize) -> Arc<Expression> {
    let mut node = Expression::raise(RuntimeException::new(ExceptionKind::ValueError, "bench"), loc(0));
    for i in 0..depth {
        node = Expression::attribute_lookup(node, "a", loc(i as u32 + 1));
    }
    node
}

fn bench_single_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_pass");
    let optimizer = Optimizer::default();
    for width in [10, 100, 1000] {
        let tree = wide_getattr_tuple(width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &tree, |b, tree| {
            b.iter(|| {
                let mut collection = ConstraintCollection::new(false);
                collection.start_pass();
                black_box(optimizer.optimize_node(tree, &mut collection).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_fixpoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixpoint");
    let optimizer = Optimizer::new(OptimizerConfig { record_changes: false, ..Default::default() });
    for width in [10, 100, 1000] {
        let tree = wide_getattr_tuple(width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &tree, |b, tree| {
            b.iter(|| black_box(optimizer.optimize(tree).unwrap()))
        });
    }
    group.finish();
}

fn bench_short_circuit(c: &mut Criterion) {
    let mut group = c.benchmark_group("short_circuit");
    let optimizer = Optimizer::new(OptimizerConfig { record_changes: false, ..Default::default() });
    for depth in [10, 100, 500] {
        let tree = deep_raising_lookup(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &tree, |b, tree| {
            b.iter(|| black_box(optimizer.optimize(tree).unwrap()))
        });
    }
    group.finish();
}

fn bench_deserialize(c: &mut Criterion) {
    let json = serde_json::to_string(&wide_getattr_tuple(100)).unwrap();
    c.bench_function("deserialize_100", |b| {
        b.iter(|| black_box(serde_json::from_str::<Expression>(&json).unwrap()))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));
    targets = bench_single_pass, bench_fixpoint, bench_short_circuit, bench_deserialize
}

criterion_main!(benches);
