//! Benchmarks for the rewrite engine
//!
//! Measures performance of:
//! - No-op traversals (the sharing fast path)
//! - Method pattern compilation and matching
//! - Field visibility rewrite over wide classes
//! - Parallel runs over many independent trees

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use std::time::Duration;

use syntax_rewrite::config::EngineConfig;
use syntax_rewrite::engine::Engine;
use syntax_rewrite::ir::builder::*;
use syntax_rewrite::ir::context::VisitContext;
use syntax_rewrite::ir::node::{BinaryOperator, Modifier, Node};
use syntax_rewrite::ir::transforms::{ChangeFieldVisibility, FindMethods};
use syntax_rewrite::ir::types::MethodType;
use syntax_rewrite::ir::visitor::TreeVisitor;
use syntax_rewrite::matching::MethodMatcher;
use syntax_rewrite::recipe::Recipe;

struct Noop;

impl TreeVisitor for Noop {}

/// A class with `members` public fields and `members` methods of `statements` statements each.
fn wide_class(members: usize, statements: usize) -> Arc<Node> {
    let mut body = Vec::with_capacity(members * 2);
    for i in 0..members {
        let init = Some(literal_int(i as i64));
        body.push(field(vec![Modifier::Public], type_ref("int"), &format!("f{}", i), init));
        let stmts = (0..statements)
            .map(|j| {
                let call = invocation(
                    Some(identifier("service")),
                    "process",
                    vec![binary(BinaryOperator::Add, identifier("x"), literal_int(j as i64))],
                    Some(MethodType::new(
                        "com.example.Service",
                        "process",
                        vec!["int".into()],
                        None,
                    )),
                );
                assignment(identifier("x"), call)
            })
            .collect();
        body.push(method_decl(vec![], None, &format!("m{}", i), vec![], Some(block(stmts)), None));
    }
    let class = class_decl(vec![], "Wide", None, body, Some("com.example.Wide"));
    compilation_unit("Wide.java", Some("com.example"), vec![], vec![class])
}

fn bench_noop_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("noop_traversal");
    for size in [10, 100, 500] {
        let tree = wide_class(size, 10);
        group.bench_with_input(BenchmarkId::new("members", size), &tree, |b, tree| {
            b.iter(|| {
                let mut ctx = VisitContext::detached("noop");
                black_box(Noop.visit(tree, &mut ctx))
            })
        });
    }
    group.finish();
}

fn bench_method_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("method_matching");
    group.bench_function("compile", |b| {
        b.iter(|| black_box(MethodMatcher::compile("com.example..* process*(int, ..)")))
    });
    let matcher = MethodMatcher::compile("com.example..* process*(int, ..)").unwrap();
    let params = vec!["int".into(), "long".into()];
    let method = MethodType::new("com.example.Service", "processAll", params, None);
    group.bench_function("match", |b| b.iter(|| black_box(matcher.matches_method(&method))));
    group.finish();
}

fn bench_recipes(c: &mut Criterion) {
    let mut group = c.benchmark_group("recipes");
    let tree = wide_class(200, 10);
    let engine = Engine::default();

    let private: Vec<Arc<dyn Recipe>> = vec![Arc::new(ChangeFieldVisibility::make_private())];
    group.bench_function("make_fields_private", |b| {
        b.iter(|| black_box(engine.run(&tree, &private)))
    });

    let find: Vec<Arc<dyn Recipe>> =
        vec![Arc::new(FindMethods::new("com.example.Service process(int)", false).unwrap())];
    group.bench_function("find_methods", |b| b.iter(|| black_box(engine.run(&tree, &find))));
    group.finish();
}

fn bench_run_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_all");
    let trees: Vec<_> = (0..64).map(|_| wide_class(20, 10)).collect();
    let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(ChangeFieldVisibility::make_private())];
    for parallel in [false, true] {
        let engine = Engine::new(EngineConfig::default().with_parallel(parallel));
        group.bench_with_input(BenchmarkId::new("parallel", parallel), &parallel, |b, _| {
            b.iter(|| black_box(engine.run_all(&trees, &recipes)))
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));
    targets =
        bench_noop_traversal,
        bench_method_matching,
        bench_recipes,
        bench_run_all
}

criterion_main!(benches);
