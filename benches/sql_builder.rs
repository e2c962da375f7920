use citegraph_core::QueryBuilder;
use criterion::{criterion_group, criterion_main, Criterion};

fn assemble_overview_query() -> String {
    let mut qb = QueryBuilder::new("publication", "p");
    qb.select("p.id, p.title, p.publication_year");
    qb.and_where("p.publication_year", ">=", 1950i32);
    qb.and_where("p.publisher", "=", "ACM".to_string());
    qb.order_by("p.publication_year", false);
    qb.limit(50);
    qb.build_query_string()
}

fn bench_build_query_string(c: &mut Criterion) {
    c.bench_function("sql_builder/build_query_string", |b| {
        b.iter(assemble_overview_query);
    });
}

fn bench_clone_no_limit(c: &mut Criterion) {
    let mut qb = QueryBuilder::new("publication", "p");
    qb.select("p.id");
    qb.and_where("p.publication_year", ">=", 1950i32);
    qb.limit(50).offset(100);
    c.bench_function("sql_builder/clone_no_limit", |b| {
        b.iter(|| qb.clone(true, true));
    });
}

criterion_group!(benches, bench_build_query_string, bench_clone_no_limit);
criterion_main!(benches);
