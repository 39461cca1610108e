//! Permission checker benchmarks
//!
//! Trivial evaluation cost, and checks answered from a warm group cache.

use aclcheck_authz::{evaluate, PermChecker, StaticGroupLookup};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

fn make_acl(size: usize) -> Vec<String> {
    let mut acl: Vec<String> = (0..size).map(|i| format!("group-{}", i)).collect();
    acl.push("everyone@partners".to_string());
    acl
}

fn bench_trivial_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("trivial_evaluation");

    for size in [1usize, 10, 100].iter() {
        let acl = make_acl(*size);
        group.bench_with_input(BenchmarkId::new("acl_size", size), &acl, |b, acl| {
            b.iter(|| evaluate(black_box("bob@usso"), black_box(acl)));
        });
    }

    let wildcards = vec!["everyone-local@usso".to_string(), "everyone@admin@candid".to_string()];
    group.bench_function("wildcards_only", |b| {
        b.iter(|| evaluate(black_box("agent@admin@candid"), black_box(&wildcards)));
    });

    group.finish();
}

fn bench_cached_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_check");

    for users in [10usize, 1_000].iter() {
        let lookup = StaticGroupLookup::new();
        for i in 0..*users {
            lookup.add_user(format!("user-{}", i), [format!("group-{}", i % 50)]);
        }
        let checker = PermChecker::new(lookup, Duration::from_secs(3600));
        let acl = make_acl(10);

        // Warm the cache
        for i in 0..*users {
            checker.allow(&format!("user-{}", i), &acl).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("users", users), users, |b, &users| {
            let mut i = 0;
            b.iter(|| {
                let name = format!("user-{}", i % users);
                i += 1;
                black_box(checker.allow(&name, &acl).unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_trivial_evaluation, bench_cached_check);
criterion_main!(benches);
