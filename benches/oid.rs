//! OID benchmarks.
//!
//! OID comparison and base-128 coding sit on the hot path of every
//! GET-NEXT and tree walk, so these track the `SmallVec<[u32; 16]>`
//! inline threshold and the codec boundary cases.

use std::sync::Arc;

use async_snmp_agent::mib::{MibTree, Scalar};
use async_snmp_agent::oid::Oid;
use async_snmp_agent::value::Value;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn enterprise_oid(len: usize) -> Oid {
    let mut arcs = vec![1u32, 3, 6, 1, 4, 1, 46410];
    for i in 0..len.saturating_sub(7) {
        arcs.push(i as u32);
    }
    Oid::new(arcs)
}

/// Base-128 encoding across the inline threshold and multi-byte arcs.
fn bench_oid_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("oid_encode");

    for len in [8, 16, 24, 32] {
        let oid = enterprise_oid(len);
        group.bench_with_input(BenchmarkId::new("to_ber", len), &oid, |b, oid| {
            b.iter(|| black_box(oid.to_ber()))
        });
    }

    // Every arc needs the continuation bit
    let wide = Oid::new((0..16).map(|i| 0x4000_0000 + i));
    group.bench_function("to_ber_wide_arcs", |b| b.iter(|| black_box(wide.to_ber())));

    group.finish();
}

fn bench_oid_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("oid_decode");

    for len in [8, 16, 24, 32] {
        let encoded = enterprise_oid(len).to_ber();
        group.bench_with_input(BenchmarkId::new("from_ber", len), &encoded, |b, data| {
            b.iter(|| black_box(Oid::from_ber(data).unwrap()))
        });
    }

    group.finish();
}

/// Lexicographic comparison, the inner loop of GET-NEXT.
fn bench_oid_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("oid_ordering");

    for len in [8, 16, 32] {
        let a = enterprise_oid(len);
        let b_oid = a.child(1);
        group.bench_with_input(
            BenchmarkId::new("cmp", len),
            &(a.clone(), b_oid),
            |b, (x, y)| b.iter(|| black_box(x.cmp(y))),
        );

        let prefix = enterprise_oid(7);
        group.bench_with_input(
            BenchmarkId::new("starts_with", len),
            &(a, prefix),
            |b, (oid, prefix)| b.iter(|| black_box(oid.starts_with(prefix))),
        );
    }

    group.finish();
}

fn bench_oid_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("oid_parse");

    for (name, s) in [
        ("short", "1.3.6.1"),
        ("enterprise", "1.3.6.1.4.1.46410.3.0"),
        ("long", "1.3.6.1.4.1.46410.1.2.3.4.5.6.7.8.9.10.11.12"),
    ] {
        group.bench_with_input(BenchmarkId::new("parse", name), s, |b, s| {
            b.iter(|| black_box(Oid::parse(s).unwrap()))
        });
    }

    group.finish();
}

/// Dispatch-side lookups: longest-prefix resolve and ordered next.
fn bench_mib_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("mib_lookup");

    let mut tree = MibTree::new();
    for i in 0..100u32 {
        let prefix = Oid::from_slice(&[1, 3, 6, 1, 4, 1, 46410, i]);
        tree.register(prefix, Arc::new(Scalar::new(Value::Integer(i as i32))))
            .unwrap();
    }

    let hit = Oid::from_slice(&[1, 3, 6, 1, 4, 1, 46410, 50, 0]);
    group.bench_function("get_100_subtrees", |b| {
        b.iter(|| black_box(tree.get(&hit).unwrap()))
    });

    let base = Oid::from_slice(&[1, 3, 6, 1, 4, 1, 46410]);
    group.bench_function("next_after_100_subtrees", |b| {
        b.iter(|| black_box(tree.next_after(&base)))
    });

    // Full walk, the GET-BULK inner loop
    group.bench_function("walk_100_subtrees", |b| {
        b.iter(|| {
            let mut cursor = base.clone();
            let mut count = 0;
            while let Some((next, value)) = tree.next_after(&cursor) {
                black_box(&value);
                cursor = next;
                count += 1;
            }
            black_box(count)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_oid_encode,
    bench_oid_decode,
    bench_oid_ordering,
    bench_oid_parse,
    bench_mib_lookup,
);

criterion_main!(benches);
