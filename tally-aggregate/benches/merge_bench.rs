//! Bench merging 1_000_000 rows into grouped aggregators and draining the
//! results.

#![forbid(unsafe_code)]

use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::SmallRng};

use tally_aggregate::{AggregateOp, GroupedAggregator};
use tally_types::{Row, RowSequence, Value, ValueType};

const N: usize = 1_000_000;

fn make_rows(n: usize, groups: i64) -> Vec<Row> {
    let mut rng = SmallRng::seed_from_u64(0xC0FF_EE00_DADA_BEEF);
    (0..n)
        .map(|_| {
            Row::new(vec![
                Value::Int(rng.random_range(0..groups)),
                Value::Int(rng.random_range(-10_000..10_000)),
            ])
        })
        .collect()
}

fn make_text_rows(n: usize, groups: usize) -> Vec<Row> {
    let keys: Vec<String> = (0..groups).map(|i| format!("group-{i:05}")).collect();
    let mut rng = SmallRng::seed_from_u64(0xBADC_0FFE_EE00_1234);
    (0..n)
        .map(|_| {
            let key = &keys[rng.random_range(0..groups)];
            Row::new(vec![Value::from(key.as_str()), Value::Int(1)])
        })
        .collect()
}

fn merge_all(rows: &[Row], group_type: ValueType, op: AggregateOp) -> GroupedAggregator {
    let mut agg = GroupedAggregator::over_int(Some(0), group_type, 1, op).expect("config");
    for row in rows {
        agg.merge_tuple_into_group(row).expect("merge");
    }
    agg
}

fn bench_merge(c: &mut Criterion) {
    let int_rows = make_rows(N, 1_024);
    let text_rows = make_text_rows(N, 1_024);

    let mut group = c.benchmark_group("merge_1M");
    group.sample_size(10);

    for op in [AggregateOp::Sum, AggregateOp::Avg] {
        group.bench_function(format!("int_keys_{op}"), |b| {
            b.iter(|| black_box(merge_all(&int_rows, ValueType::Int, op)))
        });
    }
    group.bench_function("text_keys_sum", |b| {
        b.iter(|| black_box(merge_all(&text_rows, ValueType::Text, AggregateOp::Sum)))
    });
    group.finish();
}

fn bench_drain(c: &mut Criterion) {
    let rows = make_rows(N, 65_536);
    c.bench_function("drain_65k_groups_avg", |b| {
        b.iter_batched(
            || merge_all(&rows, ValueType::Int, AggregateOp::Avg),
            |agg| {
                let mut seq = agg.result_sequence();
                seq.open().expect("open");
                black_box(seq.collect_rows().expect("drain"))
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_merge, bench_drain);
criterion_main!(benches);
