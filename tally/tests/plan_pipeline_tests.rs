//! A statistics pass and an aggregation pass over the same scanned table, the
//! way a planner and executor would drive them.

use tally::{
    AggregateOp, CompareOp, GroupedAggregator, Row, RowBuffer, RowSchema, RowSequence,
    SelectivityHistogram, Value, ValueType,
};
use tally_test_utils::init_tracing_for_tests;

fn orders() -> RowBuffer {
    let schema = RowSchema::from_pairs([
        ("region", ValueType::Text),
        ("qty", ValueType::Int),
    ]);
    let rows = (0..200)
        .map(|i| {
            let region = ["north", "south", "east", "west"][i % 4];
            Row::new(vec![Value::from(region), Value::Int((i % 50) as i64)])
        })
        .collect();
    RowBuffer::new(schema, rows)
}

#[test]
fn statistics_then_aggregation() {
    init_tracing_for_tests();
    let mut scan = orders();

    // Statistics pass.
    let mut hist = SelectivityHistogram::new(10, 0, 49).unwrap();
    scan.open().unwrap();
    while scan.has_next().unwrap() {
        let row = scan.next().unwrap();
        hist.add_value(row.get(1).unwrap().as_int().unwrap()).unwrap();
    }
    scan.close();
    assert_eq!(hist.observation_count(), 200);
    let selectivity = hist.estimate_selectivity(CompareOp::Lt, 25);
    assert!((selectivity - 0.5).abs() < 1e-9);

    // Aggregation pass over the same source.
    let schema = scan.schema().clone();
    let mut agg = GroupedAggregator::from_schema(&schema, Some(0), 1, AggregateOp::Count).unwrap();
    agg.merge_from(&mut scan).unwrap();

    let mut results = agg.result_sequence();
    results.open().unwrap();
    let rows = results.collect_rows().unwrap();
    assert_eq!(rows.len(), 4);
    for row in &rows {
        assert_eq!(row.get(1).unwrap(), &Value::Int(50));
    }

    // A text COUNT over the region column itself, ungrouped.
    let mut regions = GroupedAggregator::from_schema(&schema, None, 0, AggregateOp::Count).unwrap();
    regions.merge_from(&mut scan).unwrap();
    let mut results = regions.result_sequence();
    results.open().unwrap();
    assert_eq!(
        results.collect_rows().unwrap(),
        vec![Row::new(vec![Value::Int(200)])]
    );
}
