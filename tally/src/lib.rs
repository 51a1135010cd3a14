//! tally: grouped aggregation and histogram selectivity for relational engines.
//!
//! This crate re-exports the public surface of the `tally-*` crates so that
//! an engine can depend on a single crate.
//!
//! # Quick Start
//!
//! Aggregate rows by group, then pull the results:
//!
//! ```rust
//! use tally::{AggregateOp, GroupedAggregator, Row, RowSequence, Value, ValueType};
//!
//! let mut agg = GroupedAggregator::over_int(Some(0), ValueType::Text, 1, AggregateOp::Avg)?;
//! for (dept, salary) in [("eng", 120), ("ops", 80), ("eng", 101)] {
//!     agg.merge_tuple_into_group(&Row::new(vec![Value::from(dept), Value::Int(salary)]))?;
//! }
//!
//! let mut results = agg.result_sequence();
//! results.open()?;
//! assert_eq!(results.next()?, Row::new(vec![Value::from("eng"), Value::Int(110)]));
//! assert_eq!(results.next()?, Row::new(vec![Value::from("ops"), Value::Int(80)]));
//! assert!(!results.has_next()?);
//! results.close();
//! # Ok::<(), tally::Error>(())
//! ```
//!
//! Estimate predicate selectivity from a histogram:
//!
//! ```rust
//! use tally::{CompareOp, SelectivityHistogram};
//!
//! let mut hist = SelectivityHistogram::new(10, 0, 99)?;
//! hist.add_values(0..=99)?;
//! assert!((hist.estimate_selectivity(CompareOp::Lt, 50) - 0.5).abs() < 1e-9);
//! # Ok::<(), tally::Error>(())
//! ```
//!
//! # Architecture
//!
//! - **Boundary types** (`tally-types`): values, rows, schemas, comparison
//!   operators and the pull-sequence protocol.
//! - **Aggregation** (`tally-aggregate`): the grouped aggregator and its result
//!   sequence.
//! - **Statistics** (`tally-stats`): equi-width selectivity histograms.
//! - **Errors** (`tally-result`): the shared error enum.

pub use tally_aggregate::{
    AggregateConfig, AggregateOp, GroupBy, GroupKey, GroupedAggregator, ResultSequence,
    SharedAggregator,
};
pub use tally_result::{Error, Result};
pub use tally_stats::{DEFAULT_HISTOGRAM_BUCKETS, SelectivityHistogram};
pub use tally_types::{
    CompareOp, Field, Row, RowBuffer, RowSchema, RowSequence, Value, ValueType,
    rows_from_record_batch, rows_to_record_batch,
};
