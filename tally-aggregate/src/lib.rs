//! Grouped aggregation operator.
//!
//! A [`GroupedAggregator`] is configured with an optional group-by column, an
//! aggregate column and an [`AggregateOp`]. Rows are pushed in during a build
//! phase; afterwards a [`ResultSequence`] pulls one finalized row per group
//! through the [`RowSequence`](tally_types::RowSequence) protocol.
//!
//! | grouping | operator | result columns |
//! |---|---|---|
//! | none | any but `SumAndCount` | `aggregateVal` |
//! | column | any but `SumAndCount` | `groupVal, aggregateVal` |
//! | none | `SumAndCount` | `sumVal, countVal` |
//! | column | `SumAndCount` | `groupVal, sumVal, countVal` |

pub mod accumulator;
pub mod aggregator;
pub mod sequence;
pub mod shared;

pub use accumulator::{AggregateAccumulator, AggregateOp, AggregateValue, Observation};
pub use aggregator::{AggregateConfig, GroupBy, GroupKey, GroupedAggregator};
pub use sequence::ResultSequence;
pub use shared::SharedAggregator;
